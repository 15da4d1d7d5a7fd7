//! A small items read API backed by Google Cloud Spanner, with a
//! mock-data fallback chain and an out-of-band provisioning binary.
//!
//! The HTTP service never surfaces a data-source failure to callers: every
//! branch that cannot produce live rows degrades to a fixed sample set. The
//! `provision` binary ensures the Spanner objects exist and seeds the same
//! sample rows, or switches the service to local mock mode when the data
//! service is unreachable.

pub mod api_doc;
pub mod config;
pub mod error;
pub mod fallback;
pub mod handlers;
pub mod models;
pub mod provision;
pub mod routes;
pub mod spanner;
pub mod state;
