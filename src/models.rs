use serde::{Deserialize, Serialize};

/// The sole record type served by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Item {
    /// Unique id, also the table's primary key
    pub id: String,
    pub name: String,
    pub description: String,
}

/// The fixed sample set. The request handler serves these rows whenever the
/// data source is unavailable, and the provisioning utility seeds the same
/// rows into Spanner.
pub fn sample_items() -> Vec<Item> {
    (1..=3)
        .map(|n| Item {
            id: n.to_string(),
            name: format!("Sample Item {n}"),
            description: format!("This is a sample item {n}"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_items_are_fixed() {
        let items = sample_items();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id, "1");
        assert_eq!(items[0].name, "Sample Item 1");
        assert_eq!(items[0].description, "This is a sample item 1");
        assert_eq!(items[2].id, "3");

        // Two calls produce the same rows
        assert_eq!(items, sample_items());
    }

    #[test]
    fn test_item_serializes_with_expected_fields() {
        let item = Item {
            id: "42".to_string(),
            name: "widget".to_string(),
            description: "a widget".to_string(),
        };

        let value = serde_json::to_value(&item).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 3);
        assert_eq!(object["id"], "42");
        assert_eq!(object["name"], "widget");
        assert_eq!(object["description"], "a widget");
    }

    #[test]
    fn test_item_deserializes() {
        let item: Item = serde_json::from_str(
            r#"{"id": "1", "name": "Sample Item 1", "description": "This is a sample item 1"}"#,
        )
        .unwrap();

        assert_eq!(item, sample_items()[0]);
    }
}
