use serde::{Deserialize, Serialize};

/// An orderable item from the remote catalog.
///
/// The catalog owns these; the cart only ever holds value snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub ratings: f64,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(rename = "starProduct", default)]
    pub is_promoted: bool,
    #[serde(rename = "timesOrdered", default)]
    pub times_ordered: u32,
    #[serde(rename = "isAdded", default)]
    pub is_added: bool,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, cost: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cost,
            details: String::new(),
            image: String::new(),
            ratings: 0.0,
            ingredients: Vec::new(),
            is_promoted: false,
            times_ordered: 0,
            is_added: false,
        }
    }

    /// Copy of this item with the in-cart flag set
    pub fn with_added(&self, added: bool) -> Self {
        Self {
            is_added: added,
            ..self.clone()
        }
    }

    /// Count one more completed order of this item
    pub fn record_order(&mut self) {
        self.times_ordered = self.times_ordered.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog_item_json() {
        let json = r#"{"id": "i1", "name": "Burger", "cost": 5.0, "details": "Beef patty",
            "image": "burger.png", "ratings": 4.5, "ingredients": ["beef", "bun"],
            "starProduct": true, "timesOrdered": 12}"#;

        let item: CatalogItem = serde_json::from_str(json).expect("Failed to parse item JSON");
        assert_eq!(item.id, "i1");
        assert_eq!(item.name, "Burger");
        assert_eq!(item.ingredients, vec!["beef", "bun"]);
        assert!(item.is_promoted);
        assert_eq!(item.times_ordered, 12);
        // Not sent by the backend
        assert!(!item.is_added);
    }

    #[test]
    fn test_parse_minimal_item_defaults() {
        let item: CatalogItem = serde_json::from_str(r#"{"id": "i2", "name": "Fries"}"#)
            .expect("Failed to parse minimal item JSON");
        assert_eq!(item.cost, 0.0);
        assert!(item.ingredients.is_empty());
        assert_eq!(item.times_ordered, 0);
    }

    #[test]
    fn test_with_added_leaves_original() {
        let item = CatalogItem::new("i1", "Burger", 5.0);
        let added = item.with_added(true);
        assert!(added.is_added);
        assert!(!item.is_added);
        assert_eq!(added.name, item.name);
    }

    #[test]
    fn test_record_order_saturates() {
        let mut item = CatalogItem::new("i1", "Burger", 5.0);
        item.record_order();
        assert_eq!(item.times_ordered, 1);

        item.times_ordered = u32::MAX;
        item.record_order();
        assert_eq!(item.times_ordered, u32::MAX);
    }
}
