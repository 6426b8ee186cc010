use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::CatalogItem;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Cart quantity must be at least 1")]
    ZeroQuantity,
}

/// One line in the shopping cart.
///
/// `id` is the cache key and the store's primary key. `item` is the catalog
/// item as it was when added, not a live reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    pub id: String,
    pub item: CatalogItem,
    pub quantity: u32,
}

impl CartEntry {
    /// Create an entry with a freshly generated id
    pub fn new(item: CatalogItem, quantity: u32) -> Result<Self, ModelError> {
        Self::with_id(Uuid::new_v4().to_string(), item, quantity)
    }

    /// Create an entry with a known id, e.g. one read back from the store
    pub fn with_id(
        id: impl Into<String>,
        item: CatalogItem,
        quantity: u32,
    ) -> Result<Self, ModelError> {
        if quantity == 0 {
            return Err(ModelError::ZeroQuantity);
        }
        Ok(Self {
            id: id.into(),
            item,
            quantity,
        })
    }

    pub fn item_id(&self) -> &str {
        &self.item.id
    }

    pub fn line_total(&self) -> f64 {
        self.item.cost * f64::from(self.quantity)
    }
}
