//! Data models for the cart cache.
//!
//! - `CatalogItem`: an orderable item as served by the remote catalog
//! - `CartEntry`: one line in the shopping cart (item snapshot + quantity)
//! - `OrderLine`, `LastOrder`: the most recently completed order

pub mod cart;
pub mod catalog_item;
pub mod order;

pub use cart::{CartEntry, ModelError};
pub use catalog_item::CatalogItem;
pub use order::{LastOrder, OrderLine};
