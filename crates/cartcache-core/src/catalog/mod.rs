//! Remote catalog collaborator.
//!
//! The catalog supplies the canonical list of orderable items. The cart cache
//! uses it to re-resolve persisted item ids on restore and to pick the
//! favorite item.

pub mod client;
pub mod error;
pub mod source;

pub use client::CatalogClient;
pub use error::CatalogError;
pub use source::{favorite_of, CatalogSource, StaticCatalog};
