//! Core library for cartcache.
//!
//! A write-through cache for a food-ordering client's shopping cart. The
//! cart, the last completed order and a favorite-item pointer live in memory
//! and are mirrored to a local SQLite file so they survive process restarts.
//!
//! - [`CacheManager`]: the only entry point callers need
//! - [`CartStore`]: the SQLite-backed persistent store
//! - [`MemoryCache`]: the in-memory layer
//! - [`CatalogSource`]: the remote catalog used to re-resolve persisted item ids

pub mod cache;
pub mod catalog;
pub mod config;
pub mod models;
pub mod store;

pub use cache::{CacheManager, MemoryCache, RestoreReport, RestoreSummary};
pub use catalog::{favorite_of, CatalogClient, CatalogError, CatalogSource, StaticCatalog};
pub use config::Config;
pub use models::{CartEntry, CatalogItem, LastOrder, ModelError, OrderLine};
pub use store::{CartRow, CartStore, LastOrderRow, StoreError};
