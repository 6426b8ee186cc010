//! Local cart cache.
//!
//! `CacheManager` keeps the shopping cart, the last completed order and the
//! favorite item in memory and writes cart and order changes through to the
//! SQLite store. On a cold start it rebuilds memory from the store, resolving
//! persisted item ids against the catalog.
//!
//! The favorite item lives in memory only and does not survive a restart.

pub mod manager;
pub mod memory;

pub use manager::{CacheManager, RestoreReport, RestoreSummary};
pub use memory::MemoryCache;
