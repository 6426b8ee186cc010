//! SQLite-backed persistent store for the cart cache.
//!
//! Holds two tables:
//! - `Cart`: one row per cart entry, keyed by the entry id
//! - `LastOrder`: the lines of the most recently completed order
//!
//! The favorite item is deliberately not stored here.

pub mod cart_store;
pub mod error;

pub use cart_store::{CartRow, CartStore, LastOrderRow};
pub use error::StoreError;
