use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::MemoryCache;
use crate::catalog::{favorite_of, CatalogSource};
use crate::config::Config;
use crate::models::{CartEntry, CatalogItem, LastOrder, OrderLine};
use crate::store::{CartStore, StoreError};

/// Outcome of rebuilding one memory slot from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    /// Rows turned back into cache entries
    pub restored: usize,
    /// Rows skipped because their item is no longer in the catalog
    pub dropped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub cart: RestoreSummary,
    pub last_order: RestoreSummary,
}

/// Write-through cache over the cart store.
///
/// Every mutation is applied to memory first and then persisted. A failed
/// store write is returned to the caller but memory is not rolled back, so the
/// two layers can differ until the next restore. Reads only ever look at
/// memory.
///
/// The memory write lock is held across the matching store write, so
/// concurrent callers see both layers change in the same order.
pub struct CacheManager {
    memory: RwLock<MemoryCache>,
    store: CartStore,
}

impl CacheManager {
    pub fn new(store: CartStore) -> Self {
        Self {
            memory: RwLock::new(MemoryCache::new()),
            store,
        }
    }

    /// Open the cart database at `path` with an empty memory cache
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self::new(CartStore::open(path)?))
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let path = config.database_path()?;
        debug!(path = %path.display(), "Opening cart cache");
        Ok(Self::open(path)?)
    }

    pub fn store(&self) -> &CartStore {
        &self.store
    }

    // ===== Cart =====

    /// Write an entry to memory and the store. Zero quantities touch neither.
    pub fn add_cart_item(&self, entry: CartEntry) -> Result<(), StoreError> {
        if entry.quantity == 0 {
            return Err(StoreError::InvalidQuantity(entry.quantity));
        }

        let mut memory = self.memory.write();
        memory.put(entry.clone());
        self.store.upsert_cart(&entry)?;
        debug!(id = %entry.id, item_id = %entry.item.id, quantity = entry.quantity, "Added cart item");
        Ok(())
    }

    pub fn get_cart_item(&self, id: &str) -> Option<CartEntry> {
        self.memory.read().get(id).cloned()
    }

    /// The entry holding `item_id`, if that item is already in the cart
    pub fn find_by_item(&self, item_id: &str) -> Option<CartEntry> {
        self.memory.read().find_by_item(item_id).cloned()
    }

    /// Remove an entry from both layers. Returns whether either layer had it.
    pub fn remove_cart_item(&self, id: &str) -> Result<bool, StoreError> {
        let mut memory = self.memory.write();
        let in_memory = memory.remove(id).is_some();
        let in_store = self.store.delete_cart(id)? > 0;
        debug!(id, in_memory, in_store, "Removed cart item");
        Ok(in_memory || in_store)
    }

    pub fn clear_cart(&self) -> Result<(), StoreError> {
        let mut memory = self.memory.write();
        memory.clear();
        self.store.clear_cart()
    }

    /// All cart entries, in the order they were added
    pub fn get_all_cart_items(&self) -> Vec<CartEntry> {
        self.memory.read().all()
    }

    pub fn cart_total(&self) -> f64 {
        self.memory.read().all().iter().map(CartEntry::line_total).sum()
    }

    /// Set the quantity of an entry in both memory and the store.
    ///
    /// Returns whether the entry existed in either layer.
    pub fn update_cart_item_quantity(&self, id: &str, quantity: u32) -> Result<bool, StoreError> {
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity(quantity));
        }

        let mut memory = self.memory.write();
        let in_memory = match memory.get_mut(id) {
            Some(entry) => {
                entry.quantity = quantity;
                true
            }
            None => false,
        };
        let in_store = self.store.update_cart_quantity(id, quantity)? > 0;
        if in_memory != in_store {
            warn!(id, in_memory, in_store, "Quantity update found the entry in only one layer");
        }
        Ok(in_memory || in_store)
    }

    pub fn count_cart_rows(&self) -> Result<usize, StoreError> {
        self.store.count_cart_rows()
    }

    // ===== Last Order =====

    /// Replace the last order with `lines`. An empty list means "no last order".
    ///
    /// A line with quantity 0 rejects the whole order before either layer
    /// changes.
    pub fn add_order(&self, lines: Vec<OrderLine>) -> Result<LastOrder, StoreError> {
        if let Some(line) = lines.iter().find(|line| line.quantity == 0) {
            return Err(StoreError::InvalidQuantity(line.quantity));
        }

        let order = LastOrder::new(lines);
        let mut memory = self.memory.write();
        if order.is_empty() {
            memory.clear_last_order();
        } else {
            memory.set_last_order(order.clone());
        }
        self.store.replace_last_order(&order)?;
        Ok(order)
    }

    pub fn get_last_order(&self) -> Option<LastOrder> {
        self.memory.read().last_order().cloned()
    }

    /// Finalize the cart: snapshot it as the last order, then empty it.
    ///
    /// An empty cart changes nothing and returns `None`. If the order cannot
    /// be stored, the cart and the previous last order are left as they were.
    pub fn checkout(&self) -> Result<Option<LastOrder>, StoreError> {
        let mut memory = self.memory.write();
        let lines: Vec<OrderLine> = memory.all().iter().map(OrderLine::from).collect();
        if lines.is_empty() {
            return Ok(None);
        }

        // Memory records the order only once the store has it
        let order = LastOrder::new(lines);
        self.store.replace_last_order(&order)?;
        memory.set_last_order(order.clone());

        memory.clear();
        self.store.clear_cart()?;
        info!(lines = order.lines.len(), quantity = order.total_quantity(), "Checked out cart");
        Ok(Some(order))
    }

    // ===== Favorite =====

    pub fn get_favorite_item(&self) -> Option<CatalogItem> {
        self.memory.read().favorite().cloned()
    }

    pub fn set_favorite_item(&self, item: Option<CatalogItem>) {
        self.memory.write().set_favorite(item);
    }

    /// Recompute the favorite from `catalog` and cache it
    pub fn refresh_favorite(&self, catalog: &[CatalogItem]) -> Option<CatalogItem> {
        let favorite = favorite_of(catalog).cloned();
        self.memory.write().set_favorite(favorite.clone());
        favorite
    }

    // ===== Restore =====

    /// Rebuild the memory cart from the store.
    ///
    /// Each row's item id is looked up in `catalog`; rows whose item is gone
    /// are skipped with a warning. Restored entries keep their persisted id.
    pub fn restore_cart_from_store(
        &self,
        catalog: &[CatalogItem],
    ) -> Result<RestoreSummary, StoreError> {
        let mut memory = self.memory.write();
        memory.clear();

        let rows = self.store.load_cart()?;
        let by_id = index_catalog(catalog);
        let mut summary = RestoreSummary::default();

        for row in rows {
            let Some(item) = by_id.get(row.item_id.as_str()) else {
                warn!(id = %row.id, item_id = %row.item_id, "Cart row item not in catalog, skipping");
                summary.dropped += 1;
                continue;
            };
            match CartEntry::with_id(row.id.clone(), item.with_added(true), row.quantity) {
                Ok(entry) => {
                    memory.put(entry);
                    summary.restored += 1;
                }
                Err(e) => {
                    warn!(id = %row.id, error = %e, "Unusable cart row, skipping");
                    summary.dropped += 1;
                }
            }
        }

        info!(restored = summary.restored, dropped = summary.dropped, "Restored cart from store");
        Ok(summary)
    }

    /// Rebuild the memory last order from the store.
    ///
    /// Lines are resolved like cart rows and take their name from the
    /// catalog. If nothing resolves the slot is left empty, the same as
    /// never having ordered.
    pub fn restore_last_order_from_store(
        &self,
        catalog: &[CatalogItem],
    ) -> Result<RestoreSummary, StoreError> {
        let mut memory = self.memory.write();
        let rows = self.store.load_last_order()?;
        let by_id = index_catalog(catalog);
        let mut summary = RestoreSummary::default();

        let placed_at = rows
            .first()
            .map(|row| parse_placed_at(&row.placed_at))
            .unwrap_or_else(Utc::now);

        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            match by_id.get(row.item_id.as_str()) {
                Some(item) => {
                    lines.push(OrderLine::new(item.id.clone(), item.name.clone(), row.quantity));
                    summary.restored += 1;
                }
                None => {
                    warn!(line = row.id, item_id = %row.item_id, "Last order item not in catalog, skipping");
                    summary.dropped += 1;
                }
            }
        }

        if lines.is_empty() {
            memory.clear_last_order();
        } else {
            memory.set_last_order(LastOrder { lines, placed_at });
        }

        info!(restored = summary.restored, dropped = summary.dropped, "Restored last order from store");
        Ok(summary)
    }

    /// Fetch the catalog once, then restore the cart and last order and
    /// recompute the favorite.
    pub async fn restore_all<S: CatalogSource>(&self, source: &S) -> anyhow::Result<RestoreReport> {
        let catalog = source.fetch_catalog().await?;
        let report = RestoreReport {
            cart: self.restore_cart_from_store(&catalog)?,
            last_order: self.restore_last_order_from_store(&catalog)?,
        };
        self.refresh_favorite(&catalog);
        Ok(report)
    }

    /// Empty the cart, last order and favorite in every layer
    pub fn reset(&self) -> Result<(), StoreError> {
        let mut memory = self.memory.write();
        memory.clear();
        memory.clear_last_order();
        memory.clear_favorite();
        self.store.clear_cart()?;
        self.store.clear_last_order()
    }
}

/// Catalog items by id. The first occurrence of a duplicated id wins.
fn index_catalog(catalog: &[CatalogItem]) -> HashMap<&str, &CatalogItem> {
    let mut by_id = HashMap::with_capacity(catalog.len());
    for item in catalog {
        by_id.entry(item.id.as_str()).or_insert(item);
    }
    by_id
}

fn parse_placed_at(raw: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            warn!(raw, error = %e, "Unreadable order timestamp, using now");
            Utc::now()
        }
    }
}
