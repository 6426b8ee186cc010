use std::collections::HashMap;

use crate::models::{CartEntry, CatalogItem, LastOrder};

/// In-memory side of the cart cache.
///
/// Cart entries are looked up by id and enumerated in insertion order. There
/// is no eviction: entries leave only through `remove` or `clear`.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, CartEntry>,
    order: Vec<String>,
    favorite: Option<CatalogItem>,
    last_order: Option<LastOrder>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Cart =====

    /// Insert an entry. Replacing an existing id keeps its original position.
    pub fn put(&mut self, entry: CartEntry) {
        if !self.entries.contains_key(&entry.id) {
            self.order.push(entry.id.clone());
        }
        self.entries.insert(entry.id.clone(), entry);
    }

    pub fn get(&self, id: &str) -> Option<&CartEntry> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut CartEntry> {
        self.entries.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<CartEntry> {
        let removed = self.entries.remove(id)?;
        self.order.retain(|key| key != id);
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// All entries in insertion order
    pub fn all(&self) -> Vec<CartEntry> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .cloned()
            .collect()
    }

    pub fn find_by_item(&self, item_id: &str) -> Option<&CartEntry> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .find(|entry| entry.item.id == item_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ===== Favorite =====

    pub fn set_favorite(&mut self, item: Option<CatalogItem>) {
        self.favorite = item;
    }

    pub fn favorite(&self) -> Option<&CatalogItem> {
        self.favorite.as_ref()
    }

    pub fn clear_favorite(&mut self) {
        self.favorite = None;
    }

    // ===== Last Order =====

    pub fn set_last_order(&mut self, order: LastOrder) {
        self.last_order = Some(order);
    }

    pub fn last_order(&self) -> Option<&LastOrder> {
        self.last_order.as_ref()
    }

    pub fn clear_last_order(&mut self) {
        self.last_order = None;
    }
}
