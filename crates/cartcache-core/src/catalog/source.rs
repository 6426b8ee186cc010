use std::future::Future;

use anyhow::Result;

use crate::models::CatalogItem;

/// Where the full list of orderable items comes from.
///
/// The cart store only persists item ids, so restores need the catalog to
/// turn them back into items.
pub trait CatalogSource {
    fn fetch_catalog(&self) -> impl Future<Output = Result<Vec<CatalogItem>>> + Send;
}

/// A fixed catalog held in memory. Useful offline and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    items: Vec<CatalogItem>,
}

impl StaticCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }
}

impl CatalogSource for StaticCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>> {
        Ok(self.items.clone())
    }
}

/// The item ordered most often.
///
/// Ties go to whichever item comes first in the catalog. Returns `None` only
/// for an empty catalog.
pub fn favorite_of(catalog: &[CatalogItem]) -> Option<&CatalogItem> {
    catalog.iter().fold(None, |best: Option<&CatalogItem>, item| match best {
        Some(current) if current.times_ordered >= item.times_ordered => Some(current),
        _ => Some(item),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, times_ordered: u32) -> CatalogItem {
        let mut item = CatalogItem::new(id, id, 1.0);
        item.times_ordered = times_ordered;
        item
    }

    #[test]
    fn test_favorite_picks_most_ordered() {
        let catalog = vec![item("a", 3), item("b", 9), item("c", 4)];
        assert_eq!(favorite_of(&catalog).map(|i| i.id.as_str()), Some("b"));
    }

    #[test]
    fn test_favorite_ties_go_to_first() {
        let catalog = vec![item("a", 1), item("b", 5), item("c", 5)];
        assert_eq!(favorite_of(&catalog).map(|i| i.id.as_str()), Some("b"));

        let never_ordered = vec![item("x", 0), item("y", 0)];
        assert_eq!(favorite_of(&never_ordered).map(|i| i.id.as_str()), Some("x"));
    }

    #[test]
    fn test_favorite_of_empty_catalog() {
        assert!(favorite_of(&[]).is_none());
    }

    #[tokio::test]
    async fn test_static_catalog_returns_items() {
        let catalog = StaticCatalog::new(vec![item("a", 0), item("b", 0)]);
        let items = catalog.fetch_catalog().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(catalog.items()[1].id, "b");
    }
}
