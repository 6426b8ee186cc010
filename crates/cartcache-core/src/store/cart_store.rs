use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};
use tracing::{debug, warn};

use super::StoreError;
use crate::models::{CartEntry, LastOrder};

/// Bumped whenever the table layout changes
const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS Cart (
        id TEXT PRIMARY KEY NOT NULL,
        itemId TEXT NOT NULL,
        itemName TEXT NOT NULL,
        itemCost REAL NOT NULL DEFAULT 0,
        itemDetails TEXT NOT NULL DEFAULT '',
        itemImage TEXT NOT NULL DEFAULT '',
        itemRatings REAL NOT NULL DEFAULT 0,
        isAdded INTEGER NOT NULL DEFAULT 0,
        timesOrdered INTEGER NOT NULL DEFAULT 0,
        quantity INTEGER NOT NULL,
        itemIngredients TEXT NOT NULL DEFAULT '[]',
        itemStarProducts INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS LastOrder (
        id INTEGER PRIMARY KEY NOT NULL,
        itemId TEXT NOT NULL,
        itemName TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        placedAt TEXT NOT NULL
    );
";

const CART_COLUMNS: &str = "id, itemId, itemName, itemCost, itemDetails, itemImage, itemRatings, \
     isAdded, timesOrdered, quantity, itemIngredients, itemStarProducts";

/// A `Cart` row exactly as persisted.
///
/// Only `item_id` is used to re-resolve the item on restore; the rest is the
/// snapshot taken when the entry was written.
#[derive(Debug, Clone, PartialEq)]
pub struct CartRow {
    pub id: String,
    pub item_id: String,
    pub item_name: String,
    pub item_cost: f64,
    pub item_details: String,
    pub item_image: String,
    pub item_ratings: f64,
    pub is_added: bool,
    pub times_ordered: u32,
    pub quantity: u32,
    pub item_ingredients: Vec<String>,
    pub is_promoted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LastOrderRow {
    pub id: i64,
    pub item_id: String,
    pub item_name: String,
    pub quantity: u32,
    pub placed_at: String,
}

/// The on-device cart database.
///
/// `rusqlite::Connection` is not `Sync`, so the handle sits behind a mutex and
/// every operation holds it for the duration of its statements.
pub struct CartStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl CartStore {
    /// Open (or create) the database file at `path`.
    ///
    /// Failing here is fatal for the cache: there is no cache without a
    /// backing file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        debug!(mode = %mode, "Journal mode set");

        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        store.init_schema()?;
        debug!(path = %path.display(), "Opened cart store");
        Ok(store)
    }

    /// Open a throwaway in-memory database with the same schema
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let store = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Backing file, or `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute_batch(SCHEMA)?;

        let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version < SCHEMA_VERSION {
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        Ok(())
    }

    // ===== Cart =====

    /// Insert or replace a cart row by id.
    ///
    /// Replacing keeps the row's original position so restores come back in
    /// the order entries were first added.
    pub fn upsert_cart(&self, entry: &CartEntry) -> Result<(), StoreError> {
        let ingredients = serde_json::to_string(&entry.item.ingredients)?;
        let item = &entry.item;
        let conn = self.conn.lock();
        logged(
            "upsert_cart",
            conn.execute(
                "INSERT INTO Cart (id, itemId, itemName, itemCost, itemDetails, itemImage,
                    itemRatings, isAdded, timesOrdered, quantity, itemIngredients, itemStarProducts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(id) DO UPDATE SET
                    itemId = excluded.itemId,
                    itemName = excluded.itemName,
                    itemCost = excluded.itemCost,
                    itemDetails = excluded.itemDetails,
                    itemImage = excluded.itemImage,
                    itemRatings = excluded.itemRatings,
                    isAdded = excluded.isAdded,
                    timesOrdered = excluded.timesOrdered,
                    quantity = excluded.quantity,
                    itemIngredients = excluded.itemIngredients,
                    itemStarProducts = excluded.itemStarProducts",
                params![
                    entry.id,
                    item.id,
                    item.name,
                    item.cost,
                    item.details,
                    item.image,
                    item.ratings,
                    item.is_added,
                    item.times_ordered,
                    entry.quantity,
                    ingredients,
                    item.is_promoted,
                ],
            ),
        )?;
        Ok(())
    }

    /// Remove one cart row. Returns the number of rows removed (0 if absent).
    pub fn delete_cart(&self, id: &str) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        logged(
            "delete_cart",
            conn.execute("DELETE FROM Cart WHERE id = ?1", params![id]),
        )
    }

    pub fn clear_cart(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let removed = logged("clear_cart", conn.execute("DELETE FROM Cart", []))?;
        debug!(removed, "Cleared cart rows");
        Ok(())
    }

    /// Set the quantity of one row. Returns the number of rows changed (0 if absent).
    pub fn update_cart_quantity(&self, id: &str, quantity: u32) -> Result<usize, StoreError> {
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity(quantity));
        }
        let conn = self.conn.lock();
        logged(
            "update_cart_quantity",
            conn.execute(
                "UPDATE Cart SET quantity = ?1 WHERE id = ?2",
                params![quantity, id],
            ),
        )
    }

    /// Every cart row, in insertion order
    pub fn load_cart(&self) -> Result<Vec<CartRow>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = logged(
            "load_cart",
            conn.prepare(&format!("SELECT {} FROM Cart ORDER BY rowid", CART_COLUMNS)),
        )?;
        let raw = logged(
            "load_cart",
            stmt.query_map([], raw_cart_row)
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>()),
        )?;

        Ok(raw.into_iter().filter_map(RawCartRow::decode).collect())
    }

    pub fn count_cart_rows(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = logged(
            "count_cart_rows",
            conn.query_row("SELECT COUNT(*) FROM Cart", [], |row| row.get(0)),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // ===== Last Order =====

    /// Replace the stored last order with `order`.
    ///
    /// Line ids are the line positions, so loading by id returns the lines in
    /// the order they were given.
    pub fn replace_last_order(&self, order: &LastOrder) -> Result<(), StoreError> {
        let placed_at = order.placed_at.to_rfc3339();
        let mut conn = self.conn.lock();
        let tx = logged("replace_last_order", conn.transaction())?;
        logged("replace_last_order", tx.execute("DELETE FROM LastOrder", []))?;
        for (position, line) in order.lines.iter().enumerate() {
            logged(
                "replace_last_order",
                tx.execute(
                    "INSERT INTO LastOrder (id, itemId, itemName, quantity, placedAt)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![position as i64, line.item_id, line.item_name, line.quantity, placed_at],
                ),
            )?;
        }
        logged("replace_last_order", tx.commit())?;
        debug!(lines = order.lines.len(), "Stored last order");
        Ok(())
    }

    pub fn clear_last_order(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        logged("clear_last_order", conn.execute("DELETE FROM LastOrder", []))?;
        Ok(())
    }

    pub fn load_last_order(&self) -> Result<Vec<LastOrderRow>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = logged(
            "load_last_order",
            conn.prepare(
                "SELECT id, itemId, itemName, quantity, placedAt FROM LastOrder ORDER BY id",
            ),
        )?;
        let rows = logged(
            "load_last_order",
            stmt.query_map([], |row| {
                Ok((
                    LastOrderRow {
                        id: row.get(0)?,
                        item_id: row.get(1)?,
                        item_name: row.get(2)?,
                        quantity: 0,
                        placed_at: row.get(4)?,
                    },
                    row.get::<_, i64>(3)?,
                ))
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>()),
        )?;

        Ok(rows
            .into_iter()
            .filter_map(|(mut row, quantity)| match u32::try_from(quantity) {
                Ok(quantity) => {
                    row.quantity = quantity;
                    Some(row)
                }
                Err(_) => {
                    warn!(line = row.id, quantity, "Out-of-range order line quantity, skipping row");
                    None
                }
            })
            .collect())
    }
}

/// Log a failed statement and convert it into a `StoreError`
fn logged<T>(op: &'static str, result: rusqlite::Result<T>) -> Result<T, StoreError> {
    result.map_err(|e| {
        warn!(op, error = %e, "Cart store statement failed");
        StoreError::from(e)
    })
}

/// Cart row before the integer and ingredients columns are checked
struct RawCartRow {
    row: CartRow,
    times_ordered: i64,
    quantity: i64,
    ingredients: String,
}

impl RawCartRow {
    /// `None` when the row cannot become a cart line at all
    fn decode(self) -> Option<CartRow> {
        let RawCartRow {
            mut row,
            times_ordered,
            quantity,
            ingredients,
        } = self;

        row.quantity = match u32::try_from(quantity) {
            Ok(quantity) => quantity,
            Err(_) => {
                warn!(id = %row.id, quantity, "Out-of-range cart quantity, skipping row");
                return None;
            }
        };
        row.times_ordered = u32::try_from(times_ordered).unwrap_or_else(|_| {
            warn!(id = %row.id, times_ordered, "Out-of-range order count, using 0");
            0
        });
        row.item_ingredients = match serde_json::from_str(&ingredients) {
            Ok(list) => list,
            Err(e) => {
                warn!(id = %row.id, error = %e, "Unreadable ingredients column, using empty list");
                Vec::new()
            }
        };
        Some(row)
    }
}

fn raw_cart_row(row: &Row<'_>) -> rusqlite::Result<RawCartRow> {
    Ok(RawCartRow {
        row: CartRow {
            id: row.get(0)?,
            item_id: row.get(1)?,
            item_name: row.get(2)?,
            item_cost: row.get(3)?,
            item_details: row.get(4)?,
            item_image: row.get(5)?,
            item_ratings: row.get(6)?,
            is_added: row.get(7)?,
            times_ordered: 0,
            quantity: 0,
            item_ingredients: Vec::new(),
            is_promoted: row.get(11)?,
        },
        times_ordered: row.get(8)?,
        quantity: row.get(9)?,
        ingredients: row.get(10)?,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogItem, OrderLine};

    fn entry(id: &str, item_id: &str, name: &str, quantity: u32) -> CartEntry {
        let mut item = CatalogItem::new(item_id, name, 5.0);
        item.ingredients = vec!["beef".to_string(), "bun".to_string()];
        item.is_promoted = true;
        CartEntry::with_id(id, item.with_added(true), quantity).unwrap()
    }

    #[test]
    fn test_upsert_and_load_cart() {
        let store = CartStore::open_in_memory().unwrap();
        store.upsert_cart(&entry("c1", "i1", "Burger", 2)).unwrap();

        let rows = store.load_cart().unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.id, "c1");
        assert_eq!(row.item_id, "i1");
        assert_eq!(row.item_name, "Burger");
        assert_eq!(row.quantity, 2);
        assert_eq!(row.item_ingredients, vec!["beef", "bun"]);
        assert!(row.is_added);
        assert!(row.is_promoted);
    }

    #[test]
    fn test_upsert_is_idempotent_and_keeps_position() {
        let store = CartStore::open_in_memory().unwrap();
        store.upsert_cart(&entry("c1", "i1", "Burger", 1)).unwrap();
        store.upsert_cart(&entry("c2", "i2", "Fries", 1)).unwrap();
        store.upsert_cart(&entry("c1", "i1", "Burger", 4)).unwrap();
        store.upsert_cart(&entry("c1", "i1", "Burger", 4)).unwrap();

        let rows = store.load_cart().unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert_eq!(rows[0].quantity, 4);
        assert_eq!(store.count_cart_rows().unwrap(), 2);
    }

    #[test]
    fn test_delete_cart() {
        let store = CartStore::open_in_memory().unwrap();
        store.upsert_cart(&entry("c1", "i1", "Burger", 1)).unwrap();

        assert_eq!(store.delete_cart("missing").unwrap(), 0);
        assert_eq!(store.delete_cart("c1").unwrap(), 1);
        assert_eq!(store.count_cart_rows().unwrap(), 0);
    }

    #[test]
    fn test_clear_cart() {
        let store = CartStore::open_in_memory().unwrap();
        store.upsert_cart(&entry("c1", "i1", "Burger", 1)).unwrap();
        store.upsert_cart(&entry("c2", "i2", "Fries", 1)).unwrap();

        store.clear_cart().unwrap();
        assert_eq!(store.count_cart_rows().unwrap(), 0);
        assert!(store.load_cart().unwrap().is_empty());
    }

    #[test]
    fn test_update_cart_quantity() {
        let store = CartStore::open_in_memory().unwrap();
        store.upsert_cart(&entry("c1", "i1", "Burger", 1)).unwrap();

        assert_eq!(store.update_cart_quantity("c1", 7).unwrap(), 1);
        assert_eq!(store.update_cart_quantity("missing", 7).unwrap(), 0);
        assert_eq!(store.load_cart().unwrap()[0].quantity, 7);

        assert!(matches!(
            store.update_cart_quantity("c1", 0),
            Err(StoreError::InvalidQuantity(0))
        ));
        assert_eq!(store.load_cart().unwrap()[0].quantity, 7);
    }

    #[test]
    fn test_replace_last_order() {
        let store = CartStore::open_in_memory().unwrap();
        let first = LastOrder::new(vec![
            OrderLine::new("i1", "Burger", 2),
            OrderLine::new("i2", "Fries", 1),
            OrderLine::new("i3", "Shake", 1),
        ]);
        store.replace_last_order(&first).unwrap();
        assert_eq!(store.load_last_order().unwrap().len(), 3);

        let second = LastOrder::new(vec![OrderLine::new("i9", "Salad", 3)]);
        store.replace_last_order(&second).unwrap();

        let rows = store.load_last_order().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_id, "i9");
        assert_eq!(rows[0].quantity, 3);
        assert_eq!(rows[0].placed_at, second.placed_at.to_rfc3339());
    }

    #[test]
    fn test_last_order_keeps_line_order() {
        let store = CartStore::open_in_memory().unwrap();
        let order = LastOrder::new(vec![
            OrderLine::new("z", "Zucchini", 1),
            OrderLine::new("a", "Apple", 1),
            OrderLine::new("m", "Mango", 1),
        ]);
        store.replace_last_order(&order).unwrap();

        let ids: Vec<String> = store
            .load_last_order()
            .unwrap()
            .into_iter()
            .map(|r| r.item_id)
            .collect();
        assert_eq!(ids, vec!["z", "a", "m"]);

        store.clear_last_order().unwrap();
        assert!(store.load_last_order().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_ingredients_load_as_empty() {
        let store = CartStore::open_in_memory().unwrap();
        store.upsert_cart(&entry("c1", "i1", "Burger", 1)).unwrap();
        store
            .conn
            .lock()
            .execute("UPDATE Cart SET itemIngredients = 'not json'", [])
            .unwrap();

        let rows = store.load_cart().unwrap();
        assert!(rows[0].item_ingredients.is_empty());
    }

    #[test]
    fn test_negative_integers_skip_or_clamp_single_row() {
        let store = CartStore::open_in_memory().unwrap();
        store.upsert_cart(&entry("c1", "i1", "Burger", 1)).unwrap();
        store.upsert_cart(&entry("c2", "i2", "Fries", 2)).unwrap();
        store.upsert_cart(&entry("c3", "i3", "Shake", 3)).unwrap();
        {
            let conn = store.conn.lock();
            conn.execute("UPDATE Cart SET quantity = -3 WHERE id = 'c1'", [])
                .unwrap();
            conn.execute("UPDATE Cart SET timesOrdered = -1 WHERE id = 'c2'", [])
                .unwrap();
        }

        let rows = store.load_cart().unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c3"]);
        assert_eq!(rows[0].times_ordered, 0);
        assert_eq!(rows[0].quantity, 2);
    }

    #[test]
    fn test_negative_order_quantity_skips_line() {
        let store = CartStore::open_in_memory().unwrap();
        let order = LastOrder::new(vec![
            OrderLine::new("i1", "Burger", 2),
            OrderLine::new("i2", "Fries", 1),
        ]);
        store.replace_last_order(&order).unwrap();
        store
            .conn
            .lock()
            .execute("UPDATE LastOrder SET quantity = -1 WHERE itemId = 'i1'", [])
            .unwrap();

        let rows = store.load_last_order().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_id, "i2");
    }

    #[test]
    fn test_reopen_file_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cart.sqlite");

        {
            let store = CartStore::open(&path).unwrap();
            assert_eq!(store.path(), Some(path.as_path()));
            store.upsert_cart(&entry("c1", "i1", "Burger", 2)).unwrap();
        }

        let reopened = CartStore::open(&path).unwrap();
        assert_eq!(reopened.count_cart_rows().unwrap(), 1);
        assert_eq!(reopened.load_cart().unwrap()[0].id, "c1");
    }

    #[test]
    fn test_open_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = CartStore::open(blocker.join("cart.sqlite"));
        assert!(matches!(result, Err(StoreError::CreateDir { .. })));
    }
}
