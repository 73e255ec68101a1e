//! Narrow read/write interfaces over the catalog store, plus the SQLite
//! implementation used by the CLI.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, WardrobeError};
use crate::models::{Brand, Category, CategoryGroup, NewItem, NewPrice};

pub trait CatalogReader {
    fn find_brand_by_name(&self, name: &str) -> Result<Option<Brand>>;
    fn find_category_by_name(&self, name: &str) -> Result<Option<Category>>;
}

/// Creation fails with [`WardrobeError::Conflict`] when the name is taken.
pub trait CatalogWriter {
    fn create_brand(&self, name: &str) -> Result<i64>;
    fn create_category(&self, name: &str, group: CategoryGroup) -> Result<i64>;
}

pub trait ItemWriter {
    fn create_item(&self, item: &NewItem) -> Result<i64>;
    fn create_price(&self, price: &NewPrice) -> Result<i64>;
    /// Remove an item whose price record could not be written.
    fn discard_item(&self, item_id: i64) -> Result<()>;
}

pub struct SqliteCatalog<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCatalog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn map_insert_error(err: rusqlite::Error, kind: &'static str, name: &str) -> WardrobeError {
    if is_unique_violation(&err) {
        WardrobeError::Conflict {
            kind,
            name: name.to_string(),
        }
    } else {
        WardrobeError::Db(err)
    }
}

fn category_from_row(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    let group: String = row.get(2)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        group: CategoryGroup::parse(&group).unwrap_or(CategoryGroup::Garment),
        is_preset: row.get(3)?,
    })
}

impl CatalogReader for SqliteCatalog<'_> {
    fn find_brand_by_name(&self, name: &str) -> Result<Option<Brand>> {
        let brand = self
            .conn
            .query_row(
                "SELECT id, name FROM brands WHERE name = ?1",
                [name],
                |row| {
                    Ok(Brand {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(brand)
    }

    fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let category = self
            .conn
            .query_row(
                "SELECT id, name, category_group, is_preset FROM categories WHERE name = ?1",
                [name],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }
}

impl CatalogWriter for SqliteCatalog<'_> {
    fn create_brand(&self, name: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO brands (name) VALUES (?1)", [name])
            .map_err(|e| map_insert_error(e, "Brand", name))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn create_category(&self, name: &str, group: CategoryGroup) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO categories (name, category_group) VALUES (?1, ?2)",
                rusqlite::params![name, group.as_str()],
            )
            .map_err(|e| map_insert_error(e, "Category", name))?;
        Ok(self.conn.last_insert_rowid())
    }
}

impl ItemWriter for SqliteCatalog<'_> {
    fn create_item(&self, item: &NewItem) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO items (name, brand_id, category_id, color, size, status, description, source_url, order_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                item.name,
                item.brand_id,
                item.category_id,
                item.color,
                item.size,
                item.status.as_str(),
                item.description,
                item.source_url,
                item.order_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn create_price(&self, price: &NewPrice) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO prices (item_id, price_type, total_price, deposit, balance, purchase_date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                price.item_id,
                price.price_type.as_str(),
                price.total_price,
                price.deposit,
                price.balance,
                price.purchase_date,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn discard_item(&self, item_id: i64) -> Result<()> {
        self.conn.execute("DELETE FROM items WHERE id = ?1", [item_id])?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Listing helpers for the CLI
// ---------------------------------------------------------------------------

pub fn list_brands(conn: &Connection) -> Result<Vec<Brand>> {
    let mut stmt = conn.prepare("SELECT id, name FROM brands ORDER BY name")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Brand {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category_group, is_preset FROM categories ORDER BY category_group, name",
    )?;
    let rows = stmt
        .query_map([], category_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct ItemListing {
    pub id: i64,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub price_type: Option<String>,
    pub total_price: Option<f64>,
    pub deposit: Option<f64>,
    pub balance: Option<f64>,
    pub purchase_date: Option<String>,
}

pub fn list_items(conn: &Connection) -> Result<Vec<ItemListing>> {
    let mut stmt = conn.prepare(
        "SELECT i.id, i.name, b.name, c.name, i.color, i.size, \
                p.price_type, p.total_price, p.deposit, p.balance, p.purchase_date \
         FROM items i \
         JOIN brands b ON i.brand_id = b.id \
         JOIN categories c ON i.category_id = c.id \
         LEFT JOIN prices p ON p.item_id = i.id \
         ORDER BY i.id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ItemListing {
                id: row.get(0)?,
                name: row.get(1)?,
                brand: row.get(2)?,
                category: row.get(3)?,
                color: row.get(4)?,
                size: row.get(5)?,
                price_type: row.get(6)?,
                total_price: row.get(7)?,
                deposit: row.get(8)?,
                balance: row.get(9)?,
                purchase_date: row.get(10)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::models::{ItemStatus, PriceType};

    #[test]
    fn test_find_brand_is_case_sensitive() {
        let (_dir, conn) = test_db();
        let catalog = SqliteCatalog::new(&conn);
        catalog.create_brand("Innocent World").unwrap();
        assert!(catalog.find_brand_by_name("Innocent World").unwrap().is_some());
        assert!(catalog.find_brand_by_name("innocent world").unwrap().is_none());
    }

    #[test]
    fn test_list_brands_sorted_by_name() {
        let (_dir, conn) = test_db();
        let catalog = SqliteCatalog::new(&conn);
        let baby = catalog.create_brand("BABY").unwrap();
        catalog.create_brand("Angelic Pretty").unwrap();
        let brands = list_brands(&conn).unwrap();
        let names: Vec<&str> = brands.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Angelic Pretty", "BABY"]);
        assert_eq!(catalog.find_brand_by_name("BABY").unwrap().unwrap().id, baby);
    }

    #[test]
    fn test_duplicate_brand_is_conflict() {
        let (_dir, conn) = test_db();
        let catalog = SqliteCatalog::new(&conn);
        catalog.create_brand("BABY").unwrap();
        let err = catalog.create_brand("BABY").unwrap_err();
        assert!(matches!(err, WardrobeError::Conflict { kind: "Brand", .. }));
    }

    #[test]
    fn test_duplicate_category_is_conflict() {
        let (_dir, conn) = test_db();
        let catalog = SqliteCatalog::new(&conn);
        let err = catalog.create_category("JSK", CategoryGroup::Garment).unwrap_err();
        assert!(matches!(err, WardrobeError::Conflict { kind: "Category", .. }));
    }

    #[test]
    fn test_preset_category_lookup() {
        let (_dir, conn) = test_db();
        let catalog = SqliteCatalog::new(&conn);
        let kc = catalog.find_category_by_name("KC").unwrap().unwrap();
        assert_eq!(kc.group, CategoryGroup::Accessory);
        assert!(kc.is_preset);
    }

    #[test]
    fn test_item_with_price_is_listed() {
        let (_dir, conn) = test_db();
        let catalog = SqliteCatalog::new(&conn);
        let brand_id = catalog.create_brand("Metamorphose").unwrap();
        let category_id = catalog.find_category_by_name("OP").unwrap().unwrap().id;
        let item_id = catalog
            .create_item(&NewItem {
                name: "Cherry Berry OP".to_string(),
                brand_id,
                category_id,
                color: Some("红色".to_string()),
                size: None,
                status: ItemStatus::Owned,
                description: String::new(),
                source_url: None,
                order_id: Some("1001".to_string()),
            })
            .unwrap();
        catalog
            .create_price(&NewPrice {
                item_id,
                price_type: PriceType::DepositBalance,
                total_price: 800.0,
                deposit: Some(200.0),
                balance: Some(600.0),
                purchase_date: Some("2024-03-01".to_string()),
            })
            .unwrap();

        let items = list_items(&conn).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].brand, "Metamorphose");
        assert_eq!(items[0].category, "OP");
        assert_eq!(items[0].price_type.as_deref(), Some("DEPOSIT_BALANCE"));
        assert_eq!(items[0].deposit, Some(200.0));
    }

    #[test]
    fn test_item_with_unknown_brand_fails() {
        let (_dir, conn) = test_db();
        let catalog = SqliteCatalog::new(&conn);
        let result = catalog.create_item(&NewItem {
            name: "Orphan".to_string(),
            brand_id: 9999,
            category_id: 1,
            color: None,
            size: None,
            status: ItemStatus::Owned,
            description: String::new(),
            source_url: None,
            order_id: None,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_discard_item() {
        let (_dir, conn) = test_db();
        let catalog = SqliteCatalog::new(&conn);
        let brand_id = catalog.create_brand("AatP").unwrap();
        let item_id = catalog
            .create_item(&NewItem {
                name: "Bonnet".to_string(),
                brand_id,
                category_id: 1,
                color: None,
                size: None,
                status: ItemStatus::Owned,
                description: String::new(),
                source_url: None,
                order_id: None,
            })
            .unwrap();
        catalog.discard_item(item_id).unwrap();
        let count: i64 = conn.query_row("SELECT count(*) FROM items", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 0);
    }
}
