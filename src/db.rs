use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const DB_FILE: &str = "wardrobe.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS brands (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    category_group TEXT NOT NULL DEFAULT 'garment',
    is_preset INTEGER DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    brand_id INTEGER NOT NULL,
    category_id INTEGER NOT NULL,
    color TEXT,
    size TEXT,
    status TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    source_url TEXT,
    order_id TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (brand_id) REFERENCES brands(id) ON DELETE RESTRICT,
    FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE RESTRICT
);

CREATE TABLE IF NOT EXISTS prices (
    id INTEGER PRIMARY KEY,
    item_id INTEGER NOT NULL,
    price_type TEXT NOT NULL,
    total_price REAL NOT NULL,
    deposit REAL,
    balance REAL,
    purchase_date TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    imported INTEGER,
    merged INTEGER,
    skipped INTEGER,
    checksum TEXT
);

CREATE INDEX IF NOT EXISTS idx_items_brand ON items(brand_id);
CREATE INDEX IF NOT EXISTS idx_items_category ON items(category_id);
CREATE INDEX IF NOT EXISTS idx_prices_item ON prices(item_id);
";

// (name, category_group)
const PRESET_CATEGORIES: &[(&str, &str)] = &[
    ("JSK", "garment"),
    ("OP", "garment"),
    ("SK", "garment"),
    ("KC", "accessory"),
    ("斗篷", "accessory"),
    ("披肩", "accessory"),
    ("发带", "accessory"),
    ("Bonnet", "accessory"),
    ("其他头饰", "accessory"),
    ("袜子", "accessory"),
    ("手套", "accessory"),
    ("其他配饰", "accessory"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    for (name, group) in PRESET_CATEGORIES {
        conn.execute(
            "INSERT OR IGNORE INTO categories (name, category_group, is_preset) VALUES (?1, ?2, 1)",
            rusqlite::params![name, group],
        )?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = get_connection(&dir.path().join("test.db")).unwrap();
    init_db(&conn).unwrap();
    (dir, conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["brands", "categories", "items", "prices", "imports"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
        let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |r| r.get(0)).unwrap();
        assert_eq!(count, PRESET_CATEGORIES.len() as i64);
    }

    #[test]
    fn test_preset_groups() {
        let (_dir, conn) = test_db();
        let garments: i64 = conn.query_row(
            "SELECT count(*) FROM categories WHERE category_group = 'garment'", [], |r| r.get(0),
        ).unwrap();
        let accessories: i64 = conn.query_row(
            "SELECT count(*) FROM categories WHERE category_group = 'accessory'", [], |r| r.get(0),
        ).unwrap();
        assert_eq!(garments, 3);
        assert_eq!(accessories, 9);
    }

    #[test]
    fn test_brand_names_are_unique() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO brands (name) VALUES ('Angelic Pretty')", []).unwrap();
        let dup = conn.execute("INSERT INTO brands (name) VALUES ('Angelic Pretty')", []);
        assert!(dup.is_err());
    }
}
