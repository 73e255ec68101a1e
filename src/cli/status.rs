use crate::db::{get_connection, DB_FILE};
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join(DB_FILE);

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());
    println!("Selecting:  {}", if settings.select_completed_only {
        settings.completed_status.as_str()
    } else {
        "all orders"
    });

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?)
        };
        let merged: i64 = conn.query_row(
            "SELECT count(*) FROM prices WHERE price_type = 'DEPOSIT_BALANCE'",
            [],
            |r| r.get(0),
        )?;

        println!();
        println!("Brands:      {}", count("brands")?);
        println!("Categories:  {}", count("categories")?);
        println!("Items:       {}", count("items")?);
        println!("  deposit/balance: {merged}");
        println!("Imports:     {}", count("imports")?);
    } else {
        println!();
        println!("Database not found. Run `wardrobe init` to set up.");
    }

    Ok(())
}
