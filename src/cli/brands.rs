use comfy_table::{Cell, Table};

use crate::catalog::{list_brands, CatalogWriter, SqliteCatalog};
use crate::cli::open_db;
use crate::error::Result;

pub fn add(name: &str) -> Result<()> {
    let conn = open_db()?;
    SqliteCatalog::new(&conn).create_brand(name.trim())?;
    println!("Added brand: {}", name.trim());
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let brands = list_brands(&conn)?;
    if brands.is_empty() {
        println!("No brands yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name"]);
    for brand in brands {
        table.add_row(vec![Cell::new(brand.id), Cell::new(brand.name)]);
    }
    println!("Brands\n{table}");
    Ok(())
}
