use comfy_table::{Cell, Table};

use crate::catalog::{list_categories, CatalogWriter, SqliteCatalog};
use crate::cli::open_db;
use crate::error::{Result, WardrobeError};
use crate::models::CategoryGroup;

pub fn add(name: &str, group: &str) -> Result<()> {
    let group = CategoryGroup::parse(group).ok_or_else(|| {
        WardrobeError::Other(format!("Unknown category group: {group} (use clothing or accessory)"))
    })?;
    let conn = open_db()?;
    SqliteCatalog::new(&conn).create_category(name.trim(), group)?;
    println!("Added category: {} ({})", name.trim(), group.as_str());
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let categories = list_categories(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Group", "Preset"]);
    for cat in categories {
        table.add_row(vec![
            Cell::new(cat.id),
            Cell::new(cat.name),
            Cell::new(cat.group.as_str()),
            Cell::new(if cat.is_preset { "yes" } else { "" }),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}
