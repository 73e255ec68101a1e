use comfy_table::{Cell, Table};

use crate::catalog::list_items;
use crate::cli::open_db;
use crate::error::Result;
use crate::fmt::money;

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let items = list_items(&conn)?;
    if items.is_empty() {
        println!("No items yet. Import an order export with `wardrobe import FILE`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Name", "Brand", "Category", "Color", "Size", "Price", "Deposit", "Balance", "Date",
    ]);
    let mut total = 0.0;
    for item in &items {
        total += item.total_price.unwrap_or(0.0);
        table.add_row(vec![
            Cell::new(item.id),
            Cell::new(&item.name),
            Cell::new(&item.brand),
            Cell::new(&item.category),
            Cell::new(item.color.as_deref().unwrap_or("")),
            Cell::new(item.size.as_deref().unwrap_or("")),
            Cell::new(item.total_price.map(money).unwrap_or_default()),
            Cell::new(item.deposit.map(money).unwrap_or_default()),
            Cell::new(item.balance.map(money).unwrap_or_default()),
            Cell::new(item.purchase_date.as_deref().unwrap_or("")),
        ]);
    }
    println!("Items\n{table}");
    println!("{} items, {} total", items.len(), money(total));
    Ok(())
}
