use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::money;
use crate::merger::{detect_payment_role, plan_items};
use crate::order_parser::parse_file;

pub fn run(file: &str) -> Result<()> {
    let orders = parse_file(Path::new(file))?;
    if orders.is_empty() {
        println!("{}", "No orders found in this file.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Order", "Date", "Status", "Shop", "Item", "Type", "Size", "Color", "Qty", "Price", "Role",
    ]);
    for order in &orders {
        for item in &order.items {
            let role = detect_payment_role(&item.name).map(|r| r.label()).unwrap_or("");
            table.add_row(vec![
                Cell::new(&order.order_id),
                Cell::new(&order.order_time),
                Cell::new(&order.status),
                Cell::new(&order.shop_name),
                Cell::new(&item.name),
                Cell::new(item.parsed_type.as_deref().unwrap_or("")),
                Cell::new(item.parsed_size.as_deref().unwrap_or("")),
                Cell::new(item.parsed_color.as_deref().unwrap_or("")),
                Cell::new(item.quantity),
                Cell::new(money(item.price)),
                Cell::new(role),
            ]);
        }
    }
    println!("{table}");

    let items: Vec<_> = orders.iter().flat_map(|o| o.items.iter().cloned()).collect();
    let item_count = items.len();
    let plan = plan_items(items);
    let paid: f64 = orders.iter().map(|o| o.total_paid).sum();
    let shipping: f64 = orders.iter().map(|o| o.shipping).sum();
    println!(
        "{} orders, {} items, {} deposit/balance pairs",
        orders.len(),
        item_count,
        plan.merged_count()
    );
    println!("Paid {} (shipping {})", money(paid), money(shipping));
    Ok(())
}
