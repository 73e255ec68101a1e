//! Taobao order export (.xlsx) → grouped orders.
//!
//! The export has 11 columns:
//! order id | order time | status | shop | item name | product URL |
//! style spec | quantity | item price | total paid | shipping
//!
//! An order with several items spans several rows; only the first row carries
//! the order-level cells, later rows leave the order id blank.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, ExcelDateTime, ExcelDateTimeType, Range, Reader};

use crate::error::{Result, WardrobeError};
use crate::models::{ParsedItem, ParsedOrder, RawOrderRow};
use crate::style_spec::parse_style_spec;

pub const COLUMN_COUNT: usize = 11;

// ---------------------------------------------------------------------------
// Cell and value helpers
// ---------------------------------------------------------------------------

/// Days between the 1900 and 1904 Excel epochs.
const EXCEL_1904_OFFSET_DAYS: f64 = 1462.0;

/// Serial day number → `YYYY-MM-DD[ HH:MM:SS]`. Serials chrono cannot
/// represent come back as the plain number.
pub fn excel_serial_to_datetime(serial: f64) -> String {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let converted = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .filter(|_| serial.is_finite())
        .and_then(|base| {
            let millis = (serial * 86_400_000.0).round() as i64;
            chrono::TimeDelta::try_milliseconds(millis).and_then(|offset| base.checked_add_signed(offset))
        });
    match converted {
        Some(dt) if dt.time() == chrono::NaiveTime::MIN => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format_number(serial),
    }
}

/// calamine keeps the workbook's date system private; rebuild the cell with
/// the 1904 flag set and compare.
fn uses_1904_epoch(dt: &ExcelDateTime) -> bool {
    [ExcelDateTimeType::DateTime, ExcelDateTimeType::TimeDelta]
        .into_iter()
        .any(|kind| *dt == ExcelDateTime::new(dt.as_f64(), kind, true))
}

fn date_cell_serial(dt: &ExcelDateTime) -> f64 {
    if uses_1904_epoch(dt) {
        dt.as_f64() + EXCEL_1904_OFFSET_DAYS
    } else {
        dt.as_f64()
    }
}

/// Whole numbers render without a trailing ".0" so ids and quantities stay intact.
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

/// Normalize any cell to trimmed text. The only place that looks at cell types.
pub fn read_cell(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) | Some(Data::Error(_)) => String::new(),
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Float(f)) => format_number(*f),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Bool(b)) => b.to_string(),
        Some(Data::DateTime(dt)) => excel_serial_to_datetime(date_cell_serial(dt)),
        Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => s.trim().to_string(),
    }
}

pub fn parse_price(raw: &str) -> f64 {
    let s = raw
        .replace(['\u{ffe5}', '\u{a5}', ','], "");
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

pub fn parse_quantity(raw: &str) -> u32 {
    raw.trim().parse().unwrap_or(1)
}

/// Order time → `YYYY-MM-DD`. Accepts `YYYY-MM-DD[ HH:MM[:SS]]` with `-` or `/`.
pub fn normalize_order_date(raw: &str) -> Option<String> {
    let raw = raw.trim().replace('/', "-");
    if raw.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(&raw, fmt) {
            return Some(dt.format("%Y-%m-%d").to_string());
        }
    }
    chrono::NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

pub fn row_from_cells(cells: &[Data]) -> RawOrderRow {
    let cell = |i: usize| read_cell(cells.get(i));
    RawOrderRow {
        order_id: cell(0),
        order_time: cell(1),
        order_status: cell(2),
        shop_name: cell(3),
        item_name: cell(4),
        product_url: cell(5),
        style_spec: cell(6),
        quantity: cell(7),
        item_price: cell(8),
        total_paid: cell(9),
        shipping: cell(10),
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Group data rows (header already removed) into orders, in first-seen order.
pub fn group_rows<I>(rows: I) -> Vec<ParsedOrder>
where
    I: IntoIterator<Item = RawOrderRow>,
{
    let mut orders: Vec<ParsedOrder> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut current_order_id = String::new();

    for row in rows {
        if !row.order_id.trim().is_empty() {
            current_order_id = row.order_id.trim().to_string();
        }
        if current_order_id.is_empty() {
            continue;
        }

        let slot = *index.entry(current_order_id.clone()).or_insert_with(|| {
            orders.push(ParsedOrder {
                order_id: current_order_id.clone(),
                order_time: row.order_time.clone(),
                status: row.order_status.clone(),
                shop_name: row.shop_name.clone(),
                total_paid: parse_price(&row.total_paid),
                shipping: parse_price(&row.shipping),
                items: Vec::new(),
            });
            orders.len() - 1
        });

        if row.item_name.trim().is_empty() {
            continue;
        }

        let order = &mut orders[slot];
        let style = parse_style_spec(&row.style_spec);
        order.items.push(ParsedItem {
            name: row.item_name.trim().to_string(),
            product_url: row.product_url,
            quantity: parse_quantity(&row.quantity),
            price: parse_price(&row.item_price),
            style_spec: row.style_spec,
            parsed_type: style.item_type,
            parsed_size: style.size,
            parsed_color: style.color,
            order_id: order.order_id.clone(),
            order_time: order.order_time.clone(),
            shop_name: order.shop_name.clone(),
        });
    }

    for order in &orders {
        tracing::debug!(
            order_id = %order.order_id,
            shop = %order.shop_name,
            items = order.items.len(),
            "Parsed order"
        );
    }
    orders
}

pub fn parse_range(range: &Range<Data>) -> Vec<ParsedOrder> {
    group_rows(range.rows().skip(1).map(row_from_cells))
}

/// Parse the first sheet of an in-memory workbook. Any format calamine
/// detects (xlsx, xls, xlsb, ods) is accepted.
pub fn parse_bytes(bytes: &[u8]) -> Result<Vec<ParsedOrder>> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| WardrobeError::Spreadsheet("workbook has no sheets".to_string()))??;
    if range.width() < COLUMN_COUNT && !range.is_empty() {
        tracing::warn!(
            columns = range.width(),
            expected = COLUMN_COUNT,
            "Sheet has fewer columns than a Taobao export; missing cells read as blank"
        );
    }
    let orders = parse_range(&range);
    tracing::info!(
        orders = orders.len(),
        items = orders.iter().map(|o| o.items.len()).sum::<usize>(),
        "Parsed order export"
    );
    Ok(orders)
}

pub fn parse_file(file_path: &Path) -> Result<Vec<ParsedOrder>> {
    let bytes = std::fs::read(file_path)?;
    parse_bytes(&bytes)
}
