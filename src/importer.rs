use std::path::Path;

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::catalog::SqliteCatalog;
use crate::committer;
use crate::error::Result;
use crate::merger::{plan_items, MergePlan};
use crate::models::{ImportResult, ParsedItem, ParsedOrder};
use crate::order_parser;
use crate::references::{detect_missing, MissingReferences};
use crate::settings::Settings;

const INTENT_DEPOSIT_MARKER: &str = "意向金";

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Only orders with this status are selected. `None` selects every order.
    pub completed_status: Option<String>,
    pub skip_intent_deposits: bool,
}

impl ImportOptions {
    pub fn from_settings(settings: &Settings, all: bool) -> Self {
        if all {
            return Self::default();
        }
        Self {
            completed_status: settings
                .select_completed_only
                .then(|| settings.completed_status.clone()),
            skip_intent_deposits: settings.skip_intent_deposits,
        }
    }
}

pub fn select_items(orders: &[ParsedOrder], opts: &ImportOptions) -> Vec<ParsedItem> {
    orders
        .iter()
        .filter(|order| match &opts.completed_status {
            Some(status) => order.status == *status,
            None => true,
        })
        .flat_map(|order| order.items.iter())
        .filter(|item| !(opts.skip_intent_deposits && item.style_spec.contains(INTENT_DEPOSIT_MARKER)))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Duplicate-file guard
// ---------------------------------------------------------------------------

pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

pub fn is_duplicate_file(conn: &Connection, checksum: &str) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
    Ok(stmt.exists([checksum])?)
}

fn record_import(conn: &Connection, prepared: &PreparedImport, result: &ImportResult) -> Result<()> {
    conn.execute(
        "INSERT INTO imports (filename, imported, merged, skipped, checksum) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            prepared.filename,
            result.imported as i64,
            result.merged as i64,
            result.skipped as i64,
            prepared.checksum,
        ],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A parsed file waiting for the user to review its reference checklist.
#[derive(Debug)]
pub struct PreparedImport {
    pub filename: String,
    pub checksum: String,
    pub duplicate_file: bool,
    pub orders: Vec<ParsedOrder>,
    pub selected: Vec<ParsedItem>,
    pub missing: MissingReferences,
}

pub fn prepare_orders(
    conn: &Connection,
    orders: Vec<ParsedOrder>,
    filename: &str,
    checksum: String,
    opts: &ImportOptions,
) -> Result<PreparedImport> {
    let selected = select_items(&orders, opts);
    tracing::info!(
        orders = orders.len(),
        selected = selected.len(),
        "Selected items for import"
    );
    let missing = detect_missing(&SqliteCatalog::new(conn), &selected)?;
    Ok(PreparedImport {
        filename: filename.to_string(),
        checksum,
        duplicate_file: false,
        orders,
        selected,
        missing,
    })
}

/// Read, checksum and parse `file_path`. Unreadable input is the only fatal
/// error; a file imported before comes back with `duplicate_file` set and
/// nothing parsed.
pub fn prepare_import(conn: &Connection, file_path: &Path, opts: &ImportOptions) -> Result<PreparedImport> {
    let data = std::fs::read(file_path)?;
    let checksum = compute_checksum(&data);
    let filename = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if is_duplicate_file(conn, &checksum)? {
        tracing::info!(file = %filename, "File already imported");
        return Ok(PreparedImport {
            filename,
            checksum,
            duplicate_file: true,
            orders: Vec::new(),
            selected: Vec::new(),
            missing: MissingReferences::default(),
        });
    }

    let orders = order_parser::parse_bytes(&data)?;
    prepare_orders(conn, orders, &filename, checksum, opts)
}

pub fn plan(prepared: &PreparedImport) -> MergePlan {
    plan_items(prepared.selected.clone())
}

/// Merge, commit and record the import. `prepared.missing` carries the
/// user's checklist decisions.
pub fn execute_import(
    conn: &Connection,
    prepared: &PreparedImport,
    default_category: Option<&str>,
) -> Result<ImportResult> {
    if prepared.duplicate_file {
        return Ok(ImportResult::default());
    }
    let plan = plan(prepared);
    let result = committer::commit(
        &SqliteCatalog::new(conn),
        &prepared.missing,
        &plan,
        default_category,
    );
    record_import(conn, prepared, &result)?;
    Ok(result)
}
