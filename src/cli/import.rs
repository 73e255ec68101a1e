use std::io::IsTerminal;
use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};
use dialoguer::MultiSelect;

use crate::catalog::{CatalogReader, SqliteCatalog};
use crate::cli::open_db;
use crate::error::{Result, WardrobeError};
use crate::importer::{execute_import, prepare_import, ImportOptions};
use crate::models::ReferenceKind;
use crate::references::MissingReferences;
use crate::settings::load_settings;

pub struct ImportArgs {
    pub file: String,
    pub yes: bool,
    pub skip_brand: Vec<String>,
    pub skip_category: Vec<String>,
    pub all: bool,
    pub default_category: Option<String>,
}

fn apply_skips(missing: &mut MissingReferences, kind: ReferenceKind, names: &[String]) {
    for name in names {
        if !missing.set_checked(kind, name, false) {
            println!(
                "{}",
                format!("{} '{name}' is not in the list of new entries; ignoring.", kind.label()).yellow()
            );
        }
    }
}

fn review_checklist(missing: &mut MissingReferences) -> Result<()> {
    let labels: Vec<String> = missing
        .iter()
        .map(|m| match m.group {
            Some(group) => format!("{}: {} ({})", m.kind.label(), m.name, group.as_str()),
            None => format!("{}: {}", m.kind.label(), m.name),
        })
        .collect();
    let defaults: Vec<bool> = missing.iter().map(|m| m.checked).collect();

    let chosen = MultiSelect::new()
        .with_prompt("Create these brands and categories (space toggles, enter confirms)")
        .items(&labels)
        .defaults(&defaults)
        .interact()
        .map_err(|e| WardrobeError::Other(format!("Prompt failed: {e}")))?;

    for (idx, item) in missing.iter_mut().enumerate() {
        item.checked = chosen.contains(&idx);
    }
    Ok(())
}

pub fn run(args: ImportArgs) -> Result<()> {
    let conn = open_db()?;

    if let Some(name) = args.default_category.as_deref() {
        if SqliteCatalog::new(&conn).find_category_by_name(name)?.is_none() {
            return Err(WardrobeError::UnknownCategory(name.to_string()));
        }
    }

    let opts = ImportOptions::from_settings(&load_settings(), args.all);
    let mut prepared = prepare_import(&conn, &PathBuf::from(&args.file), &opts)?;

    if prepared.duplicate_file {
        println!("This file has already been imported (duplicate checksum).");
        return Ok(());
    }
    if prepared.selected.is_empty() {
        println!(
            "{}",
            format!("{} orders parsed, nothing selected for import.", prepared.orders.len()).yellow()
        );
        return Ok(());
    }
    println!(
        "{} orders parsed, {} items selected",
        prepared.orders.len(),
        prepared.selected.len()
    );

    apply_skips(&mut prepared.missing, ReferenceKind::Brand, &args.skip_brand);
    apply_skips(&mut prepared.missing, ReferenceKind::Category, &args.skip_category);

    if !prepared.missing.is_empty() {
        println!("{} new brands/categories found", prepared.missing.len());
        if !args.yes && std::io::stdin().is_terminal() {
            review_checklist(&mut prepared.missing)?;
        }
    }

    let result = execute_import(&conn, &prepared, args.default_category.as_deref())?;

    let mut table = Table::new();
    table.set_header(vec!["Imported", "Merged", "Skipped"]);
    table.add_row(vec![
        Cell::new(result.imported),
        Cell::new(result.merged),
        Cell::new(result.skipped),
    ]);
    println!("{table}");
    if result.skipped > 0 {
        println!(
            "{}",
            "Skipped rows are listed in the warnings above.".yellow()
        );
    } else {
        println!("{}", "Import complete.".green());
    }
    Ok(())
}
