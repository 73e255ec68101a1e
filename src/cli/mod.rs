pub mod backup;
pub mod brands;
pub mod categories;
pub mod import;
pub mod init;
pub mod items;
pub mod load;
pub mod preview;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::{Result, WardrobeError};
use crate::settings::get_db_path;

/// Open the configured database, pointing the user at `init` when it is missing.
pub(crate) fn open_db() -> Result<Connection> {
    let db_path: PathBuf = get_db_path();
    if !db_path.exists() {
        return Err(WardrobeError::Settings(format!(
            "No database found at {}\nRun `wardrobe init` to set up.",
            db_path.display()
        )));
    }
    get_connection(&db_path)
}

#[derive(Parser)]
#[command(name = "wardrobe", about = "Wardrobe catalog with Taobao order-history import.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for wardrobe data (default: ~/Documents/wardrobe)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Switch to an existing wardrobe data directory.
    Load {
        /// Path to data directory containing wardrobe.db
        path: String,
    },
    /// Parse a Taobao order export and show what would be imported.
    Preview {
        /// Path to the exported XLSX/XLS file
        file: String,
    },
    /// Import a Taobao order export into the catalog.
    Import {
        /// Path to the exported XLSX/XLS file
        file: String,
        /// Accept the proposed brands and categories without prompting
        #[arg(long, short = 'y')]
        yes: bool,
        /// Do not create this brand (repeatable)
        #[arg(long = "skip-brand")]
        skip_brand: Vec<String>,
        /// Do not create this category (repeatable)
        #[arg(long = "skip-category")]
        skip_category: Vec<String>,
        /// Import every order, not only completed ones
        #[arg(long)]
        all: bool,
        /// Category for items whose type could not be read from the style spec
        #[arg(long = "default-category")]
        default_category: Option<String>,
    },
    /// Manage brands.
    Brands {
        #[command(subcommand)]
        command: BrandsCommands,
    },
    /// Manage categories.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Browse catalog items.
    Items {
        #[command(subcommand)]
        command: ItemsCommands,
    },
    /// Show current database and summary statistics.
    Status,
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/wardrobe-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum BrandsCommands {
    /// Add a brand.
    Add {
        /// Brand name, usually the Taobao shop name
        name: String,
    },
    /// List all brands.
    List,
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// Add a category.
    Add {
        /// Category name, e.g. 'JSK'
        name: String,
        /// Group: clothing or accessory
        #[arg(long, default_value = "clothing")]
        group: String,
    },
    /// List all categories.
    List,
}

#[derive(Subcommand)]
pub enum ItemsCommands {
    /// List items with their price records.
    List,
}
