mod catalog;
mod cli;
mod committer;
mod db;
mod error;
mod fmt;
mod importer;
mod merger;
mod models;
mod order_parser;
mod references;
mod settings;
mod style_spec;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{BrandsCommands, CategoriesCommands, Cli, Commands, ItemsCommands};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Load { path } => cli::load::run(&path),
        Commands::Preview { file } => cli::preview::run(&file),
        Commands::Import {
            file,
            yes,
            skip_brand,
            skip_category,
            all,
            default_category,
        } => cli::import::run(cli::import::ImportArgs {
            file,
            yes,
            skip_brand,
            skip_category,
            all,
            default_category,
        }),
        Commands::Brands { command } => match command {
            BrandsCommands::Add { name } => cli::brands::add(&name),
            BrandsCommands::List => cli::brands::list(),
        },
        Commands::Categories { command } => match command {
            CategoriesCommands::Add { name, group } => cli::categories::add(&name, &group),
            CategoriesCommands::List => cli::categories::list(),
        },
        Commands::Items { command } => match command {
            ItemsCommands::List => cli::items::list(),
        },
        Commands::Status => cli::status::run(),
        Commands::Backup { output } => cli::backup::run(output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
