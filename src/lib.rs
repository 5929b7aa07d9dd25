//! rTriplogger library root.
//! Exposes the CLI parser, the high-level run() function and the internal
//! modules (segmentation, geofence matching, suggestions, mileage).

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg),
        Commands::Db { .. } => cli::commands::db::handle(&cli.command, cfg),
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg),
        Commands::Import { .. } => cli::commands::import::handle(&cli.command, cfg),
        Commands::Segment { .. } => cli::commands::segment::handle(&cli.command, cfg),
        Commands::List { .. } => cli::commands::list::handle(&cli.command, cfg),
        Commands::Location { .. } => cli::commands::location::handle(&cli.command, cfg),
        Commands::Trip { .. } => cli::commands::trip::handle(&cli.command, cfg),
        Commands::Suggest { .. } => cli::commands::suggest::handle(&cli.command, cfg),
        Commands::Rate { .. } => cli::commands::rate::handle(&cli.command, cfg),
        Commands::Vehicle { .. } => cli::commands::vehicle::handle(&cli.command, cfg),
        Commands::Mileage { .. } => cli::commands::mileage::handle(&cli.command, cfg),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // Load the configuration once; --db overrides the stored database path.
    let mut cfg = Config::load()?;
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    dispatch(&cli, &cfg)
}
