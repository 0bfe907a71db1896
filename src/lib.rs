pub mod classify;
pub mod cli;
pub mod columns;
pub mod config;
pub mod data;
pub mod filter;
pub mod ingest;
pub mod insights;
pub mod io_utils;
pub mod matrix;
pub mod normalize;
pub mod preview;
pub mod prompt;
pub mod report;
pub mod schema;
pub mod stats;
pub mod summary;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_insights", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    debug!("Parsed command: {:?}", cli.command);
    match cli.command {
        Commands::Analyze(args) => summary::execute(&args),
        Commands::Columns(args) => columns::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Export(args) => report::execute(&args),
        Commands::Prompt(args) => prompt::execute(&args),
    }
}
