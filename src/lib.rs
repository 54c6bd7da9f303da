pub mod align;
pub mod classify;
pub mod cli;
pub mod column_diff;
pub mod columns;
pub mod compare;
pub mod config;
pub mod data;
pub mod error;
pub mod io_utils;
pub mod keys;
pub mod preview;
pub mod report;
pub mod sheet;
pub mod summary;
pub mod table;
pub mod workbook;
pub mod writer;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("workbook_diff", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Compare(args) => compare::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
    }
}
