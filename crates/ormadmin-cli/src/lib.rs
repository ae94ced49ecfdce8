//! ORMDB Admin CLI - browse, filter, export and delete-preview rows of a schema.
//!
//! Loads a schema/admin config and a dataset from JSON files into an in-memory
//! store and runs one admin command against it.

pub mod commands;
pub mod config;
pub mod error;
pub mod formatter;

use std::path::PathBuf;

use clap::Parser;
use tracing::debug;

use commands::{Command, Context};
use config::{load_data, AdminConfig};
use formatter::OutputFormat;

pub use error::{Error, Result};

/// ORMDB Admin Command-Line Client
#[derive(Parser, Debug)]
#[command(name = "ormadmin")]
#[command(version, about = "Admin tooling for ORMDB schemas")]
pub struct Args {
    /// Schema and admin config (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Dataset: model name -> array of rows (JSON)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Load config and data, run the command, and return its output.
pub fn run(args: Args) -> Result<String> {
    let config = AdminConfig::load(&args.config)?;
    let registry = config.build_registry()?;
    let store = load_data(&args.data, &config.models)?;
    let formatter = formatter::create_formatter(args.format);

    debug!(command = ?args.command, format = %args.format, "running command");
    let ctx = Context {
        registry: &registry,
        store: &store,
        formatter: &*formatter,
    };
    commands::execute(&ctx, args.command)
}
