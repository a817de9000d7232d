// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vigil - operational CLI for the prayer-wall storage engine

mod commands;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vigil_core::{CancelToken, EngineConfig};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "vigil",
    version,
    about = "Archive-first storage engine for the prayer wall"
)]
struct Cli {
    /// Root of the archive directory tree
    #[arg(long, global = true)]
    archive_root: Option<PathBuf>,

    /// Path to the SQLite cache database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// TOML config file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit machine-readable JSON reports
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the database cache from the archive tree
    Import(commands::import::ImportArgs),
    /// Reconstruct archive entries for rows that lost their backing
    Heal(commands::heal::HealArgs),
    /// Retire old archive periods into verified zip bundles
    Compress(commands::compress::CompressArgs),
    /// Cross-check the archive against the database, read-only
    Validate(commands::validate::ValidateArgs),
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::debug!(
        archive_root = %config.archive_root.display(),
        db = %config.db_path.display(),
        "configuration resolved"
    );
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let token = CancelToken::new();
    let handle = token.clone();
    ctrlc::set_handler(move || handle.cancel()).context("failed to install Ctrl-C handler")?;

    match cli.command {
        Commands::Import(args) => commands::import::run(&config, args, token, format),
        Commands::Heal(args) => commands::heal::run(&config, args, token, format),
        Commands::Compress(args) => commands::compress::run(&config, args, token, format),
        Commands::Validate(args) => commands::validate::run(&config, args, token, format),
    }
}

/// Resolve the engine configuration from the config file and flag overrides
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => match (&cli.archive_root, &cli.db) {
            (Some(root), Some(db)) => EngineConfig::new(root, db),
            _ => bail!("either --config or both --archive-root and --db are required"),
        },
    };
    if let Some(root) = &cli.archive_root {
        config.archive_root = root.clone();
    }
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    Ok(config)
}
