// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `vigil import` - rebuild the database cache from the archive tree

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use vigil_core::{CancelToken, EngineConfig};
use vigil_engine::Importer;

use crate::output::{print, OutputFormat};

#[derive(Args)]
pub struct ImportArgs {
    /// Scan and report without writing to the database
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(
    config: &EngineConfig,
    args: ImportArgs,
    token: CancelToken,
    format: OutputFormat,
) -> Result<ExitCode> {
    let store = super::open_store(config)?;
    let stats = Importer::new(config, &store)
        .with_dry_run(args.dry_run)
        .with_cancel_token(token)
        .import()?;
    print(&stats, format);
    Ok(ExitCode::SUCCESS)
}
