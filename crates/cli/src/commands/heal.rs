// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `vigil heal` - reconstruct archive entries for rows that lost their backing

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use vigil_core::{CancelToken, EngineConfig};
use vigil_engine::Healer;

use crate::output::{print, OutputFormat};

#[derive(Args)]
pub struct HealArgs {
    /// Report what would be healed without writing anywhere
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(
    config: &EngineConfig,
    args: HealArgs,
    token: CancelToken,
    format: OutputFormat,
) -> Result<ExitCode> {
    let store = super::open_store(config)?;
    let report = Healer::new(config, &store)
        .with_dry_run(args.dry_run)
        .with_cancel_token(token)
        .heal()?;
    print(&report, format);
    Ok(ExitCode::SUCCESS)
}
