// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `vigil compress` - retire old archive periods into verified zip bundles

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use vigil_core::{CancelToken, EngineConfig, SystemClock};
use vigil_engine::Retention;

use crate::output::{print, OutputFormat};

#[derive(Args)]
pub struct CompressArgs {
    /// Retire periods whose last day is more than this many days old;
    /// defaults to the configured retention window
    #[arg(long)]
    pub older_than_days: Option<u32>,

    /// List eligible periods without bundling them
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(
    config: &EngineConfig,
    args: CompressArgs,
    token: CancelToken,
    format: OutputFormat,
) -> Result<ExitCode> {
    let days = args.older_than_days.unwrap_or(config.retention_days);
    let report = Retention::new(config, SystemClock)
        .with_dry_run(args.dry_run)
        .with_cancel_token(token)
        .compress(days)?;
    print(&report, format);
    Ok(if report.failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
