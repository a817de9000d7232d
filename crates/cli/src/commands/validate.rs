// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `vigil validate` - cross-check the archive against the database cache

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use vigil_core::{CancelToken, EngineConfig};
use vigil_engine::Validator;

use crate::output::{print, OutputFormat};

#[derive(Args)]
pub struct ValidateArgs {}

pub fn run(
    config: &EngineConfig,
    _args: ValidateArgs,
    token: CancelToken,
    format: OutputFormat,
) -> Result<ExitCode> {
    let store = super::open_store(config)?;
    let report = Validator::new(config, &store)
        .with_cancel_token(token)
        .validate()?;
    print(&report, format);
    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
