// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subcommand implementations

pub mod compress;
pub mod heal;
pub mod import;
pub mod validate;

use std::fs;

use anyhow::{Context, Result};
use vigil_core::EngineConfig;
use vigil_db::Store;

/// Open the cache database, creating its parent directory if needed
pub fn open_store(config: &EngineConfig) -> Result<Store> {
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    Store::open(&config.db_path)
        .with_context(|| format!("failed to open database {}", config.db_path.display()))
}
