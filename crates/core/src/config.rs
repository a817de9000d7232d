// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration
//!
//! All components receive the archive root and database path through this
//! struct; nothing in the engine reads process-wide state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Engine configuration, loaded from TOML or built directly
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Root of the archive directory tree
    pub archive_root: PathBuf,
    /// Path to the SQLite cache database
    pub db_path: PathBuf,
    /// Bound on waiting for a path-scoped file lock
    #[serde(with = "humantime_serde", default = "default_lock_timeout")]
    pub lock_timeout: Duration,
    /// Periods older than this many days are eligible for compression
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_lock_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_retention_days() -> u32 {
    365
}

impl EngineConfig {
    pub fn new(archive_root: impl Into<PathBuf>, db_path: impl Into<PathBuf>) -> Self {
        Self {
            archive_root: archive_root.into(),
            db_path: db_path.into(),
            lock_timeout: default_lock_timeout(),
            retention_days: default_retention_days(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
