// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the query cache

use thiserror::Error;

/// Errors from the SQLite cache
#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unsupported schema version {found} (expected {expected})")]
    SchemaVersion { found: i32, expected: i32 },
}
