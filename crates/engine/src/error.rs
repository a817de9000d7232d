// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for engine operations
//!
//! Only resource-level failures surface here; per-file problems during batch
//! runs land in the run's report instead.

use thiserror::Error;
use vigil_archive::{BundleError, ReadError, WriteError};
use vigil_db::DbError;

/// Errors that abort an engine operation
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("archive write failed: {0}")]
    Write(#[from] WriteError),
    #[error("archive read failed: {0}")]
    Read(#[from] ReadError),
    #[error("bundle operation failed: {0}")]
    Bundle(#[from] BundleError),
    #[error("database error: {0}")]
    Db(#[from] DbError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("operation cancelled")]
    Cancelled,
}
