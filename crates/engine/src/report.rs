// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared report entry types for batch operations

use serde::Serialize;

/// A file (or record) that failed during a batch run; the run continued
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailureEntry {
    pub path: String,
    pub error: String,
}

impl FailureEntry {
    pub fn new(path: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            path: path.into(),
            error: error.to_string(),
        }
    }
}

/// Two records resolved to the same natural key with different material
/// content. Surfaced, never auto-resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConflictEntry {
    pub key: String,
    pub existing_digest: String,
    pub incoming_digest: String,
}

impl ConflictEntry {
    pub fn new(
        key: impl Into<String>,
        existing_digest: impl Into<String>,
        incoming_digest: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            existing_digest: existing_digest.into(),
            incoming_digest: incoming_digest.into(),
        }
    }
}
