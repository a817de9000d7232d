// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transparent archive reader
//!
//! Reads a logical file whether it is still a plain file or already retired
//! into its period bundle. Error kinds stay distinct so callers can tell a
//! file that never existed from a corrupt bundle or a missing member.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::bundle::CompressionManager;
use crate::error::{BundleError, ReadError};
use crate::layout::{Layout, Location};

/// Where a logical file currently lives
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolved {
    /// Plain file, still appendable in place
    Active(PathBuf),
    /// Member of a period bundle
    Retired { bundle: PathBuf, member: String },
    /// Neither plain file nor bundle holds it
    Absent,
}

/// Reads logical archive files regardless of lifecycle state
#[derive(Clone, Debug)]
pub struct ArchiveReader {
    layout: Layout,
    bundles: CompressionManager,
}

impl ArchiveReader {
    pub fn new(layout: Layout, lock_timeout: Duration) -> Self {
        let bundles = CompressionManager::new(layout.clone(), lock_timeout);
        Self { layout, bundles }
    }

    /// Determine the lifecycle state of a location without reading it
    pub fn resolve(&self, location: &Location) -> Resolved {
        let plain = self.layout.plain_path(location);
        if plain.is_file() {
            return Resolved::Active(plain);
        }
        let bundle = self.layout.bundle_path(location);
        if bundle.is_file() {
            return Resolved::Retired {
                bundle,
                member: location.member_name(),
            };
        }
        Resolved::Absent
    }

    /// Read a logical file: plain path first, then the period bundle
    pub fn read(&self, location: &Location) -> Result<String, ReadError> {
        let plain = self.layout.plain_path(location);
        match fs::read_to_string(&plain) {
            Ok(content) => return Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let bundle = self.layout.bundle_path(location);
        if !bundle.is_file() {
            return Err(ReadError::NotFound(plain));
        }
        self.bundles
            .read_member(&bundle, &location.member_name())
            .map_err(|e| match e {
                BundleError::MemberMissing { bundle, member } => {
                    ReadError::MemberMissing { bundle, member }
                }
                BundleError::Io(io) => ReadError::Io(io),
                // read_member reports any malformed zip as Corrupt
                _ => ReadError::BundleCorrupt(bundle),
            })
    }
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
