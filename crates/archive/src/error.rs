// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for archive operations
//!
//! Read errors keep `NotFound`, `BundleCorrupt`, and `MemberMissing` as
//! distinct kinds so the healer can react differently to each.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors from the write path. Fatal to the triggering operation; on any
/// failure the target file is either unchanged or absent.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("lock on {path} not acquired within {waited:?}")]
    LockTimeout { path: PathBuf, waited: Duration },
    #[error(transparent)]
    Bundle(#[from] BundleError),
}

/// Errors from reading a logical archive file
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("archive file not found: {0}")]
    NotFound(PathBuf),
    #[error("bundle corrupt: {0}")]
    BundleCorrupt(PathBuf),
    #[error("member {member} missing from bundle {bundle}")]
    MemberMissing { bundle: PathBuf, member: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors from parsing archive text. Scoped to one file; batch jobs record
/// these and continue.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{path}: preamble matches no known convention")]
    UnrecognizedPreamble { path: String },
    #[error("{path}: bad timestamp in {line:?}")]
    BadTimestamp { path: String, line: String },
}

/// Errors from compression bundles
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("bundle corrupt: {0}")]
    Corrupt(PathBuf),
    #[error("member {member} missing from bundle {bundle}")]
    MemberMissing { bundle: PathBuf, member: String },
    #[error("verification of {bundle} failed: {reason}")]
    VerifyFailed { bundle: PathBuf, reason: String },
    #[error("lock on {path} not acquired within {waited:?}")]
    LockTimeout { path: PathBuf, waited: Duration },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
