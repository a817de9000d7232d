// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vigil-engine - the live write path and the batch jobs
//!
//! The recorder implements the archive-first write policy: the durable text
//! file is written before, and is a precondition for, the database write.
//! The batch jobs (import, heal, compress, validate) assume a quiescent
//! archive tree and accumulate per-file failures into their reports instead
//! of aborting.

mod compress;
mod error;
mod heal;
mod import;
mod recorder;
mod report;
mod validate;

pub use compress::{CompressionReport, Retention};
pub use error::EngineError;
pub use heal::{HealReport, Healer, IncompleteEntry};
pub use import::{ImportStats, Importer};
pub use recorder::Recorder;
pub use report::{ConflictEntry, FailureEntry};
pub use validate::{ConsistencyReport, KindCounts, Validator};
