// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic archive writer
//!
//! First creation writes a temp sibling, syncs, then renames over the target;
//! appends open the existing file under the path-scoped lock. For rollups the
//! date-header check and the append happen under one lock acquisition, so
//! concurrent threads cannot emit a duplicate header.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use crate::error::WriteError;
use crate::layout::Layout;
use crate::lock::PathLock;
use crate::render::date_header;

/// Appends logical entries to archive files atomically
#[derive(Clone, Debug)]
pub struct ArchiveWriter {
    layout: Layout,
    lock_timeout: Duration,
}

impl ArchiveWriter {
    pub fn new(layout: Layout, lock_timeout: Duration) -> Self {
        Self {
            layout,
            lock_timeout,
        }
    }

    /// Create a file with the given content: temp sibling, sync, rename.
    /// A crash mid-write leaves at most a stray temp file, never a partial
    /// target.
    pub fn create(&self, path: &Path, text: &str) -> Result<(), WriteError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));
        let result = (|| {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, path)?;
            Ok(())
        })();
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        debug!(path = %path.display(), "archive file created");
        result
    }

    /// Append raw text to an existing (or new) file under the path lock
    pub fn append(&self, path: &Path, text: &str) -> Result<(), WriteError> {
        let _lock = PathLock::acquire(&self.layout, path, self.lock_timeout)?;
        self.append_locked(path, text)
    }

    /// Append one entry line to a rollup file, inserting the date-section
    /// header first when the file does not already carry one for `date`.
    pub fn append_rollup(&self, path: &Path, date: NaiveDate, line: &str) -> Result<(), WriteError> {
        let _lock = PathLock::acquire(&self.layout, path, self.lock_timeout)?;
        let current = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        self.append_locked(path, &rollup_chunk(&current, date, line))
    }

    fn append_locked(&self, path: &Path, text: &str) -> Result<(), WriteError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }
}

/// Compose the chunk to append for one rollup entry, given the file's current
/// content. Pure so header dedup is testable without the filesystem.
pub(crate) fn rollup_chunk(current: &str, date: NaiveDate, line: &str) -> String {
    let header = date_header(date);
    let has_header = current.lines().any(|l| l.trim() == header);
    match (has_header, current.is_empty()) {
        (true, _) => format!("{}\n", line),
        (false, true) => format!("{}\n{}\n", header, line),
        (false, false) => format!("\n{}\n{}\n", header, line),
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
