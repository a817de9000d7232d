// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path-scoped advisory file locks
//!
//! Each archive path maps to one lock file under `.locks/`. The lock is held
//! for the whole read-check-write sequence of an append, so concurrent
//! threads cannot interleave a header check with another writer's append.
//! Acquisition is bounded: a stuck writer surfaces as `LockTimeout` instead
//! of wedging batch jobs.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use tracing::trace;

use crate::error::WriteError;
use crate::layout::Layout;

const RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// Exclusive advisory lock scoped to one archive path. Released on drop.
#[derive(Debug)]
pub struct PathLock {
    file: File,
    target: PathBuf,
}

impl PathLock {
    /// Acquire the lock for `target`, waiting at most `timeout`.
    pub fn acquire(layout: &Layout, target: &Path, timeout: Duration) -> Result<Self, WriteError> {
        let lock_path = layout.lock_path_for(target);
        std::fs::create_dir_all(layout.locks_dir())?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    trace!(target_path = %target.display(), "lock acquired");
                    return Ok(Self {
                        file,
                        target: target.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if Instant::now() >= deadline {
                        return Err(WriteError::LockTimeout {
                            path: target.to_path_buf(),
                            waited: timeout,
                        });
                    }
                    std::thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => return Err(WriteError::Io(e)),
            }
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

impl Drop for PathLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
