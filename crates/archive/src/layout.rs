// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical archive layout and path resolution
//!
//! Paths are a pure function of (kind, timestamp, id) plus filesystem state.
//! Per-event request paths embed the date and hour/minute; two events landing
//! on the same minute get an explicit numbered suffix. Rollup paths are just
//! (kind, period). Lock files live under `.locks/`, outside the data tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime, Timelike};
use sha2::{Digest, Sha256};
use vigil_core::{ArchiveKind, Period, RequestId};

/// A logical archive file, independent of whether it is currently stored as a
/// plain file or as a member of a period bundle.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    /// One per-event request file
    Request { period: Period, file_name: String },
    /// One monthly rollup file
    Rollup { kind: ArchiveKind, period: Period },
}

impl Location {
    pub fn rollup(kind: ArchiveKind, period: Period) -> Self {
        Location::Rollup { kind, period }
    }

    pub fn kind(&self) -> ArchiveKind {
        match self {
            Location::Request { .. } => ArchiveKind::Request,
            Location::Rollup { kind, .. } => *kind,
        }
    }

    pub fn period(&self) -> Period {
        match self {
            Location::Request { period, .. } | Location::Rollup { period, .. } => *period,
        }
    }

    /// Name this file carries inside its period bundle
    pub fn member_name(&self) -> String {
        match self {
            Location::Request { file_name, .. } => file_name.clone(),
            Location::Rollup { period, .. } => format!("{}.txt", period.label()),
        }
    }

    /// Path relative to the archive root, the form stored in
    /// `source_archive_path` columns.
    pub fn rel_path(&self) -> String {
        match self {
            Location::Request { period, file_name } => format!(
                "{}/{:04}/{:02}/{}",
                ArchiveKind::Request.dir_name(),
                period.year,
                period.month,
                file_name
            ),
            Location::Rollup { kind, period } => {
                format!("{}/{}.txt", kind.dir_name(), period.label())
            }
        }
    }

    /// Parse a root-relative path back into a location
    pub fn parse(rel: &str) -> Option<Self> {
        let parts: Vec<&str> = rel.split('/').collect();
        match parts.as_slice() {
            [dir, year, month, file_name] if *dir == ArchiveKind::Request.dir_name() => {
                let period = Period {
                    year: year.parse().ok()?,
                    month: month.parse().ok()?,
                };
                (1..=12).contains(&period.month).then(|| Location::Request {
                    period,
                    file_name: (*file_name).to_string(),
                })
            }
            [dir, file_name] => {
                let kind = ArchiveKind::ALL
                    .into_iter()
                    .find(|k| k.is_rollup() && k.dir_name() == *dir)?;
                let label = file_name.strip_suffix(".txt")?;
                Some(Location::Rollup {
                    kind,
                    period: Period::parse_label(label)?,
                })
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rel_path())
    }
}

/// Resolver for canonical paths under one archive root
#[derive(Clone, Debug)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kind_dir(&self, kind: ArchiveKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Directory holding a month of plain request files
    pub fn month_dir(&self, period: Period) -> PathBuf {
        self.kind_dir(ArchiveKind::Request)
            .join(format!("{:04}", period.year))
            .join(format!("{:02}", period.month))
    }

    /// Plain-file path for a location
    pub fn plain_path(&self, location: &Location) -> PathBuf {
        self.root.join(location.rel_path())
    }

    /// Bundle path a location retires into
    pub fn bundle_path(&self, location: &Location) -> PathBuf {
        match location {
            Location::Request { period, .. } => self
                .kind_dir(ArchiveKind::Request)
                .join(format!("{:04}", period.year))
                .join(format!("{:02}.zip", period.month)),
            Location::Rollup { kind, period } => self
                .kind_dir(*kind)
                .join(format!("{}.zip", period.label())),
        }
    }

    /// Lock files live outside the data tree, named by a digest of the
    /// target path so any path shape maps to a flat directory.
    pub fn locks_dir(&self) -> PathBuf {
        self.root.join(".locks")
    }

    pub fn lock_path_for(&self, target: &Path) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(target.to_string_lossy().as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        self.locks_dir().join(format!("{}.lock", &digest[..16]))
    }

    /// Resolve the location for a new or existing request file.
    ///
    /// The base name embeds date and hour/minute. If a file already exists at
    /// the resolved path and does not carry this request's number, numbered
    /// suffixes `_2`, `_3`, ... are tried until a free (or matching) path is
    /// found.
    pub fn request_location(&self, id: RequestId, ts: NaiveDateTime) -> io::Result<Location> {
        let period = Period::of(ts);
        let stem = format!(
            "{:04}-{:02}-{:02}_{:02}{:02}",
            ts.year(),
            ts.month(),
            ts.day(),
            ts.hour(),
            ts.minute()
        );
        let dir = self.month_dir(period);

        let mut suffix = 1u32;
        loop {
            let file_name = if suffix == 1 {
                format!("{}.txt", stem)
            } else {
                format!("{}_{}.txt", stem, suffix)
            };
            let candidate = dir.join(&file_name);
            if !candidate.exists() || file_mentions_request(&candidate, id)? {
                return Ok(Location::Request { period, file_name });
            }
            suffix += 1;
        }
    }

    /// Plain request files currently on disk, grouped by nothing; bundled
    /// members are enumerated separately via the bundle manager.
    pub fn plain_request_files(&self) -> io::Result<Vec<Location>> {
        let mut found = Vec::new();
        let base = self.kind_dir(ArchiveKind::Request);
        for year_dir in sorted_entries(&base)? {
            let Some(year) = dir_number(&year_dir) else {
                continue;
            };
            for month_entry in sorted_entries(&year_dir)? {
                let Some(month) = dir_number(&month_entry) else {
                    continue;
                };
                if !month_entry.is_dir() {
                    continue;
                }
                let period = Period {
                    year: year as i32,
                    month: month as u32,
                };
                for file in sorted_entries(&month_entry)? {
                    if file.extension().is_some_and(|e| e == "txt") {
                        if let Some(name) = file.file_name() {
                            found.push(Location::Request {
                                period,
                                file_name: name.to_string_lossy().into_owned(),
                            });
                        }
                    }
                }
            }
        }
        Ok(found)
    }

    /// Request period bundles (`requests/<YYYY>/<MM>.zip`) currently on disk
    pub fn request_bundles(&self) -> io::Result<Vec<(Period, PathBuf)>> {
        let mut found = Vec::new();
        let base = self.kind_dir(ArchiveKind::Request);
        for year_dir in sorted_entries(&base)? {
            let Some(year) = dir_number(&year_dir) else {
                continue;
            };
            for entry in sorted_entries(&year_dir)? {
                if entry.extension().is_some_and(|e| e == "zip") {
                    if let Some(month) = stem_number(&entry) {
                        found.push((
                            Period {
                                year: year as i32,
                                month: month as u32,
                            },
                            entry,
                        ));
                    }
                }
            }
        }
        Ok(found)
    }

    /// Plain rollup files for a kind
    pub fn plain_rollups(&self, kind: ArchiveKind) -> io::Result<Vec<Location>> {
        let mut found = Vec::new();
        for entry in sorted_entries(&self.kind_dir(kind))? {
            if entry.extension().is_some_and(|e| e == "txt") {
                if let Some(period) = stem_period(&entry) {
                    found.push(Location::Rollup { kind, period });
                }
            }
        }
        Ok(found)
    }

    /// Rollup period bundles for a kind
    pub fn rollup_bundles(&self, kind: ArchiveKind) -> io::Result<Vec<(Period, PathBuf)>> {
        let mut found = Vec::new();
        for entry in sorted_entries(&self.kind_dir(kind))? {
            if entry.extension().is_some_and(|e| e == "zip") {
                if let Some(period) = stem_period(&entry) {
                    found.push((period, entry));
                }
            }
        }
        Ok(found)
    }

    /// Periods that still have plain (not yet retired) files for a kind
    pub fn active_periods(&self, kind: ArchiveKind) -> io::Result<Vec<Period>> {
        let mut periods: Vec<Period> = if kind.is_rollup() {
            self.plain_rollups(kind)?
                .into_iter()
                .map(|l| l.period())
                .collect()
        } else {
            self.plain_request_files()?
                .into_iter()
                .map(|l| l.period())
                .collect()
        };
        periods.sort();
        periods.dedup();
        Ok(periods)
    }
}

/// True if the file's header already names this request number, in either the
/// current or the legacy convention.
fn file_mentions_request(path: &Path, id: RequestId) -> io::Result<bool> {
    let content = fs::read_to_string(path)?;
    let current = format!("Request #{}", id.0);
    let legacy = format!("Prayer #{}", id.0);
    Ok(content
        .lines()
        .next()
        .is_some_and(|first| first.trim() == current || first.trim() == legacy))
}

/// Directory entries sorted by name; a missing directory reads as empty
fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut entries: Vec<PathBuf> = read
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|e| e.path())
        .collect();
    entries.sort();
    Ok(entries)
}

fn dir_number(path: &Path) -> Option<u64> {
    path.file_name()?.to_str()?.parse().ok()
}

fn stem_number(path: &Path) -> Option<u64> {
    path.file_stem()?.to_str()?.parse().ok()
}

fn stem_period(path: &Path) -> Option<Period> {
    Period::parse_label(path.file_stem()?.to_str()?)
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
