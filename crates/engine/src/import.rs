// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idempotent archive import
//!
//! Walks request files (plain and bundled) and registration rollups, parses
//! them, and performs a natural-key check-then-insert for every record. The
//! interaction and status rollups are site-wide audit mirrors, not import
//! sources; the canonical copies of those records live in the request files.
//! Per-file failures are recorded and the walk continues; only resource-level
//! failures abort the run.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};
use vigil_archive::{
    parse_request_file, parse_rollup_file, Activity, ArchiveReader, CompressionManager, Layout,
    Location, RollupEntry,
};
use vigil_core::{ArchiveKind, CancelToken, EngineConfig, Record};
use vigil_db::{Store, Upsert};

use crate::error::EngineError;
use crate::report::{ConflictEntry, FailureEntry};

/// Counters for one import run. `inserted` reports only true insertions;
/// re-running over the same archive yields `inserted == 0`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ImportStats {
    pub files_scanned: u64,
    pub seen: u64,
    pub inserted: u64,
    pub skipped: u64,
    pub inserted_by_kind: BTreeMap<String, u64>,
    pub conflicts: Vec<ConflictEntry>,
    pub failures: Vec<FailureEntry>,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} files scanned: {} records seen, {} inserted, {} skipped, {} conflicts, {} failed",
            self.files_scanned,
            self.seen,
            self.inserted,
            self.skipped,
            self.conflicts.len(),
            self.failures.len()
        )?;
        for (kind, count) in &self.inserted_by_kind {
            writeln!(f, "  {}: {} inserted", kind, count)?;
        }
        for failure in &self.failures {
            writeln!(f, "  failed {}: {}", failure.path, failure.error)?;
        }
        for conflict in &self.conflicts {
            writeln!(f, "  conflict on {}", conflict.key)?;
        }
        Ok(())
    }
}

/// Rebuilds the database cache from the archive tree
pub struct Importer<'a> {
    layout: Layout,
    reader: ArchiveReader,
    bundles: CompressionManager,
    store: &'a Store,
    dry_run: bool,
    token: CancelToken,
}

impl<'a> Importer<'a> {
    pub fn new(config: &EngineConfig, store: &'a Store) -> Self {
        let layout = Layout::new(&config.archive_root);
        Self {
            reader: ArchiveReader::new(layout.clone(), config.lock_timeout),
            bundles: CompressionManager::new(layout.clone(), config.lock_timeout),
            layout,
            store,
            dry_run: false,
            token: CancelToken::new(),
        }
    }

    /// Perform all read/parse/lookup work but issue no writes
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    /// Import every request file and registration rollup under the root
    pub fn import(&self) -> Result<ImportStats, EngineError> {
        let mut stats = ImportStats::default();

        for location in self.request_locations(&mut stats)? {
            if self.token.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            self.import_request_file(&location, &mut stats);
        }

        for location in self.rollup_locations(ArchiveKind::Registration, &mut stats)? {
            if self.token.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            self.import_registration_rollup(&location, &mut stats);
        }

        info!(
            files = stats.files_scanned,
            inserted = stats.inserted,
            skipped = stats.skipped,
            dry_run = self.dry_run,
            "import finished"
        );
        Ok(stats)
    }

    /// All request file locations: plain files plus members of retired
    /// bundles. An unreadable bundle is a per-file failure, not an abort.
    fn request_locations(&self, stats: &mut ImportStats) -> Result<Vec<Location>, EngineError> {
        let mut locations = self.layout.plain_request_files()?;
        for (period, bundle) in self.layout.request_bundles()? {
            match self.bundles.list_members(&bundle) {
                Ok(members) => locations.extend(
                    members
                        .into_iter()
                        .filter(|m| m.ends_with(".txt"))
                        .map(|file_name| Location::Request { period, file_name }),
                ),
                Err(e) => {
                    warn!(bundle = %bundle.display(), error = %e, "skipping unreadable bundle");
                    stats.failures.push(FailureEntry::new(bundle.display().to_string(), e));
                }
            }
        }
        Ok(locations)
    }

    fn rollup_locations(
        &self,
        kind: ArchiveKind,
        stats: &mut ImportStats,
    ) -> Result<Vec<Location>, EngineError> {
        let mut locations = self.layout.plain_rollups(kind)?;
        for (period, bundle) in self.layout.rollup_bundles(kind)? {
            match self.bundles.list_members(&bundle) {
                Ok(_) => locations.push(Location::rollup(kind, period)),
                Err(e) => {
                    stats.failures.push(FailureEntry::new(bundle.display().to_string(), e));
                }
            }
        }
        Ok(locations)
    }

    fn import_request_file(&self, location: &Location, stats: &mut ImportStats) {
        stats.files_scanned += 1;
        let rel = location.rel_path();
        let text = match self.reader.read(location) {
            Ok(text) => text,
            Err(e) => {
                stats.failures.push(FailureEntry::new(&rel, e));
                return;
            }
        };
        let parsed = match parse_request_file(&rel, &text) {
            Ok(parsed) => parsed,
            Err(e) => {
                stats.failures.push(FailureEntry::new(&rel, e));
                return;
            }
        };

        self.apply(Record::Creation(parsed.creation), &rel, stats);
        for activity in parsed.activity {
            let record = match activity {
                Activity::Interaction(i) => Record::Interaction(i),
                Activity::StatusChange(s) => Record::StatusChange(s),
                Activity::Testimony(t) => Record::Testimony(t),
            };
            self.apply(record, &rel, stats);
        }
    }

    fn import_registration_rollup(&self, location: &Location, stats: &mut ImportStats) {
        stats.files_scanned += 1;
        let rel = location.rel_path();
        let text = match self.reader.read(location) {
            Ok(text) => text,
            Err(e) => {
                stats.failures.push(FailureEntry::new(&rel, e));
                return;
            }
        };
        let parsed = match parse_rollup_file(&rel, &text) {
            Ok(parsed) => parsed,
            Err(e) => {
                stats.failures.push(FailureEntry::new(&rel, e));
                return;
            }
        };
        for section in parsed.sections {
            for entry in section.entries {
                if let RollupEntry::Registration(r) = entry {
                    self.apply(Record::Registration(r), &rel, stats);
                }
            }
        }
    }

    /// One natural-key check-then-insert, with uniform counting across every
    /// record kind
    fn apply(&self, record: Record, source: &str, stats: &mut ImportStats) {
        stats.seen += 1;
        let outcome = if self.dry_run {
            self.store.probe(&record)
        } else {
            self.store.upsert(&record, Some(source))
        };
        match outcome {
            Ok(Upsert::Inserted) => {
                stats.inserted += 1;
                *stats
                    .inserted_by_kind
                    .entry(record.kind().to_string())
                    .or_default() += 1;
                if !self.dry_run {
                    if let Record::StatusChange(s) = &record {
                        // Activity lines are oldest-first, so the last applied
                        // status is the current one
                        if let Err(e) = self.store.apply_status(s.request, &s.new_status) {
                            stats.failures.push(FailureEntry::new(source, e));
                        }
                    }
                }
            }
            Ok(Upsert::Skipped) => stats.skipped += 1,
            Ok(Upsert::Conflict {
                key,
                existing_digest,
                incoming_digest,
            }) => stats.conflicts.push(ConflictEntry {
                key: key.to_string(),
                existing_digest,
                incoming_digest,
            }),
            Err(e) => stats.failures.push(FailureEntry::new(source, e)),
        }
    }
}

#[cfg(test)]
#[path = "import_tests.rs"]
mod tests;
