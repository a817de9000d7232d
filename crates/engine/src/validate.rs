// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only cross-check of the archive against the database cache
//!
//! Both sides are projected to natural-key record sets and compared per kind.
//! Validation never writes anywhere; drift is reported so the operator can
//! decide between re-import and heal.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;
use vigil_archive::{
    parse_request_file, parse_rollup_file, Activity, ArchiveReader, CompressionManager, Layout,
    Location, RollupEntry,
};
use vigil_core::{ArchiveKind, CancelToken, EngineConfig, NaturalKey, Record, RecordKind};
use vigil_db::Store;

use crate::error::EngineError;
use crate::report::{ConflictEntry, FailureEntry};

/// Comparison counters for one record kind
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub kind: String,
    pub matched: u64,
    pub db_only: u64,
    pub archive_only: u64,
}

/// Outcome of one validation run
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConsistencyReport {
    pub kinds: Vec<KindCounts>,
    pub conflicts: Vec<ConflictEntry>,
    pub failures: Vec<FailureEntry>,
}

impl ConsistencyReport {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
            && self.failures.is_empty()
            && self
                .kinds
                .iter()
                .all(|k| k.db_only == 0 && k.archive_only == 0)
    }
}

impl std::fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for counts in &self.kinds {
            writeln!(
                f,
                "{}: {} matched, {} db-only, {} archive-only",
                counts.kind, counts.matched, counts.db_only, counts.archive_only
            )?;
        }
        for conflict in &self.conflicts {
            writeln!(f, "  conflict on {}", conflict.key)?;
        }
        for failure in &self.failures {
            writeln!(f, "  failed {}: {}", failure.path, failure.error)?;
        }
        writeln!(
            f,
            "{}",
            if self.is_clean() { "clean" } else { "DRIFT DETECTED" }
        )
    }
}

/// Compares the archive tree and the database cache without touching either
pub struct Validator<'a> {
    layout: Layout,
    reader: ArchiveReader,
    bundles: CompressionManager,
    store: &'a Store,
    token: CancelToken,
}

impl<'a> Validator<'a> {
    pub fn new(config: &EngineConfig, store: &'a Store) -> Self {
        let layout = Layout::new(&config.archive_root);
        Self {
            reader: ArchiveReader::new(layout.clone(), config.lock_timeout),
            bundles: CompressionManager::new(layout.clone(), config.lock_timeout),
            layout,
            store,
            token: CancelToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    pub fn validate(&self) -> Result<ConsistencyReport, EngineError> {
        let mut report = ConsistencyReport::default();
        let archive = self.archive_records(&mut report)?;
        let db = self.db_records()?;

        for kind in RecordKind::ALL {
            let mut counts = KindCounts {
                kind: kind.to_string(),
                matched: 0,
                db_only: 0,
                archive_only: 0,
            };
            for (key, record) in archive.iter().filter(|(_, r)| r.kind() == kind) {
                match db.get(key) {
                    Some(other) if other.content_digest() == record.content_digest() => {
                        counts.matched += 1;
                    }
                    Some(other) => report.conflicts.push(ConflictEntry::new(
                        key.as_str(),
                        other.content_digest(),
                        record.content_digest(),
                    )),
                    None => counts.archive_only += 1,
                }
            }
            counts.db_only = db
                .iter()
                .filter(|(key, r)| r.kind() == kind && !archive.contains_key(*key))
                .count() as u64;
            report.kinds.push(counts);
        }

        info!(clean = report.is_clean(), "validation finished");
        Ok(report)
    }

    /// Project the archive to a key-indexed record set. Two archive copies of
    /// one key must agree on digest; disagreement is a conflict and the first
    /// copy wins the slot.
    fn archive_records(
        &self,
        report: &mut ConsistencyReport,
    ) -> Result<BTreeMap<NaturalKey, Record>, EngineError> {
        let mut records = BTreeMap::new();

        for location in self.request_locations(report)? {
            if self.token.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let rel = location.rel_path();
            let text = match self.reader.read(&location) {
                Ok(text) => text,
                Err(e) => {
                    report.failures.push(FailureEntry::new(&rel, e));
                    continue;
                }
            };
            match parse_request_file(&rel, &text) {
                Ok(parsed) => {
                    self.collect(Record::Creation(parsed.creation), &mut records, report);
                    for activity in parsed.activity {
                        let record = match activity {
                            Activity::Interaction(i) => Record::Interaction(i),
                            Activity::StatusChange(s) => Record::StatusChange(s),
                            Activity::Testimony(t) => Record::Testimony(t),
                        };
                        self.collect(record, &mut records, report);
                    }
                }
                Err(e) => report.failures.push(FailureEntry::new(&rel, e)),
            }
        }

        for location in self.registration_rollups(report)? {
            if self.token.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let rel = location.rel_path();
            let text = match self.reader.read(&location) {
                Ok(text) => text,
                Err(e) => {
                    report.failures.push(FailureEntry::new(&rel, e));
                    continue;
                }
            };
            match parse_rollup_file(&rel, &text) {
                Ok(parsed) => {
                    for section in parsed.sections {
                        for entry in section.entries {
                            if let RollupEntry::Registration(r) = entry {
                                self.collect(Record::Registration(r), &mut records, report);
                            }
                        }
                    }
                }
                Err(e) => report.failures.push(FailureEntry::new(&rel, e)),
            }
        }

        Ok(records)
    }

    fn collect(
        &self,
        record: Record,
        records: &mut BTreeMap<NaturalKey, Record>,
        report: &mut ConsistencyReport,
    ) {
        let key = record.natural_key();
        match records.get(&key) {
            None => {
                records.insert(key, record);
            }
            Some(existing) if existing.content_digest() == record.content_digest() => {}
            Some(existing) => report.conflicts.push(ConflictEntry::new(
                key.as_str(),
                existing.content_digest(),
                record.content_digest(),
            )),
        }
    }

    /// Project the cache to a key-indexed record set. Placeholder users have
    /// no registration event and are not expected in the archive.
    fn db_records(&self) -> Result<BTreeMap<NaturalKey, Record>, EngineError> {
        let mut records = BTreeMap::new();
        let mut add = |record: Record| {
            records.insert(record.natural_key(), record);
        };

        for user in self.store.users()? {
            if let Some(record) = user.to_record() {
                add(record);
            }
        }
        for request in self.store.requests()? {
            add(Record::Creation(request.to_creation()));
        }
        for row in self.store.interactions()? {
            add(Record::Interaction(row.to_interaction()));
        }
        for row in self.store.status_changes()? {
            add(Record::StatusChange(row.to_status_change()));
        }
        for row in self.store.testimonies()? {
            add(Record::Testimony(row.to_testimony()));
        }
        Ok(records)
    }

    fn request_locations(
        &self,
        report: &mut ConsistencyReport,
    ) -> Result<Vec<Location>, EngineError> {
        let mut locations = self.layout.plain_request_files()?;
        for (period, bundle) in self.layout.request_bundles()? {
            match self.bundles.list_members(&bundle) {
                Ok(members) => locations.extend(
                    members
                        .into_iter()
                        .filter(|m| m.ends_with(".txt"))
                        .map(|file_name| Location::Request { period, file_name }),
                ),
                Err(e) => report
                    .failures
                    .push(FailureEntry::new(bundle.display().to_string(), e)),
            }
        }
        Ok(locations)
    }

    fn registration_rollups(
        &self,
        report: &mut ConsistencyReport,
    ) -> Result<Vec<Location>, EngineError> {
        let kind = ArchiveKind::Registration;
        let mut locations = self.layout.plain_rollups(kind)?;
        for (period, bundle) in self.layout.rollup_bundles(kind)? {
            match self.bundles.list_members(&bundle) {
                Ok(_) => locations.push(Location::rollup(kind, period)),
                Err(e) => report
                    .failures
                    .push(FailureEntry::new(bundle.display().to_string(), e)),
            }
        }
        Ok(locations)
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
