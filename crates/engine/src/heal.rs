// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Healing: reconstructing missing archive entries from database state
//!
//! For every user or request row whose archive backing is null or no longer
//! readable, the healer rebuilds a best-effort archive entry and updates the
//! row's path. Rows whose file exists but whose activity section disagrees
//! with the database are reported as rebuild candidates, never silently
//! rewritten.

use serde::Serialize;
use tracing::info;
use vigil_archive::{
    parse_request_file, parse_rollup_file, render_request_file, rollup_registration_line,
    Activity, ArchiveReader, ArchiveWriter, CompressionManager, Layout, Location, ReadError,
    Resolved, RollupEntry,
};
use vigil_core::{ArchiveKind, CancelToken, EngineConfig, Period, Registration, RequestId};
use vigil_db::{ActivityRow, Store, UserRow};

use crate::error::EngineError;
use crate::report::FailureEntry;

/// A request whose archive file exists but disagrees with the database on
/// activity count; needs a full rebuild, which healing never does on its own
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IncompleteEntry {
    pub path: String,
    pub db_activity: u64,
    pub archive_activity: u64,
}

/// Outcome of one heal run
#[derive(Clone, Debug, Default, Serialize)]
pub struct HealReport {
    pub healed_users: Vec<String>,
    pub healed_requests: Vec<u64>,
    pub incomplete: Vec<IncompleteEntry>,
    pub skipped_placeholders: u64,
    pub failures: Vec<FailureEntry>,
}

impl std::fmt::Display for HealReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} users healed, {} requests healed, {} incomplete, {} failed",
            self.healed_users.len(),
            self.healed_requests.len(),
            self.incomplete.len(),
            self.failures.len()
        )?;
        for entry in &self.incomplete {
            writeln!(
                f,
                "  incomplete {}: {} activity rows in db, {} lines in archive",
                entry.path, entry.db_activity, entry.archive_activity
            )?;
        }
        for failure in &self.failures {
            writeln!(f, "  failed {}: {}", failure.path, failure.error)?;
        }
        Ok(())
    }
}

/// Reconstructs archive entries for database rows that lost their backing
pub struct Healer<'a> {
    layout: Layout,
    writer: ArchiveWriter,
    reader: ArchiveReader,
    bundles: CompressionManager,
    store: &'a Store,
    dry_run: bool,
    token: CancelToken,
}

impl<'a> Healer<'a> {
    pub fn new(config: &EngineConfig, store: &'a Store) -> Self {
        let layout = Layout::new(&config.archive_root);
        Self {
            writer: ArchiveWriter::new(layout.clone(), config.lock_timeout),
            reader: ArchiveReader::new(layout.clone(), config.lock_timeout),
            bundles: CompressionManager::new(layout.clone(), config.lock_timeout),
            layout,
            store,
            dry_run: false,
            token: CancelToken::new(),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    pub fn heal(&self) -> Result<HealReport, EngineError> {
        let mut report = HealReport::default();

        for user in self.store.users()? {
            if self.token.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            self.heal_user(&user, &mut report);
        }

        for request in self.store.requests()? {
            if self.token.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            self.heal_request(&request, &mut report);
        }

        info!(
            users = report.healed_users.len(),
            requests = report.healed_requests.len(),
            incomplete = report.incomplete.len(),
            dry_run = self.dry_run,
            "heal finished"
        );
        Ok(report)
    }

    /// Heal one user row: its registration line must be present in the
    /// period rollup its source path names (or should name)
    fn heal_user(&self, user: &UserRow, report: &mut HealReport) {
        // Placeholders have no registration event to archive
        let Some(registered_at) = user.registered_at else {
            report.skipped_placeholders += 1;
            return;
        };
        let registration = Registration {
            username: user.username.clone(),
            email: user.email.clone(),
            registered_at,
        };

        let location = user
            .source_archive_path
            .as_deref()
            .and_then(Location::parse)
            .unwrap_or_else(|| {
                Location::rollup(ArchiveKind::Registration, Period::of(registered_at))
            });

        match self.reader.read(&location) {
            Ok(text) => {
                // File exists; the line itself may still be missing
                let present = parse_rollup_file(&location.rel_path(), &text)
                    .map(|parsed| {
                        parsed.sections.iter().any(|s| {
                            s.entries.iter().any(|e| {
                                matches!(e, RollupEntry::Registration(r) if r.username == user.username)
                            })
                        })
                    })
                    .unwrap_or(false);
                if present && user.source_archive_path.is_some() {
                    return;
                }
                if present {
                    // Row just lost its pointer; restore it
                    if !self.dry_run {
                        if let Err(e) =
                            self.store.set_user_source(&user.username, &location.rel_path())
                        {
                            report.failures.push(FailureEntry::new(&user.username, e));
                            return;
                        }
                    }
                    report.healed_users.push(user.username.clone());
                    return;
                }
            }
            Err(ReadError::NotFound(_)) | Err(ReadError::MemberMissing { .. }) => {}
            Err(e) => {
                report.failures.push(FailureEntry::new(location.rel_path(), e));
                return;
            }
        }

        if !self.dry_run {
            let line = rollup_registration_line(&registration);
            if let Err(e) = self.append_rollup_routed(&location, registered_at.date(), &line) {
                report.failures.push(FailureEntry::new(location.rel_path(), e));
                return;
            }
            if let Err(e) = self.store.set_user_source(&user.username, &location.rel_path()) {
                report.failures.push(FailureEntry::new(&user.username, e));
                return;
            }
        }
        report.healed_users.push(user.username.clone());
    }

    /// Heal one request row: rebuild the whole file when it is gone, or
    /// report an activity-count mismatch when it is present but incomplete
    fn heal_request(&self, request: &vigil_db::RequestRow, report: &mut HealReport) {
        let id = RequestId(request.request_no);
        let known = request.source_archive_path.as_deref().and_then(Location::parse);

        if let Some(location) = &known {
            match self.reader.read(location) {
                Ok(text) => {
                    self.verify_completeness(id, location, &text, report);
                    return;
                }
                Err(ReadError::NotFound(_)) | Err(ReadError::MemberMissing { .. }) => {}
                Err(e) => {
                    report.failures.push(FailureEntry::new(location.rel_path(), e));
                    return;
                }
            }
        }

        if let Err(e) = self.rebuild_request(request, report) {
            report.failures.push(FailureEntry::new(
                format!("request {}", request.request_no),
                e,
            ));
        }
    }

    fn rebuild_request(
        &self,
        request: &vigil_db::RequestRow,
        report: &mut HealReport,
    ) -> Result<(), EngineError> {
        let id = RequestId(request.request_no);
        let creation = request.to_creation();
        let activity: Vec<Activity> = self
            .store
            .activity_for(id)?
            .into_iter()
            .map(row_to_activity)
            .collect();

        let location = self.layout.request_location(id, request.submitted_at)?;
        if !self.dry_run {
            let text = render_request_file(&creation, &activity);
            match self.reader.resolve(&location) {
                // A retired period takes the rebuilt file as a new member
                Resolved::Retired { bundle, member } => {
                    self.bundles.add_member(&bundle, &member, &text)?
                }
                _ => self.writer.create(&self.layout.plain_path(&location), &text)?,
            }
            self.store.set_request_source(id, &location.rel_path())?;
        }
        report.healed_requests.push(request.request_no);
        Ok(())
    }

    /// Compare database activity count against parseable archive lines
    fn verify_completeness(
        &self,
        id: RequestId,
        location: &Location,
        text: &str,
        report: &mut HealReport,
    ) {
        let rel = location.rel_path();
        let archive_activity = match parse_request_file(&rel, text) {
            Ok(parsed) => parsed.activity.len() as u64,
            Err(e) => {
                report.failures.push(FailureEntry::new(&rel, e));
                return;
            }
        };
        let db_activity = match self.store.activity_for(id) {
            Ok(rows) => rows.len() as u64,
            Err(e) => {
                report.failures.push(FailureEntry::new(&rel, e));
                return;
            }
        };
        if db_activity != archive_activity {
            report.incomplete.push(IncompleteEntry {
                path: rel,
                db_activity,
                archive_activity,
            });
        }
    }

    fn append_rollup_routed(
        &self,
        location: &Location,
        date: chrono::NaiveDate,
        line: &str,
    ) -> Result<(), EngineError> {
        match self.reader.resolve(location) {
            Resolved::Retired { bundle, member } => {
                self.bundles
                    .append_rollup_to_member(&bundle, &member, date, line)?
            }
            Resolved::Active(path) => self.writer.append_rollup(&path, date, line)?,
            Resolved::Absent => {
                self.writer
                    .append_rollup(&self.layout.plain_path(location), date, line)?
            }
        }
        Ok(())
    }
}

fn row_to_activity(row: ActivityRow) -> Activity {
    match row {
        ActivityRow::Interaction(r) => Activity::Interaction(r.to_interaction()),
        ActivityRow::Status(r) => Activity::StatusChange(r.to_status_change()),
        ActivityRow::Testimony(r) => Activity::Testimony(r.to_testimony()),
    }
}

#[cfg(test)]
#[path = "heal_tests.rs"]
mod tests;
