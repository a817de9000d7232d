// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The live write path
//!
//! Every domain event is appended to the archive first; only when that append
//! succeeds is the database row written, carrying the resulting archive path.
//! A failed archive write aborts the whole operation and no row is created.
//! Appends route through the file lifecycle: a retired period is reached via
//! the compressed-member path, a plain file in place.

use chrono::NaiveDate;
use tracing::info;
use vigil_archive::{
    interaction_line, render_request_file, rollup_interaction_line, rollup_registration_line,
    rollup_status_line, status_line, testimony_line, ArchiveReader, ArchiveWriter,
    CompressionManager, Layout, Location, ReadError, Resolved,
};
use vigil_core::{
    minute, ArchiveKind, Clock, Creation, EngineConfig, Interaction, Period, Record, Registration,
    RequestId, StatusChange, Testimony, STATUS_REMOVED,
};
use vigil_db::{Store, Upsert};

use crate::error::EngineError;

/// Archive-first writer for live domain events
#[derive(Clone)]
pub struct Recorder<C: Clock> {
    layout: Layout,
    writer: ArchiveWriter,
    reader: ArchiveReader,
    bundles: CompressionManager,
    clock: C,
}

impl<C: Clock> Recorder<C> {
    pub fn new(config: &EngineConfig, clock: C) -> Self {
        let layout = Layout::new(&config.archive_root);
        Self {
            writer: ArchiveWriter::new(layout.clone(), config.lock_timeout),
            reader: ArchiveReader::new(layout.clone(), config.lock_timeout),
            bundles: CompressionManager::new(layout.clone(), config.lock_timeout),
            layout,
            clock,
        }
    }

    /// Record a user registration in the monthly registration rollup
    pub fn record_registration(
        &self,
        store: &Store,
        username: &str,
        email: Option<&str>,
    ) -> Result<Upsert, EngineError> {
        let now = minute(self.clock.now());
        let registration = Registration {
            username: username.to_string(),
            email: email.map(String::from),
            registered_at: now,
        };
        let location = Location::rollup(ArchiveKind::Registration, Period::of(now));
        self.append_rollup_routed(&location, now.date(), &rollup_registration_line(&registration))?;
        info!(username, archive = %location, "registration archived");
        Ok(store.upsert(
            &Record::Registration(registration),
            Some(&location.rel_path()),
        )?)
    }

    /// Create a new prayer request: its own archive file, then the row
    pub fn record_request(
        &self,
        store: &Store,
        author: &str,
        body: &str,
        tags: &[String],
    ) -> Result<RequestId, EngineError> {
        let now = minute(self.clock.now());
        let id = RequestId(store.next_request_no()?);
        let creation = Creation {
            id,
            author: author.to_string(),
            submitted_at: now,
            tags: tags.to_vec(),
            body: body.to_string(),
        };
        let location = self.layout.request_location(id, now)?;
        self.writer.create(
            &self.layout.plain_path(&location),
            &render_request_file(&creation, &[]),
        )?;
        info!(request = %id, archive = %location, "request archived");
        store.upsert(&Record::Creation(creation), Some(&location.rel_path()))?;
        Ok(id)
    }

    /// Record a prayer mark: canonical line in the request's file, mirror
    /// line in the monthly interaction log
    pub fn record_interaction(
        &self,
        store: &Store,
        request: RequestId,
        actor: &str,
    ) -> Result<Upsert, EngineError> {
        let now = minute(self.clock.now());
        let interaction = Interaction {
            request,
            actor: actor.to_string(),
            occurred_at: now,
        };
        let location = self.request_file_location(store, request)?;
        self.append_line_routed(&location, &interaction_line(&interaction))?;

        let mirror = Location::rollup(ArchiveKind::InteractionLog, Period::of(now));
        self.append_rollup_routed(&mirror, now.date(), &rollup_interaction_line(&interaction))?;

        Ok(store.upsert(
            &Record::Interaction(interaction),
            Some(&location.rel_path()),
        )?)
    }

    /// Record a status change; also updates the request's cached status
    pub fn record_status_change(
        &self,
        store: &Store,
        request: RequestId,
        actor: &str,
        new_status: &str,
    ) -> Result<Upsert, EngineError> {
        let now = minute(self.clock.now());
        let change = StatusChange {
            request,
            actor: actor.to_string(),
            new_status: new_status.to_string(),
            occurred_at: now,
        };
        let location = self.request_file_location(store, request)?;
        self.append_line_routed(&location, &status_line(&change))?;

        let mirror = Location::rollup(ArchiveKind::StatusLog, Period::of(now));
        self.append_rollup_routed(&mirror, now.date(), &rollup_status_line(&change))?;

        let outcome = store.upsert(&Record::StatusChange(change), Some(&location.rel_path()))?;
        if outcome == Upsert::Inserted {
            store.apply_status(request, new_status)?;
        }
        Ok(outcome)
    }

    /// Record a testimony against a request
    pub fn record_testimony(
        &self,
        store: &Store,
        request: RequestId,
        author: &str,
        text: &str,
    ) -> Result<Upsert, EngineError> {
        let now = minute(self.clock.now());
        let testimony = Testimony {
            request,
            author: author.to_string(),
            text: text.to_string(),
            occurred_at: now,
        };
        let location = self.request_file_location(store, request)?;
        self.append_line_routed(&location, &testimony_line(&testimony))?;
        Ok(store.upsert(&Record::Testimony(testimony), Some(&location.rel_path()))?)
    }

    /// Domain deletion: a `removed` status change appended for audit, plus a
    /// soft delete in the cache. Nothing is erased from the archive.
    pub fn remove_request(
        &self,
        store: &Store,
        request: RequestId,
        actor: &str,
    ) -> Result<Upsert, EngineError> {
        self.record_status_change(store, request, actor, STATUS_REMOVED)
    }

    /// The archive location backing a request row
    fn request_file_location(
        &self,
        store: &Store,
        request: RequestId,
    ) -> Result<Location, EngineError> {
        let row = store
            .request(request)?
            .ok_or_else(|| ReadError::NotFound(format!("request {}", request).into()))?;
        row.source_archive_path
            .as_deref()
            .and_then(Location::parse)
            .ok_or_else(|| {
                EngineError::Read(ReadError::NotFound(
                    format!("request {} has no archive path", request).into(),
                ))
            })
    }

    /// Append a raw activity line to a request file, honoring its lifecycle
    /// state
    fn append_line_routed(&self, location: &Location, line: &str) -> Result<(), EngineError> {
        let text = format!("{}\n", line);
        match self.reader.resolve(location) {
            Resolved::Active(path) => self.writer.append(&path, &text)?,
            Resolved::Retired { bundle, member } => {
                self.bundles.append_to_member(&bundle, &member, &text)?
            }
            Resolved::Absent => {
                return Err(ReadError::NotFound(self.layout.plain_path(location)).into())
            }
        }
        Ok(())
    }

    /// Append a rollup entry, honoring lifecycle state; an absent rollup is
    /// created as a plain file
    fn append_rollup_routed(
        &self,
        location: &Location,
        date: NaiveDate,
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

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;
