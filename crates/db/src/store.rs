// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Natural-key upserts and read queries
//!
//! All writes are check-then-insert on the record's natural key, so importing
//! the same archive twice changes nothing. A key match with different
//! material content is surfaced as `Upsert::Conflict` and never resolved
//! automatically. Foreign-key dependents resolve users by username, creating
//! a minimal placeholder row when the referenced user is not yet imported.

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;
use vigil_core::{
    minute, Creation, Interaction, NaturalKey, Record, Registration, RequestId, StatusChange,
    Testimony, TIMESTAMP_FORMAT,
};

use crate::error::DbError;
use crate::schema;

/// Outcome of one natural-key upsert
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Upsert {
    /// No row carried this natural key; a row was (or would be) inserted
    Inserted,
    /// An identical row already exists; nothing was mutated
    Skipped,
    /// A row with this key exists but its material content differs
    Conflict {
        key: NaturalKey,
        existing_digest: String,
        incoming_digest: String,
    },
}

/// A user row; `registered_at` is null for placeholder rows created to
/// satisfy foreign keys before the registration itself was imported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub registered_at: Option<NaiveDateTime>,
    pub source_archive_path: Option<String>,
}

impl UserRow {
    pub fn is_placeholder(&self) -> bool {
        self.registered_at.is_none()
    }

    pub fn to_record(&self) -> Option<Record> {
        Some(Record::Registration(Registration {
            username: self.username.clone(),
            email: self.email.clone(),
            registered_at: self.registered_at?,
        }))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestRow {
    pub id: i64,
    pub request_no: u64,
    pub author: String,
    pub body: String,
    pub status: String,
    pub tags: Vec<String>,
    pub submitted_at: NaiveDateTime,
    pub source_archive_path: Option<String>,
}

impl RequestRow {
    pub fn to_creation(&self) -> Creation {
        Creation {
            id: RequestId(self.request_no),
            author: self.author.clone(),
            submitted_at: self.submitted_at,
            tags: self.tags.clone(),
            body: self.body.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionRow {
    pub request_no: u64,
    pub actor: String,
    pub occurred_at: NaiveDateTime,
    pub source_archive_path: Option<String>,
}

impl InteractionRow {
    pub fn to_interaction(&self) -> Interaction {
        Interaction {
            request: RequestId(self.request_no),
            actor: self.actor.clone(),
            occurred_at: self.occurred_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusRow {
    pub request_no: u64,
    pub actor: String,
    pub new_status: String,
    pub occurred_at: NaiveDateTime,
    pub source_archive_path: Option<String>,
}

impl StatusRow {
    pub fn to_status_change(&self) -> StatusChange {
        StatusChange {
            request: RequestId(self.request_no),
            actor: self.actor.clone(),
            new_status: self.new_status.clone(),
            occurred_at: self.occurred_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestimonyRow {
    pub request_no: u64,
    pub author: String,
    pub body: String,
    pub occurred_at: NaiveDateTime,
    pub source_archive_path: Option<String>,
}

impl TestimonyRow {
    pub fn to_testimony(&self) -> Testimony {
        Testimony {
            request: RequestId(self.request_no),
            author: self.author.clone(),
            text: self.body.clone(),
            occurred_at: self.occurred_at,
        }
    }
}

/// One activity sub-record of a request, merged across the three tables
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivityRow {
    Interaction(InteractionRow),
    Status(StatusRow),
    Testimony(TestimonyRow),
}

impl ActivityRow {
    pub fn occurred_at(&self) -> NaiveDateTime {
        match self {
            ActivityRow::Interaction(r) => r.occurred_at,
            ActivityRow::Status(r) => r.occurred_at,
            ActivityRow::Testimony(r) => r.occurred_at,
        }
    }
}

/// What the natural-key check found, before deciding to write
enum Check {
    Absent,
    Placeholder { user_id: i64 },
    Present { existing: Record },
}

/// SQLite-backed query cache
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) and migrate the database at `path`
    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory store for tests
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Next unused public request number
    pub fn next_request_no(&self) -> Result<u64, DbError> {
        let no: i64 = self
            .conn
            .query_row("SELECT COALESCE(MAX(request_no), 0) + 1 FROM requests", [], |r| {
                r.get(0)
            })?;
        Ok(no as u64)
    }

    /// Resolve a user id by username, inserting a placeholder row when the
    /// user is not yet known. Placeholders keep imports order-independent.
    pub fn ensure_user(&self, username: &str) -> Result<i64, DbError> {
        if let Some(id) = self
            .conn
            .query_row("SELECT id FROM users WHERE username = ?1", [username], |r| r.get(0))
            .optional()?
        {
            return Ok(id);
        }
        self.conn
            .execute("INSERT INTO users (username) VALUES (?1)", [username])?;
        debug!(username, "placeholder user created");
        Ok(self.conn.last_insert_rowid())
    }

    /// Natural-key check-then-insert for any record kind. `source` is the
    /// root-relative archive path backing this row.
    pub fn upsert(&self, record: &Record, source: Option<&str>) -> Result<Upsert, DbError> {
        match self.check(record)? {
            Check::Absent => {
                self.insert(record, source)?;
                Ok(Upsert::Inserted)
            }
            Check::Placeholder { user_id } => {
                let Record::Registration(r) = record else {
                    // Only registrations can land on a placeholder
                    return Ok(Upsert::Skipped);
                };
                self.conn.execute(
                    "UPDATE users SET email = ?1, registered_at = ?2, source_archive_path = ?3
                     WHERE id = ?4",
                    params![r.email, ts_to_sql(r.registered_at), source, user_id],
                )?;
                Ok(Upsert::Inserted)
            }
            Check::Present { existing } => Ok(compare(record, &existing)),
        }
    }

    /// Same check as `upsert` without any write; `Inserted` means the record
    /// would be inserted. Used by dry-run imports.
    pub fn probe(&self, record: &Record) -> Result<Upsert, DbError> {
        match self.check(record)? {
            Check::Absent | Check::Placeholder { .. } => Ok(Upsert::Inserted),
            Check::Present { existing } => Ok(compare(record, &existing)),
        }
    }

    fn check(&self, record: &Record) -> Result<Check, DbError> {
        match record {
            Record::Registration(r) => {
                let row = self
                    .conn
                    .query_row(
                        "SELECT id, email, registered_at FROM users WHERE username = ?1",
                        [&r.username],
                        |row| {
                            Ok((
                                row.get::<_, i64>(0)?,
                                row.get::<_, Option<String>>(1)?,
                                row.get::<_, Option<String>>(2)?,
                            ))
                        },
                    )
                    .optional()?;
                Ok(match row {
                    None => Check::Absent,
                    Some((id, _, None)) => Check::Placeholder { user_id: id },
                    Some((_, email, Some(at))) => Check::Present {
                        existing: Record::Registration(Registration {
                            username: r.username.clone(),
                            email,
                            registered_at: ts_from_sql(&at)?,
                        }),
                    },
                })
            }
            Record::Creation(c) => {
                let row = self
                    .conn
                    .query_row(
                        "SELECT u.username, r.body, r.tags, r.submitted_at
                         FROM requests r JOIN users u ON u.id = r.author_id
                         WHERE r.request_no = ?1",
                        [c.id.0 as i64],
                        |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, String>(2)?,
                                row.get::<_, String>(3)?,
                            ))
                        },
                    )
                    .optional()?;
                Ok(match row {
                    None => Check::Absent,
                    Some((author, body, tags, at)) => Check::Present {
                        existing: Record::Creation(Creation {
                            id: c.id,
                            author,
                            submitted_at: ts_from_sql(&at)?,
                            tags: tags_from_sql(&tags),
                            body,
                        }),
                    },
                })
            }
            Record::Interaction(i) => {
                let row = self
                    .conn
                    .query_row(
                        "SELECT i.id FROM interactions i JOIN users u ON u.id = i.actor_id
                         WHERE i.request_no = ?1 AND u.username = ?2 AND i.occurred_at = ?3",
                        params![i.request.0 as i64, i.actor, ts_to_sql(i.occurred_at)],
                        |row| row.get::<_, i64>(0),
                    )
                    .optional()?;
                Ok(match row {
                    None => Check::Absent,
                    Some(_) => Check::Present {
                        existing: record.clone(),
                    },
                })
            }
            Record::StatusChange(s) => {
                let row = self
                    .conn
                    .query_row(
                        "SELECT u.username FROM status_changes s JOIN users u ON u.id = s.actor_id
                         WHERE s.request_no = ?1 AND s.new_status = ?2 AND s.occurred_at = ?3",
                        params![s.request.0 as i64, s.new_status, ts_to_sql(s.occurred_at)],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(match row {
                    None => Check::Absent,
                    Some(actor) => Check::Present {
                        existing: Record::StatusChange(StatusChange {
                            actor,
                            ..s.clone()
                        }),
                    },
                })
            }
            Record::Testimony(t) => {
                let row = self
                    .conn
                    .query_row(
                        "SELECT t.body FROM testimonies t JOIN users u ON u.id = t.author_id
                         WHERE t.request_no = ?1 AND u.username = ?2 AND t.occurred_at = ?3",
                        params![t.request.0 as i64, t.author, ts_to_sql(t.occurred_at)],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(match row {
                    None => Check::Absent,
                    Some(body) => Check::Present {
                        existing: Record::Testimony(Testimony {
                            text: body,
                            ..t.clone()
                        }),
                    },
                })
            }
        }
    }

    fn insert(&self, record: &Record, source: Option<&str>) -> Result<(), DbError> {
        match record {
            Record::Registration(r) => {
                self.conn.execute(
                    "INSERT INTO users (username, email, registered_at, source_archive_path)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![r.username, r.email, ts_to_sql(r.registered_at), source],
                )?;
            }
            Record::Creation(c) => {
                let author_id = self.ensure_user(&c.author)?;
                self.conn.execute(
                    "INSERT INTO requests
                     (request_no, author_id, body, status, tags, submitted_at, source_archive_path)
                     VALUES (?1, ?2, ?3, 'open', ?4, ?5, ?6)",
                    params![
                        c.id.0 as i64,
                        author_id,
                        c.body,
                        tags_to_sql(&c.tags),
                        ts_to_sql(c.submitted_at),
                        source
                    ],
                )?;
            }
            Record::Interaction(i) => {
                let actor_id = self.ensure_user(&i.actor)?;
                self.conn.execute(
                    "INSERT INTO interactions (request_no, actor_id, occurred_at, source_archive_path)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![i.request.0 as i64, actor_id, ts_to_sql(i.occurred_at), source],
                )?;
            }
            Record::StatusChange(s) => {
                let actor_id = self.ensure_user(&s.actor)?;
                self.conn.execute(
                    "INSERT INTO status_changes
                     (request_no, actor_id, new_status, occurred_at, source_archive_path)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        s.request.0 as i64,
                        actor_id,
                        s.new_status,
                        ts_to_sql(s.occurred_at),
                        source
                    ],
                )?;
            }
            Record::Testimony(t) => {
                let author_id = self.ensure_user(&t.author)?;
                self.conn.execute(
                    "INSERT INTO testimonies
                     (request_no, author_id, body, occurred_at, source_archive_path)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        t.request.0 as i64,
                        author_id,
                        t.text,
                        ts_to_sql(t.occurred_at),
                        source
                    ],
                )?;
            }
        }
        Ok(())
    }

    /// Update a request's current status column (derived cache of the latest
    /// status change)
    pub fn apply_status(&self, request_no: RequestId, new_status: &str) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE requests SET status = ?1 WHERE request_no = ?2",
            params![new_status, request_no.0 as i64],
        )?;
        Ok(())
    }

    pub fn set_user_source(&self, username: &str, source: &str) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE users SET source_archive_path = ?1 WHERE username = ?2",
            params![source, username],
        )?;
        Ok(())
    }

    pub fn set_request_source(&self, request_no: RequestId, source: &str) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE requests SET source_archive_path = ?1 WHERE request_no = ?2",
            params![source, request_no.0 as i64],
        )?;
        Ok(())
    }

    pub fn users(&self) -> Result<Vec<UserRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, email, registered_at, source_archive_path
             FROM users ORDER BY username",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;
        let mut users = Vec::new();
        for row in rows {
            let (id, username, email, registered_at, source) = row?;
            users.push(UserRow {
                id,
                username,
                email,
                registered_at: registered_at.as_deref().map(ts_from_sql).transpose()?,
                source_archive_path: source,
            });
        }
        Ok(users)
    }

    /// Look up one request by its public number
    pub fn request(&self, request_no: RequestId) -> Result<Option<RequestRow>, DbError> {
        Ok(self
            .requests()?
            .into_iter()
            .find(|r| r.request_no == request_no.0))
    }

    pub fn requests(&self) -> Result<Vec<RequestRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.request_no, u.username, r.body, r.status, r.tags, r.submitted_at,
                    r.source_archive_path
             FROM requests r JOIN users u ON u.id = r.author_id
             ORDER BY r.request_no",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?;
        let mut requests = Vec::new();
        for row in rows {
            let (id, request_no, author, body, status, tags, submitted_at, source) = row?;
            requests.push(RequestRow {
                id,
                request_no: request_no as u64,
                author,
                body,
                status,
                tags: tags_from_sql(&tags),
                submitted_at: ts_from_sql(&submitted_at)?,
                source_archive_path: source,
            });
        }
        Ok(requests)
    }

    pub fn interactions(&self) -> Result<Vec<InteractionRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT i.request_no, u.username, i.occurred_at, i.source_archive_path
             FROM interactions i JOIN users u ON u.id = i.actor_id
             ORDER BY i.occurred_at",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (request_no, actor, occurred_at, source) = row?;
            out.push(InteractionRow {
                request_no: request_no as u64,
                actor,
                occurred_at: ts_from_sql(&occurred_at)?,
                source_archive_path: source,
            });
        }
        Ok(out)
    }

    pub fn status_changes(&self) -> Result<Vec<StatusRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT s.request_no, u.username, s.new_status, s.occurred_at, s.source_archive_path
             FROM status_changes s JOIN users u ON u.id = s.actor_id
             ORDER BY s.occurred_at",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (request_no, actor, new_status, occurred_at, source) = row?;
            out.push(StatusRow {
                request_no: request_no as u64,
                actor,
                new_status,
                occurred_at: ts_from_sql(&occurred_at)?,
                source_archive_path: source,
            });
        }
        Ok(out)
    }

    pub fn testimonies(&self) -> Result<Vec<TestimonyRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT t.request_no, u.username, t.body, t.occurred_at, t.source_archive_path
             FROM testimonies t JOIN users u ON u.id = t.author_id
             ORDER BY t.occurred_at",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (request_no, author, body, occurred_at, source) = row?;
            out.push(TestimonyRow {
                request_no: request_no as u64,
                author,
                body,
                occurred_at: ts_from_sql(&occurred_at)?,
                source_archive_path: source,
            });
        }
        Ok(out)
    }

    /// All activity sub-records of one request, oldest first
    pub fn activity_for(&self, request_no: RequestId) -> Result<Vec<ActivityRow>, DbError> {
        let mut activity: Vec<ActivityRow> = Vec::new();
        for row in self.interactions()? {
            if row.request_no == request_no.0 {
                activity.push(ActivityRow::Interaction(row));
            }
        }
        for row in self.status_changes()? {
            if row.request_no == request_no.0 {
                activity.push(ActivityRow::Status(row));
            }
        }
        for row in self.testimonies()? {
            if row.request_no == request_no.0 {
                activity.push(ActivityRow::Testimony(row));
            }
        }
        activity.sort_by_key(ActivityRow::occurred_at);
        Ok(activity)
    }
}

/// `Conflict` when the key matches but the content digest differs
fn compare(incoming: &Record, existing: &Record) -> Upsert {
    let incoming_digest = incoming.content_digest();
    let existing_digest = existing.content_digest();
    if incoming.natural_key() == existing.natural_key() && incoming_digest == existing_digest {
        Upsert::Skipped
    } else {
        Upsert::Conflict {
            key: incoming.natural_key(),
            existing_digest,
            incoming_digest,
        }
    }
}

fn ts_to_sql(ts: NaiveDateTime) -> String {
    minute(ts).format(TIMESTAMP_FORMAT).to_string()
}

fn ts_from_sql(s: &str) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map_err(|_| {
        DbError::Sqlite(rusqlite::Error::InvalidColumnType(
            0,
            format!("bad timestamp {:?}", s),
            rusqlite::types::Type::Text,
        ))
    })
}

fn tags_to_sql(tags: &[String]) -> String {
    tags.join(",")
}

fn tags_from_sql(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
