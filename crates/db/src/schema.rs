// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Versioned baseline schema
//!
//! Every archived table carries a nullable `source_archive_path`; tables
//! without that column are excluded from healer/validator coverage by design.

use rusqlite::Connection;

use crate::error::DbError;

pub const SCHEMA_VERSION: i32 = 1;

const BASELINE: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT,
    registered_at TEXT,
    source_archive_path TEXT
);

CREATE TABLE IF NOT EXISTS requests (
    id INTEGER PRIMARY KEY,
    request_no INTEGER NOT NULL UNIQUE,
    author_id INTEGER NOT NULL REFERENCES users(id),
    body TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'open',
    tags TEXT NOT NULL DEFAULT '',
    submitted_at TEXT NOT NULL,
    source_archive_path TEXT
);

CREATE TABLE IF NOT EXISTS interactions (
    id INTEGER PRIMARY KEY,
    request_no INTEGER NOT NULL,
    actor_id INTEGER NOT NULL REFERENCES users(id),
    occurred_at TEXT NOT NULL,
    source_archive_path TEXT,
    UNIQUE(request_no, actor_id, occurred_at)
);

CREATE TABLE IF NOT EXISTS status_changes (
    id INTEGER PRIMARY KEY,
    request_no INTEGER NOT NULL,
    actor_id INTEGER NOT NULL REFERENCES users(id),
    new_status TEXT NOT NULL,
    occurred_at TEXT NOT NULL,
    source_archive_path TEXT,
    UNIQUE(request_no, new_status, occurred_at)
);

CREATE TABLE IF NOT EXISTS testimonies (
    id INTEGER PRIMARY KEY,
    request_no INTEGER NOT NULL,
    author_id INTEGER NOT NULL REFERENCES users(id),
    body TEXT NOT NULL,
    occurred_at TEXT NOT NULL,
    source_archive_path TEXT,
    UNIQUE(request_no, author_id, occurred_at)
);
";

/// Apply pragmas and the baseline schema to a fresh or existing database
pub fn migrate(conn: &Connection) -> Result<(), DbError> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    let found: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    match found {
        0 => {
            conn.execute_batch(BASELINE)?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            Ok(())
        }
        v if v == SCHEMA_VERSION => Ok(()),
        v => Err(DbError::SchemaVersion {
            found: v,
            expected: SCHEMA_VERSION,
        }),
    }
}
