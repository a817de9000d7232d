// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain records and their natural keys
//!
//! Every archived fact is one of a closed set of record variants. The natural
//! key is the business-meaningful identity used for deduplication across the
//! archive and the database cache; the content digest detects two records that
//! share a key but disagree on material content.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Timestamp format used throughout the archive: minute precision, no zone.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Status a request carries after domain deletion. Removal is an appended
/// status change, never an erasure.
pub const STATUS_REMOVED: &str = "removed";

/// Truncate a timestamp to the archive's native minute precision.
pub fn minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Public request number (rendered `#142`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Record variant tags, used for report grouping
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    Registration,
    Creation,
    Interaction,
    StatusChange,
    Testimony,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Registration,
        RecordKind::Creation,
        RecordKind::Interaction,
        RecordKind::StatusChange,
        RecordKind::Testimony,
    ];
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordKind::Registration => "registration",
            RecordKind::Creation => "creation",
            RecordKind::Interaction => "interaction",
            RecordKind::StatusChange => "status-change",
            RecordKind::Testimony => "testimony",
        };
        write!(f, "{}", name)
    }
}

/// A user registration event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: Option<String>,
    pub registered_at: NaiveDateTime,
}

/// Creation of a prayer request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creation {
    pub id: RequestId,
    pub author: String,
    pub submitted_at: NaiveDateTime,
    pub tags: Vec<String>,
    pub body: String,
}

/// A prayer mark ("X prayed for this request")
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub request: RequestId,
    pub actor: String,
    pub occurred_at: NaiveDateTime,
}

/// A status transition on a request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub request: RequestId,
    pub actor: String,
    pub new_status: String,
    pub occurred_at: NaiveDateTime,
}

/// A testimony shared against a request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimony {
    pub request: RequestId,
    pub author: String,
    pub text: String,
    pub occurred_at: NaiveDateTime,
}

/// Closed tagged union over all archived record shapes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Record {
    Registration(Registration),
    Creation(Creation),
    Interaction(Interaction),
    StatusChange(StatusChange),
    Testimony(Testimony),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Registration(_) => RecordKind::Registration,
            Record::Creation(_) => RecordKind::Creation,
            Record::Interaction(_) => RecordKind::Interaction,
            Record::StatusChange(_) => RecordKind::StatusChange,
            Record::Testimony(_) => RecordKind::Testimony,
        }
    }

    /// Natural key for deduplication. Timestamps participate at minute
    /// precision, matching what the archive text can represent.
    pub fn natural_key(&self) -> NaturalKey {
        let key = match self {
            Record::Registration(r) => format!("user/{}", r.username),
            Record::Creation(c) => format!("request/{}/{}", c.id.0, c.author),
            Record::Interaction(i) => format!(
                "prayer/{}/{}/{}",
                i.request.0,
                i.actor,
                minute(i.occurred_at).format(TIMESTAMP_FORMAT)
            ),
            Record::StatusChange(s) => format!(
                "status/{}/{}/{}",
                s.request.0,
                s.new_status,
                minute(s.occurred_at).format(TIMESTAMP_FORMAT)
            ),
            Record::Testimony(t) => format!(
                "testimony/{}/{}/{}",
                t.request.0,
                t.author,
                minute(t.occurred_at).format(TIMESTAMP_FORMAT)
            ),
        };
        NaturalKey(key)
    }

    /// Digest over the material content not already covered by the natural
    /// key. Two records with equal keys and unequal digests are a conflict.
    pub fn content_digest(&self) -> String {
        let mut hasher = Sha256::new();
        match self {
            Record::Registration(r) => {
                hasher.update(b"registration\n");
                hasher.update(r.email.as_deref().unwrap_or("").as_bytes());
                hasher.update(b"\n");
                hasher.update(
                    minute(r.registered_at)
                        .format(TIMESTAMP_FORMAT)
                        .to_string()
                        .as_bytes(),
                );
            }
            Record::Creation(c) => {
                hasher.update(b"creation\n");
                hasher.update(
                    minute(c.submitted_at)
                        .format(TIMESTAMP_FORMAT)
                        .to_string()
                        .as_bytes(),
                );
                hasher.update(b"\n");
                hasher.update(c.tags.join(",").as_bytes());
                hasher.update(b"\n");
                hasher.update(c.body.as_bytes());
            }
            Record::Interaction(i) => {
                hasher.update(b"interaction\n");
                hasher.update(i.actor.as_bytes());
            }
            Record::StatusChange(s) => {
                hasher.update(b"status-change\n");
                hasher.update(s.actor.as_bytes());
            }
            Record::Testimony(t) => {
                hasher.update(b"testimony\n");
                hasher.update(t.text.as_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Business-meaningful identity of a record, as a canonical string
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NaturalKey(String);

impl NaturalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
