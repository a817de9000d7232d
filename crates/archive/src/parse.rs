// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsing archive text into structured records
//!
//! Two format families: per-event request files (preamble + body + activity
//! section) and monthly rollup files (date headers + timestamped lines).
//! Preamble patterns are tried in fixed priority order: current ("v2") first,
//! then the legacy author-based convention ("v1"). Content that matches no
//! pattern is preserved as opaque text rather than failing the file; only a
//! preamble that matches no convention is a parse error.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use vigil_core::{
    Creation, Interaction, Registration, RequestId, StatusChange, Testimony, STATUS_REMOVED,
    TIMESTAMP_FORMAT,
};

use crate::error::ParseError;

// Allow expect here as the regexes are compile-time verified to be valid
#[allow(clippy::expect_used)]
static PREAMBLE_V2: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Request #(\d+)$").expect("constant regex pattern is valid")
});
#[allow(clippy::expect_used)]
static PREAMBLE_V1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Prayer #(\d+)$").expect("constant regex pattern is valid"));
#[allow(clippy::expect_used)]
static ACTIVITY_PRAYED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}) - (.+) prayed for this request$")
        .expect("constant regex pattern is valid")
});
#[allow(clippy::expect_used)]
static ACTIVITY_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}) - (.+) changed status to (.+)$")
        .expect("constant regex pattern is valid")
});
#[allow(clippy::expect_used)]
static ACTIVITY_TESTIMONY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}) - (.+?) shared a testimony: (.+)$")
        .expect("constant regex pattern is valid")
});
#[allow(clippy::expect_used)]
static ACTIVITY_REMOVED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}) - (.+) removed this request$")
        .expect("constant regex pattern is valid")
});
#[allow(clippy::expect_used)]
static ROLLUP_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][a-z]+) (\d{1,2}) (\d{4})$").expect("constant regex pattern is valid")
});
#[allow(clippy::expect_used)]
static ROLLUP_REGISTERED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2}:\d{2}) - (.+?) registered(?: \((.+)\))?$")
        .expect("constant regex pattern is valid")
});
#[allow(clippy::expect_used)]
static ROLLUP_PRAYED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2}:\d{2}) - (.+) prayed for request #(\d+)$")
        .expect("constant regex pattern is valid")
});
#[allow(clippy::expect_used)]
static ROLLUP_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2}:\d{2}) - (.+) changed status of request #(\d+) to (.+)$")
        .expect("constant regex pattern is valid")
});

/// One appended activity fact inside a request file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Activity {
    Interaction(Interaction),
    StatusChange(StatusChange),
    Testimony(Testimony),
}

impl Activity {
    pub fn occurred_at(&self) -> NaiveDateTime {
        match self {
            Activity::Interaction(i) => i.occurred_at,
            Activity::StatusChange(s) => s.occurred_at,
            Activity::Testimony(t) => t.occurred_at,
        }
    }
}

/// A parsed per-event request file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestFile {
    pub creation: Creation,
    pub activity: Vec<Activity>,
    /// Lines in the activity section that matched no pattern; kept verbatim
    pub opaque: Vec<String>,
}

/// A recognized rollup entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RollupEntry {
    Registration(Registration),
    Interaction(Interaction),
    StatusChange(StatusChange),
}

/// One date section of a rollup file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateSection {
    pub date: NaiveDate,
    pub entries: Vec<RollupEntry>,
    pub opaque: Vec<String>,
}

/// A parsed rollup file
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct RollupFile {
    pub sections: Vec<DateSection>,
    /// Lines appearing before the first date header
    pub opaque: Vec<String>,
}

impl RollupFile {
    /// True if the file already carries a section for this date
    pub fn has_date(&self, date: NaiveDate) -> bool {
        self.sections.iter().any(|s| s.date == date)
    }
}

/// Parse a per-event request file. `path` labels errors only.
pub fn parse_request_file(path: &str, text: &str) -> Result<RequestFile, ParseError> {
    let mut lines = text.lines();

    let first = lines.next().unwrap_or("").trim();
    let id = match PREAMBLE_V2.captures(first).or_else(|| PREAMBLE_V1.captures(first)) {
        Some(caps) => RequestId(parse_number(path, &caps[1])?),
        None => {
            return Err(ParseError::UnrecognizedPreamble {
                path: path.to_string(),
            })
        }
    };

    let mut author = None;
    let mut submitted = None;
    let mut tags = Vec::new();
    for line in lines.by_ref() {
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix("From: ").or_else(|| line.strip_prefix("Author: ")) {
            author = Some(value.trim().to_string());
        } else if let Some(value) = line
            .strip_prefix("Date: ")
            .or_else(|| line.strip_prefix("Submitted: "))
        {
            submitted = Some(parse_timestamp(path, value.trim())?);
        } else if let Some(value) = line.strip_prefix("Tags: ") {
            tags = value.split(',').map(|t| t.trim().to_string()).collect();
        }
        // Unknown preamble labels are ignored, not fatal
    }

    let (Some(author), Some(submitted_at)) = (author, submitted) else {
        return Err(ParseError::UnrecognizedPreamble {
            path: path.to_string(),
        });
    };

    // Body runs until the Activity: label
    let mut body_lines = Vec::new();
    let mut saw_activity_label = false;
    for line in lines.by_ref() {
        if line.trim() == "Activity:" {
            saw_activity_label = true;
            break;
        }
        body_lines.push(line);
    }
    while body_lines.last().is_some_and(|l| l.trim().is_empty()) {
        body_lines.pop();
    }
    let body = body_lines.join("\n");

    let mut activity = Vec::new();
    let mut opaque = Vec::new();
    if saw_activity_label {
        for line in lines {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            match parse_activity_line(id, line) {
                Some(entry) => activity.push(entry),
                None => opaque.push(line.to_string()),
            }
        }
    }

    Ok(RequestFile {
        creation: Creation {
            id,
            author,
            submitted_at,
            tags,
            body,
        },
        activity,
        opaque,
    })
}

/// Try each activity pattern in priority order
fn parse_activity_line(request: RequestId, line: &str) -> Option<Activity> {
    if let Some(caps) = ACTIVITY_PRAYED.captures(line) {
        let occurred_at = timestamp(&caps[1])?;
        return Some(Activity::Interaction(Interaction {
            request,
            actor: caps[2].to_string(),
            occurred_at,
        }));
    }
    if let Some(caps) = ACTIVITY_REMOVED.captures(line) {
        let occurred_at = timestamp(&caps[1])?;
        return Some(Activity::StatusChange(StatusChange {
            request,
            actor: caps[2].to_string(),
            new_status: STATUS_REMOVED.to_string(),
            occurred_at,
        }));
    }
    if let Some(caps) = ACTIVITY_TESTIMONY.captures(line) {
        let occurred_at = timestamp(&caps[1])?;
        return Some(Activity::Testimony(Testimony {
            request,
            author: caps[2].to_string(),
            text: caps[3].to_string(),
            occurred_at,
        }));
    }
    if let Some(caps) = ACTIVITY_STATUS.captures(line) {
        let occurred_at = timestamp(&caps[1])?;
        return Some(Activity::StatusChange(StatusChange {
            request,
            actor: caps[2].to_string(),
            new_status: caps[3].to_string(),
            occurred_at,
        }));
    }
    None
}

/// Parse a monthly rollup file. Lines that match no pattern (including
/// malformed date headers) are preserved as opaque.
pub fn parse_rollup_file(_path: &str, text: &str) -> Result<RollupFile, ParseError> {
    let mut file = RollupFile::default();
    let mut current: Option<DateSection> = None;

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        if let Some(date) = parse_date_header(line) {
            if let Some(section) = current.take() {
                file.sections.push(section);
            }
            current = Some(DateSection {
                date,
                entries: Vec::new(),
                opaque: Vec::new(),
            });
            continue;
        }

        match current.as_mut() {
            Some(section) => match parse_rollup_entry(section.date, line) {
                Some(entry) => section.entries.push(entry),
                None => section.opaque.push(line.to_string()),
            },
            None => file.opaque.push(line.to_string()),
        }
    }
    if let Some(section) = current.take() {
        file.sections.push(section);
    }
    Ok(file)
}

fn parse_date_header(line: &str) -> Option<NaiveDate> {
    ROLLUP_HEADER.captures(line)?;
    NaiveDate::parse_from_str(line, "%B %d %Y").ok()
}

fn parse_rollup_entry(date: NaiveDate, line: &str) -> Option<RollupEntry> {
    if let Some(caps) = ROLLUP_PRAYED.captures(line) {
        return Some(RollupEntry::Interaction(Interaction {
            request: RequestId(caps[3].parse().ok()?),
            actor: caps[2].to_string(),
            occurred_at: date.and_time(time_of_day(&caps[1])?),
        }));
    }
    if let Some(caps) = ROLLUP_STATUS.captures(line) {
        return Some(RollupEntry::StatusChange(StatusChange {
            request: RequestId(caps[3].parse().ok()?),
            actor: caps[2].to_string(),
            new_status: caps[4].to_string(),
            occurred_at: date.and_time(time_of_day(&caps[1])?),
        }));
    }
    if let Some(caps) = ROLLUP_REGISTERED.captures(line) {
        return Some(RollupEntry::Registration(Registration {
            username: caps[2].to_string(),
            email: caps.get(3).map(|m| m.as_str().to_string()),
            registered_at: date.and_time(time_of_day(&caps[1])?),
        }));
    }
    None
}

fn time_of_day(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

fn timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

fn parse_timestamp(path: &str, s: &str) -> Result<NaiveDateTime, ParseError> {
    timestamp(s).ok_or_else(|| ParseError::BadTimestamp {
        path: path.to_string(),
        line: s.to_string(),
    })
}

fn parse_number(path: &str, s: &str) -> Result<u64, ParseError> {
    s.parse().map_err(|_| ParseError::BadTimestamp {
        path: path.to_string(),
        line: s.to_string(),
    })
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
