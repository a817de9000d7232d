// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Archive taxonomy and period (year-month) granularity

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Storage taxonomy: which shape of archive a record lives in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveKind {
    /// One file per prayer request
    Request,
    /// Monthly rollup of registrations
    Registration,
    /// Monthly rollup mirror of prayer marks
    InteractionLog,
    /// Monthly rollup mirror of status changes
    StatusLog,
}

impl ArchiveKind {
    pub const ALL: [ArchiveKind; 4] = [
        ArchiveKind::Request,
        ArchiveKind::Registration,
        ArchiveKind::InteractionLog,
        ArchiveKind::StatusLog,
    ];

    /// Directory name under the archive root
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArchiveKind::Request => "requests",
            ArchiveKind::Registration => "registrations",
            ArchiveKind::InteractionLog => "interactions",
            ArchiveKind::StatusLog => "status",
        }
    }

    /// Rollup kinds aggregate a whole month into one file; requests get one
    /// file per event.
    pub fn is_rollup(&self) -> bool {
        !matches!(self, ArchiveKind::Request)
    }
}

impl std::fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// Year-month granularity for rollups and compression bundles
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn of(ts: NaiveDateTime) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }

    pub fn of_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Canonical label, `YYYY_MM`. Lexicographic order matches time order.
    pub fn label(&self) -> String {
        format!("{:04}_{:02}", self.year, self.month)
    }

    /// Parse a `YYYY_MM` label back into a period
    pub fn parse_label(label: &str) -> Option<Self> {
        let (year, month) = label.split_once('_')?;
        let year: i32 = year.parse().ok()?;
        let month: u32 = month.parse().ok()?;
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Last calendar day of the period; a period is closed once this day is
    /// in the past.
    pub fn last_day(&self) -> NaiveDate {
        let (ny, nm) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(ny, nm, 1)
            .map(|d| d - chrono::Duration::days(1))
            .unwrap_or(NaiveDate::MAX)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
#[path = "period_tests.rs"]
mod tests;
