// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering records into archive text
//!
//! The renderer emits only the current ("v2") convention; the parser accepts
//! both current and legacy text. `parse.rs` is the other half of this pair
//! and its patterns must stay in sync with these formats.

use chrono::NaiveDate;
use vigil_core::{
    minute, Creation, Interaction, Registration, StatusChange, Testimony, STATUS_REMOVED,
    TIMESTAMP_FORMAT,
};

use crate::parse::Activity;

/// Rollup date-section header, e.g. `June 1 2024`
pub fn date_header(date: NaiveDate) -> String {
    date.format("%B %-d %Y").to_string()
}

/// Activity line inside a request file for a prayer mark
pub fn interaction_line(i: &Interaction) -> String {
    format!(
        "{} - {} prayed for this request",
        minute(i.occurred_at).format(TIMESTAMP_FORMAT),
        i.actor
    )
}

/// Activity line inside a request file for a status change. Removal has its
/// own phrasing.
pub fn status_line(s: &StatusChange) -> String {
    let ts = minute(s.occurred_at).format(TIMESTAMP_FORMAT);
    if s.new_status == STATUS_REMOVED {
        format!("{} - {} removed this request", ts, s.actor)
    } else {
        format!("{} - {} changed status to {}", ts, s.actor, s.new_status)
    }
}

/// Activity line inside a request file for a testimony (single line)
pub fn testimony_line(t: &Testimony) -> String {
    format!(
        "{} - {} shared a testimony: {}",
        minute(t.occurred_at).format(TIMESTAMP_FORMAT),
        t.author,
        t.text.replace('\n', " ")
    )
}

/// Rollup entry for a registration
pub fn rollup_registration_line(r: &Registration) -> String {
    let time = minute(r.registered_at).format("%H:%M");
    match &r.email {
        Some(email) => format!("{} - {} registered ({})", time, r.username, email),
        None => format!("{} - {} registered", time, r.username),
    }
}

/// Rollup mirror entry for a prayer mark
pub fn rollup_interaction_line(i: &Interaction) -> String {
    format!(
        "{} - {} prayed for request #{}",
        minute(i.occurred_at).format("%H:%M"),
        i.actor,
        i.request.0
    )
}

/// Rollup mirror entry for a status change
pub fn rollup_status_line(s: &StatusChange) -> String {
    format!(
        "{} - {} changed status of request #{} to {}",
        minute(s.occurred_at).format("%H:%M"),
        s.actor,
        s.request.0,
        s.new_status
    )
}

/// Render a complete request file: preamble, body, and activity section.
/// Used on first creation and by the healer when rebuilding a lost file.
pub fn render_request_file(creation: &Creation, activity: &[Activity]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Request #{}\n", creation.id.0));
    out.push_str(&format!("From: {}\n", creation.author));
    out.push_str(&format!(
        "Date: {}\n",
        minute(creation.submitted_at).format(TIMESTAMP_FORMAT)
    ));
    if !creation.tags.is_empty() {
        out.push_str(&format!("Tags: {}\n", creation.tags.join(", ")));
    }
    out.push('\n');
    let body = creation.body.trim_end();
    if !body.is_empty() {
        out.push_str(body);
        out.push('\n');
    }
    out.push_str("\nActivity:\n");
    for entry in activity {
        out.push_str(&activity_line(entry));
        out.push('\n');
    }
    out
}

/// Canonical line for any activity variant
pub fn activity_line(activity: &Activity) -> String {
    match activity {
        Activity::Interaction(i) => interaction_line(i),
        Activity::StatusChange(s) => status_line(s),
        Activity::Testimony(t) => testimony_line(t),
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
