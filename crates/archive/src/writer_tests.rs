// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

fn writer(root: &Path) -> ArchiveWriter {
    ArchiveWriter::new(Layout::new(root), Duration::from_secs(1))
}

fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

#[test]
fn create_writes_content_and_parents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("requests/2024/06/2024-06-01_0655.txt");

    writer(dir.path()).create(&path, "Request #1\n").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "Request #1\n");
}

#[test]
fn create_leaves_no_temp_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt");
    writer(dir.path()).create(&path, "hello\n").unwrap();

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n != ".locks")
        .collect();
    assert_eq!(names, vec!["a.txt"]);
}

#[test]
fn stray_truncated_temp_never_corrupts_committed_content() {
    // Simulates a crash mid-write: a half-written temp sibling is on disk
    // next to a previously committed file.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt");
    let w = writer(dir.path());
    w.create(&path, "committed content\n").unwrap();
    fs::write(dir.path().join("a.tmp-deadbeef"), "half writ").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "committed content\n");
    // A later append still works against the committed file only
    w.append(&path, "more\n").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "committed content\nmore\n");
}

#[test]
fn append_accumulates_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt");
    let w = writer(dir.path());
    w.create(&path, "first\n").unwrap();
    w.append(&path, "second\n").unwrap();
    w.append(&path, "third\n").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\nthird\n");
}

#[test]
fn rollup_header_written_once_per_day() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registrations/2024_06.txt");
    let w = writer(dir.path());

    for i in 0..50 {
        let line = format!("07:{:02} - user{} registered", i, i);
        w.append_rollup(&path, june(1), &line).unwrap();
    }

    let content = fs::read_to_string(&path).unwrap();
    let headers = content.lines().filter(|l| *l == "June 1 2024").count();
    let entries = content.lines().filter(|l| l.contains("registered")).count();
    assert_eq!(headers, 1);
    assert_eq!(entries, 50);
}

#[test]
fn rollup_new_day_gets_new_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registrations/2024_06.txt");
    let w = writer(dir.path());

    w.append_rollup(&path, june(1), "06:55 - alice registered").unwrap();
    w.append_rollup(&path, june(2), "08:00 - carol registered").unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "June 1 2024\n06:55 - alice registered\n\nJune 2 2024\n08:00 - carol registered\n"
    );
}

#[test]
fn rollup_dedups_across_concurrent_writers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("interactions/2024_06.txt");

    let mut handles = Vec::new();
    for i in 0..8 {
        let w = writer(dir.path());
        let path = path.clone();
        handles.push(std::thread::spawn(move || {
            let line = format!("07:0{} - user{} prayed for request #1", i, i);
            w.append_rollup(&path, june(1), &line).unwrap();
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let content = fs::read_to_string(&path).unwrap();
    let headers = content.lines().filter(|l| *l == "June 1 2024").count();
    assert_eq!(headers, 1);
    assert_eq!(content.lines().filter(|l| l.contains("prayed")).count(), 8);
}

#[test]
fn rollup_chunk_is_pure() {
    assert_eq!(
        rollup_chunk("", june(1), "06:55 - alice registered"),
        "June 1 2024\n06:55 - alice registered\n"
    );
    assert_eq!(
        rollup_chunk("June 1 2024\n06:55 - alice registered\n", june(1), "07:00 - bob registered"),
        "07:00 - bob registered\n"
    );
    assert_eq!(
        rollup_chunk("June 1 2024\nx\n", june(2), "08:00 - carol registered"),
        "\nJune 2 2024\n08:00 - carol registered\n"
    );
}

// Property-based tests
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_event() -> impl Strategy<Value = (u32, String)> {
        (1..=28u32, 0..60u32, any::<u16>())
            .prop_map(|(day, min, n)| (day, format!("07:{:02} - user{} registered", min, n)))
    }

    proptest! {
        #[test]
        fn chunks_keep_one_header_per_date(events in proptest::collection::vec(arb_event(), 1..40)) {
            let mut content = String::new();
            for (day, line) in &events {
                content.push_str(&rollup_chunk(&content, june(*day), line));
            }

            let days: std::collections::BTreeSet<u32> =
                events.iter().map(|(day, _)| *day).collect();
            for day in &days {
                let header = crate::render::date_header(june(*day));
                prop_assert_eq!(content.lines().filter(|l| *l == header).count(), 1);
            }
            let entries = content.lines().filter(|l| l.contains("registered")).count();
            prop_assert_eq!(entries, events.len());
        }
    }
}
