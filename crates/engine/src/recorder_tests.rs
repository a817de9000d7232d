// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fs;

use chrono::NaiveDate;
use tempfile::TempDir;
use vigil_core::FakeClock;

use super::*;

fn setup() -> (TempDir, EngineConfig, Store, Recorder<FakeClock>) {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::new(dir.path().join("archive"), dir.path().join("cache.db"));
    let store = Store::open_in_memory().unwrap();
    let clock = FakeClock::new(
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(6, 55, 0)
            .unwrap(),
    );
    let recorder = Recorder::new(&config, clock);
    (dir, config, store, recorder)
}

#[test]
fn request_is_archived_before_row_exists() {
    let (_dir, config, store, recorder) = setup();
    let id = recorder.record_request(&store, "alice", "please pray", &[]).unwrap();
    assert_eq!(id, RequestId(1));

    let path = config
        .archive_root
        .join("requests/2024/06/2024-06-01_0655.txt");
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Request #1\nFrom: alice\n"));

    let row = store.request(id).unwrap().unwrap();
    assert_eq!(
        row.source_archive_path.as_deref(),
        Some("requests/2024/06/2024-06-01_0655.txt")
    );
}

#[test]
fn failed_archive_write_leaves_no_row() {
    let (_dir, config, store, recorder) = setup();
    // Occupy the target path with a directory so the create must fail
    let target = config
        .archive_root
        .join("requests/2024/06/2024-06-01_0655.txt");
    fs::create_dir_all(&target).unwrap();

    assert!(recorder.record_request(&store, "alice", "please pray", &[]).is_err());
    assert!(store.requests().unwrap().is_empty());
}

#[test]
fn registration_lands_in_monthly_rollup() {
    let (_dir, config, store, recorder) = setup();
    let outcome = recorder
        .record_registration(&store, "alice", Some("alice@example.org"))
        .unwrap();
    assert_eq!(outcome, Upsert::Inserted);

    let text =
        fs::read_to_string(config.archive_root.join("registrations/2024_06.txt")).unwrap();
    assert_eq!(
        text,
        "June 1 2024\n06:55 - alice registered (alice@example.org)\n"
    );

    // Same username again is a conflict or skip, never a second line
    let again = recorder.record_registration(&store, "alice", Some("alice@example.org"));
    assert!(again.is_ok());
}

#[test]
fn interaction_appends_to_request_file_and_mirrors() {
    let (_dir, config, store, recorder) = setup();
    let id = recorder.record_request(&store, "alice", "please pray", &[]).unwrap();
    recorder.record_interaction(&store, id, "bob").unwrap();

    let request = fs::read_to_string(
        config
            .archive_root
            .join("requests/2024/06/2024-06-01_0655.txt"),
    )
    .unwrap();
    assert!(request.contains("2024-06-01 06:55 - bob prayed for this request"));

    let mirror =
        fs::read_to_string(config.archive_root.join("interactions/2024_06.txt")).unwrap();
    assert!(mirror.contains("06:55 - bob prayed for request #1"));
}

#[test]
fn interaction_against_unknown_request_fails() {
    let (_dir, _config, store, recorder) = setup();
    assert!(recorder.record_interaction(&store, RequestId(9), "bob").is_err());
}

#[test]
fn status_change_updates_cached_status() {
    let (_dir, config, store, recorder) = setup();
    let id = recorder.record_request(&store, "alice", "please pray", &[]).unwrap();
    recorder
        .record_status_change(&store, id, "admin", "answered")
        .unwrap();

    let row = store.request(id).unwrap().unwrap();
    assert_eq!(row.status, "answered");

    let mirror = fs::read_to_string(config.archive_root.join("status/2024_06.txt")).unwrap();
    assert!(mirror.contains("06:55 - admin changed status of request #1 to answered"));
}

#[test]
fn remove_appends_removal_line_and_soft_deletes() {
    let (_dir, config, store, recorder) = setup();
    let id = recorder.record_request(&store, "alice", "please pray", &[]).unwrap();
    recorder.remove_request(&store, id, "admin").unwrap();

    let text = fs::read_to_string(
        config
            .archive_root
            .join("requests/2024/06/2024-06-01_0655.txt"),
    )
    .unwrap();
    assert!(text.contains("2024-06-01 06:55 - admin removed this request"));

    let row = store.request(id).unwrap().unwrap();
    assert_eq!(row.status, STATUS_REMOVED);
}

#[test]
fn testimony_goes_only_to_the_request_file() {
    let (_dir, config, store, recorder) = setup();
    let id = recorder.record_request(&store, "alice", "please pray", &[]).unwrap();
    recorder
        .record_testimony(&store, id, "alice", "prayers answered")
        .unwrap();

    let text = fs::read_to_string(
        config
            .archive_root
            .join("requests/2024/06/2024-06-01_0655.txt"),
    )
    .unwrap();
    assert!(text.contains("shared a testimony: prayers answered"));
    assert!(!config.archive_root.join("interactions/2024_06.txt").exists());

    let rows = store.testimonies().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].to_testimony().text, "prayers answered");
}

#[test]
fn second_request_in_same_minute_gets_suffixed_file() {
    let (_dir, config, store, recorder) = setup();
    recorder.record_request(&store, "alice", "first", &[]).unwrap();
    recorder.record_request(&store, "bob", "second", &[]).unwrap();

    let suffixed = config
        .archive_root
        .join("requests/2024/06/2024-06-01_0655_2.txt");
    let text = fs::read_to_string(&suffixed).unwrap();
    assert!(text.starts_with("Request #2\nFrom: bob\n"));
}

#[test]
fn append_routes_into_retired_bundle() {
    let (_dir, config, store, recorder) = setup();
    let id = recorder.record_request(&store, "alice", "please pray", &[]).unwrap();

    let layout = Layout::new(&config.archive_root);
    let bundles = CompressionManager::new(layout, config.lock_timeout);
    bundles
        .compress_period(ArchiveKind::Request, Period { year: 2024, month: 6 })
        .unwrap();

    recorder.record_interaction(&store, id, "carol").unwrap();

    let member = bundles
        .read_member(
            &config.archive_root.join("requests/2024/06.zip"),
            "2024-06-01_0655.txt",
        )
        .unwrap();
    assert!(member.contains("carol prayed for this request"));
}
