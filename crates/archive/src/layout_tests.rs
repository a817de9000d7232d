// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::NaiveDate;
use yare::parameterized;

fn ts() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(6, 55, 0)
        .unwrap()
}

#[test]
fn request_path_embeds_date_and_minute() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path());
    let loc = layout.request_location(RequestId(142), ts()).unwrap();
    assert_eq!(loc.rel_path(), "requests/2024/06/2024-06-01_0655.txt");
}

#[test]
fn colliding_minute_gets_numbered_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path());

    let first = layout.request_location(RequestId(1), ts()).unwrap();
    let path = layout.plain_path(&first);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "Request #1\nFrom: alice\n").unwrap();

    let second = layout.request_location(RequestId(2), ts()).unwrap();
    assert_eq!(second.rel_path(), "requests/2024/06/2024-06-01_0655_2.txt");
}

#[test]
fn existing_file_for_same_request_resolves_to_itself() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path());

    let loc = layout.request_location(RequestId(7), ts()).unwrap();
    let path = layout.plain_path(&loc);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "Request #7\nFrom: alice\n").unwrap();

    let again = layout.request_location(RequestId(7), ts()).unwrap();
    assert_eq!(again, loc);
}

#[parameterized(
    request = { "requests/2024/06/2024-06-01_0655.txt" },
    request_suffixed = { "requests/2024/06/2024-06-01_0655_2.txt" },
    registration = { "registrations/2024_06.txt" },
    interactions = { "interactions/2024_06.txt" },
    status = { "status/2024_06.txt" },
)]
fn rel_path_roundtrips(rel: &str) {
    let loc = Location::parse(rel).unwrap();
    assert_eq!(loc.rel_path(), rel);
}

#[parameterized(
    unknown_dir = { "notes/2024_06.txt" },
    bad_month = { "requests/2024/13/x.txt" },
    bundle = { "registrations/2024_06.zip" },
    empty = { "" },
)]
fn bad_rel_paths_do_not_parse(rel: &str) {
    assert!(Location::parse(rel).is_none());
}

#[test]
fn rollup_bundle_path_sits_next_to_plain_file() {
    let layout = Layout::new("/tmp/arch");
    let loc = Location::rollup(ArchiveKind::Registration, Period { year: 2024, month: 6 });
    assert_eq!(
        layout.plain_path(&loc),
        PathBuf::from("/tmp/arch/registrations/2024_06.txt")
    );
    assert_eq!(
        layout.bundle_path(&loc),
        PathBuf::from("/tmp/arch/registrations/2024_06.zip")
    );
    assert_eq!(loc.member_name(), "2024_06.txt");
}

#[test]
fn request_bundle_path_is_month_zip() {
    let layout = Layout::new("/tmp/arch");
    let loc = Location::Request {
        period: Period { year: 2024, month: 6 },
        file_name: "2024-06-01_0655.txt".into(),
    };
    assert_eq!(
        layout.bundle_path(&loc),
        PathBuf::from("/tmp/arch/requests/2024/06.zip")
    );
}

#[test]
fn scan_finds_plain_files_and_bundles() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path());

    std::fs::create_dir_all(dir.path().join("requests/2024/06")).unwrap();
    std::fs::write(
        dir.path().join("requests/2024/06/2024-06-01_0655.txt"),
        "Request #1\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("requests/2024/05.zip"), "zip").unwrap();
    std::fs::create_dir_all(dir.path().join("registrations")).unwrap();
    std::fs::write(dir.path().join("registrations/2024_06.txt"), "").unwrap();

    let files = layout.plain_request_files().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].rel_path(), "requests/2024/06/2024-06-01_0655.txt");

    let bundles = layout.request_bundles().unwrap();
    assert_eq!(bundles.len(), 1);
    assert_eq!(bundles[0].0, Period { year: 2024, month: 5 });

    let rollups = layout.plain_rollups(ArchiveKind::Registration).unwrap();
    assert_eq!(rollups.len(), 1);

    let periods = layout.active_periods(ArchiveKind::Request).unwrap();
    assert_eq!(periods, vec![Period { year: 2024, month: 6 }]);
}

#[test]
fn scan_of_missing_tree_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path().join("nonexistent"));
    assert!(layout.plain_request_files().unwrap().is_empty());
    assert!(layout.plain_rollups(ArchiveKind::StatusLog).unwrap().is_empty());
}

#[test]
fn lock_paths_are_flat_and_distinct() {
    let layout = Layout::new("/tmp/arch");
    let a = layout.lock_path_for(Path::new("/tmp/arch/registrations/2024_06.txt"));
    let b = layout.lock_path_for(Path::new("/tmp/arch/registrations/2024_07.txt"));
    assert_ne!(a, b);
    assert!(a.starts_with("/tmp/arch/.locks"));
    assert!(a.extension().is_some_and(|e| e == "lock"));
}
