//! Compression specs: retiring periods and reading them back

use predicates::prelude::*;

use crate::prelude::*;

const OLD_REQUEST: &str = "\
Request #1
From: alice
Date: 2024-01-05 09:00

An old request.

Activity:
2024-01-05 10:00 - bob prayed for this request
";

#[test]
fn old_period_is_retired_into_a_bundle() {
    let project = Project::empty();
    project.archive_file("requests/2024/01/2024-01-05_0900.txt", OLD_REQUEST);

    project
        .vigil()
        .args(["compress", "--older-than-days", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 periods compressed"));

    assert!(project.archive_path("requests/2024/01.zip").is_file());
    assert!(!project
        .archive_path("requests/2024/01/2024-01-05_0900.txt")
        .exists());
}

#[test]
fn bundled_archive_still_imports_and_validates() {
    let project = Project::empty();
    project.archive_file("requests/2024/01/2024-01-05_0900.txt", OLD_REQUEST);

    project
        .vigil()
        .args(["compress", "--older-than-days", "30"])
        .assert()
        .success();

    project
        .vigil()
        .arg("import")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 inserted"));

    project.vigil().arg("validate").assert().success();
}

#[test]
fn bundle_members_match_the_originals() {
    let project = Project::empty();
    project.archive_file("requests/2024/01/2024-01-05_0900.txt", OLD_REQUEST);

    project
        .vigil()
        .args(["compress", "--older-than-days", "30"])
        .assert()
        .success();

    let file = std::fs::File::open(project.archive_path("requests/2024/01.zip")).unwrap();
    let mut bundle = zip::ZipArchive::new(file).unwrap();
    let mut member = String::new();
    std::io::Read::read_to_string(
        &mut bundle.by_name("2024-01-05_0900.txt").unwrap(),
        &mut member,
    )
    .unwrap();
    assert_eq!(member, OLD_REQUEST);
}

#[test]
fn dry_run_only_lists_candidates() {
    let project = Project::empty();
    project.archive_file("requests/2024/01/2024-01-05_0900.txt", OLD_REQUEST);

    project
        .vigil()
        .args(["compress", "--older-than-days", "30", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 periods eligible"))
        .stdout(predicate::str::contains("requests/2024_01"));

    assert!(!project.archive_path("requests/2024/01.zip").exists());
}

#[test]
fn recent_periods_are_left_active() {
    let project = Project::empty();
    project.archive_file("requests/2024/01/2024-01-05_0900.txt", OLD_REQUEST);

    // A window wide enough to cover the period keeps it active
    project
        .vigil()
        .args(["compress", "--older-than-days", "36500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 periods compressed"));

    assert!(project
        .archive_path("requests/2024/01/2024-01-05_0900.txt")
        .is_file());
}
