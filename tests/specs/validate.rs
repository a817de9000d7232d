//! Validate specs: drift detection and exit codes

use predicates::prelude::*;

use crate::prelude::*;

#[test]
fn clean_state_exits_zero() {
    let project = Project::empty();
    project.archive_file("requests/2024/06/2024-06-01_0655.txt", REQUEST_ONE);
    project.vigil().arg("import").assert().success();

    project
        .vigil()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("clean"));
}

#[test]
fn unimported_archive_exits_one() {
    let project = Project::empty();
    project.archive_file("requests/2024/06/2024-06-01_0655.txt", REQUEST_ONE);

    project
        .vigil()
        .arg("validate")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("archive-only"));
}

#[test]
fn edited_archive_is_reported_as_a_conflict() {
    let project = Project::empty();
    project.archive_file("requests/2024/06/2024-06-01_0655.txt", REQUEST_ONE);
    project.vigil().arg("import").assert().success();

    project.archive_file(
        "requests/2024/06/2024-06-01_0655.txt",
        &REQUEST_ONE.replace("Please pray for my exams.", "Tampered."),
    );

    project
        .vigil()
        .arg("validate")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("conflict on request/1/alice"));
}

#[test]
fn json_report_carries_per_kind_counts() {
    let project = Project::empty();
    project.archive_file("requests/2024/06/2024-06-01_0655.txt", REQUEST_ONE);
    project.vigil().arg("import").assert().success();

    let output = project
        .vigil()
        .args(["--json", "validate"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let kinds = report["kinds"].as_array().unwrap();
    let creation = kinds
        .iter()
        .find(|k| k["kind"] == "creation")
        .unwrap();
    assert_eq!(creation["matched"], 1);
    assert_eq!(creation["db_only"], 0);
    assert_eq!(creation["archive_only"], 0);
}
