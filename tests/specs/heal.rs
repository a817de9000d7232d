//! Heal specs: archive reconstruction from database state

use predicates::prelude::*;

use crate::prelude::*;

/// Import, delete the archive file, heal, then re-import on a fresh database:
/// the validator must find no drift on the healed tree.
#[test]
fn heal_then_import_round_trips() {
    let project = Project::empty();
    project.archive_file("requests/2024/06/2024-06-01_0655.txt", REQUEST_ONE);
    project.vigil().arg("import").assert().success();

    std::fs::remove_file(project.archive_path("requests/2024/06/2024-06-01_0655.txt")).unwrap();

    project
        .vigil()
        .arg("heal")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 requests healed"));

    let rebuilt = project.read_archive_file("requests/2024/06/2024-06-01_0655.txt");
    assert!(rebuilt.starts_with("Request #1\nFrom: alice\n"));
    assert!(rebuilt.contains("bob prayed for this request"));
    assert!(rebuilt.contains("carol prayed for this request"));

    project.vigil().arg("validate").assert().success();
}

#[test]
fn heal_dry_run_writes_nothing() {
    let project = Project::empty();
    project.archive_file("requests/2024/06/2024-06-01_0655.txt", REQUEST_ONE);
    project.vigil().arg("import").assert().success();

    std::fs::remove_file(project.archive_path("requests/2024/06/2024-06-01_0655.txt")).unwrap();

    project
        .vigil()
        .args(["heal", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 requests healed"));

    assert!(!project
        .archive_path("requests/2024/06/2024-06-01_0655.txt")
        .exists());
}

#[test]
fn healthy_tree_heals_nothing() {
    let project = Project::empty();
    project.archive_file("requests/2024/06/2024-06-01_0655.txt", REQUEST_ONE);
    project.vigil().arg("import").assert().success();

    project
        .vigil()
        .arg("heal")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 users healed, 0 requests healed"));
}
