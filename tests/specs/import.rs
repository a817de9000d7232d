//! Import specs: idempotency, dry runs, failure tolerance

use predicates::prelude::*;

use crate::prelude::*;

#[test]
fn import_inserts_then_skips() {
    let project = Project::empty();
    project.archive_file("requests/2024/06/2024-06-01_0655.txt", REQUEST_ONE);

    project
        .vigil()
        .arg("import")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 inserted"))
        .stdout(predicate::str::contains("0 skipped"));

    project
        .vigil()
        .arg("import")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 inserted"))
        .stdout(predicate::str::contains("3 skipped"));
}

#[test]
fn dry_run_reports_but_database_stays_empty() {
    let project = Project::empty();
    project.archive_file("requests/2024/06/2024-06-01_0655.txt", REQUEST_ONE);

    project
        .vigil()
        .args(["import", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 inserted"));

    // A real run afterwards still inserts everything
    project
        .vigil()
        .arg("import")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 inserted"));
}

#[test]
fn unparseable_file_is_reported_and_the_rest_imports() {
    let project = Project::empty();
    project.archive_file("requests/2024/06/2024-06-01_0600.txt", "garbage\n");
    project.archive_file("requests/2024/06/2024-06-01_0655.txt", REQUEST_ONE);

    project
        .vigil()
        .arg("import")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 inserted"))
        .stdout(predicate::str::contains("2024-06-01_0600.txt"));
}

#[test]
fn registrations_are_imported_from_their_rollup() {
    let project = Project::empty();
    project.archive_file(
        "registrations/2024_06.txt",
        "June 1 2024\n06:55 - alice registered (alice@example.org)\n",
    );

    project
        .vigil()
        .arg("import")
        .assert()
        .success()
        .stdout(predicate::str::contains("registration: 1 inserted"));
}

#[test]
fn json_output_is_machine_readable() {
    let project = Project::empty();
    project.archive_file("requests/2024/06/2024-06-01_0655.txt", REQUEST_ONE);

    let output = project
        .vigil()
        .args(["--json", "import"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stats: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(stats["inserted"], 3);
    assert_eq!(stats["skipped"], 0);
    assert_eq!(stats["inserted_by_kind"]["creation"], 1);
    assert_eq!(stats["inserted_by_kind"]["interaction"], 2);
}

#[test]
fn empty_archive_imports_nothing() {
    let project = Project::empty();
    std::fs::create_dir_all(project.archive_root()).unwrap();

    project
        .vigil()
        .arg("import")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 files scanned"));
}
