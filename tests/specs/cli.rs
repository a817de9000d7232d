//! CLI wiring specs: argument requirements and config loading

use predicates::prelude::*;

use crate::prelude::*;

#[test]
fn missing_paths_is_a_usage_error() {
    let mut cmd = assert_cmd::Command::cargo_bin("vigil").unwrap();
    cmd.arg("import")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "either --config or both --archive-root and --db are required",
        ));
}

#[test]
fn config_file_supplies_the_paths() {
    let project = Project::empty();
    project.archive_file("requests/2024/06/2024-06-01_0655.txt", REQUEST_ONE);

    let config_path = project.path().join("vigil.toml");
    std::fs::write(
        &config_path,
        format!(
            "archive_root = {:?}\ndb_path = {:?}\n",
            project.archive_root(),
            project.db_path()
        ),
    )
    .unwrap();

    let mut cmd = assert_cmd::Command::cargo_bin("vigil").unwrap();
    cmd.arg("--config")
        .arg(&config_path)
        .arg("import")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 inserted"));
}

#[test]
fn flags_override_the_config_file() {
    let project = Project::empty();
    project.archive_file("requests/2024/06/2024-06-01_0655.txt", REQUEST_ONE);

    // Config points at an empty tree; the flag wins
    let config_path = project.path().join("vigil.toml");
    std::fs::write(
        &config_path,
        format!(
            "archive_root = {:?}\ndb_path = {:?}\n",
            project.path().join("nowhere"),
            project.db_path()
        ),
    )
    .unwrap();

    let mut cmd = assert_cmd::Command::cargo_bin("vigil").unwrap();
    cmd.arg("--config")
        .arg(&config_path)
        .arg("--archive-root")
        .arg(project.archive_root())
        .arg("import")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 inserted"));
}

#[test]
fn help_lists_the_operational_commands() {
    let mut cmd = assert_cmd::Command::cargo_bin("vigil").unwrap();
    let assert = cmd.arg("--help").assert().success();
    let help = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    for sub in ["import", "heal", "compress", "validate"] {
        assert!(help.contains(sub), "missing {} in help", sub);
    }
}
