// ABOUTME: CLI surface tests using assert_cmd.
// ABOUTME: Covers help output, init, and error reporting without a config.

use assert_cmd::Command;
use predicates::prelude::*;

fn cutover() -> Command {
    Command::cargo_bin("cutover").unwrap()
}

#[test]
fn help_lists_subcommands() {
    cutover()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("rollback"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn version_prints() {
    cutover()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cutover"));
}

#[test]
fn init_creates_config_file() {
    let dir = tempfile::tempdir().unwrap();

    cutover()
        .current_dir(dir.path())
        .args(["init", "--service", "shop"])
        .assert()
        .success();

    let content = std::fs::read_to_string(dir.path().join("cutover.yml")).unwrap();
    assert!(content.contains("service: shop"));
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();

    cutover().current_dir(dir.path()).arg("init").assert().success();

    cutover()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    cutover()
        .current_dir(dir.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

#[test]
fn deploy_without_config_reports_discovery_failure() {
    let dir = tempfile::tempdir().unwrap();

    cutover()
        .current_dir(dir.path())
        .args(["deploy", "--environment", "production", "--revision", "a1b2c3d"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn deploy_without_revision_reports_missing_revision() {
    let dir = tempfile::tempdir().unwrap();

    cutover().current_dir(dir.path()).arg("init").assert().success();

    cutover()
        .current_dir(dir.path())
        .env_remove("CUTOVER_REVISION")
        .args(["deploy", "--environment", "production"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no revision given"));
}
