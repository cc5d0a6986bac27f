use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_config_show_defaults() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains("http://localhost:8000"))
        .stdout(predicate::str::contains("log.level = (default)"));
}

#[test]
fn test_config_set_url_creates_file_with_template() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    assert!(!config_path.exists());

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", dir.path())
        .args(["config", "set-url", "http://deck.example.com:9000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://deck.example.com:9000"));

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("# Taskdeck Configuration"));
    assert!(contents.contains("http://deck.example.com:9000"));
}

#[test]
fn test_config_set_url_rejects_invalid_url() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", dir.path())
        .args(["config", "set-url", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid server URL"));

    assert!(!dir.path().join("config.toml").exists());
}

#[test]
fn test_config_show_reflects_saved_url() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", dir.path())
        .args(["config", "set-url", "http://deck.internal:8000"])
        .assert()
        .success();

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://deck.internal:8000"));
}

#[test]
fn test_server_flag_overrides_config() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", dir.path())
        .args(["--server", "http://other:9999", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://other:9999"))
        .stdout(predicate::str::contains("from --server"));
}
