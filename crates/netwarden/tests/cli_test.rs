#![allow(clippy::unwrap_used)]
// End-to-end CLI tests that never touch a gateway: argument parsing,
// config plumbing, and the pure-read lockdown status path.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn netwarden() -> Command {
    Command::cargo_bin("netwarden").unwrap()
}

/// Write a config whose storage paths live inside the temp dir, so tests
/// never read or write real state.
fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    let data = dir.path().display().to_string();
    std::fs::write(
        &path,
        format!(
            r#"
[router]
url = "http://127.0.0.1:1"
username = "admin"
password = "secret"

[storage]
allowlist_path = "{data}/allowlist.json"
lockdown_state_path = "{data}/lockdown_state.json"
presence_log_path = "{data}/presence_history.csv"
"#
        ),
    )
    .unwrap();
    path
}

#[test]
fn help_lists_the_command_tree() {
    netwarden()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("lockdown"))
        .stdout(predicate::str::contains("allowlist"))
        .stdout(predicate::str::contains("monitor"));
}

#[test]
fn no_subcommand_is_a_usage_error() {
    netwarden().assert().failure().code(2);
}

#[test]
fn config_path_respects_override() {
    netwarden()
        .args(["config", "path", "-c", "/tmp/custom-netwarden.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/custom-netwarden.toml"));
}

#[test]
fn config_show_redacts_the_password() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    netwarden()
        .args(["config", "show", "-c"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("<redacted>"))
        .stdout(predicate::str::contains("secret").not());
}

#[test]
fn completions_generate_for_bash() {
    netwarden()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("netwarden"));
}

#[test]
fn lockdown_status_is_inactive_without_state() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    // Pure read of persisted state: succeeds without any gateway.
    netwarden()
        .args(["lockdown", "status", "-c"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("not active"));
}

#[test]
fn lockdown_stop_without_active_lockdown_conflicts() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    netwarden()
        .args(["lockdown", "stop", "-c"])
        .arg(&config)
        .assert()
        .failure()
        .code(6);
}

#[test]
fn allowlist_add_and_list_round_trip() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    netwarden()
        .args(["allowlist", "add", "phone", "aa:bb:cc:dd:ee:ff", "-c"])
        .arg(&config)
        .assert()
        .success();

    netwarden()
        .args(["allowlist", "list", "-c"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("AA:BB:CC:DD:EE:FF"));

    // Second add of the same MAC is a reported no-op, not an error.
    netwarden()
        .args(["allowlist", "add", "phone2", "AA:BB:CC:DD:EE:FF", "-c"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("already allowlisted"));
}
