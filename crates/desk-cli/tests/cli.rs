//! End-to-end tests that drive the `helpdesk` binary against a scratch working set.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn helpdesk(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("helpdesk").expect("bin");
    cmd.current_dir(dir)
        .env_remove("HELPDESK_CONFIG")
        .env_remove("HELPDESK_STATE")
        .args(["--state", "state.json"]);
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    helpdesk(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ticket"))
        .stdout(predicate::str::contains("escalate"))
        .stdout(predicate::str::contains("approval"));
}

#[test]
fn create_then_list_persists_between_runs() {
    let dir = TempDir::new().unwrap();

    helpdesk(dir.path())
        .args(["ticket", "create", "VPN drops", "--requester", "alice", "-p", "high"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created TKT-000001 (high priority)"));
    assert!(dir.path().join("state.json").exists());

    helpdesk(dir.path())
        .args(["ticket", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TKT-000001"))
        .stdout(predicate::str::contains("VPN drops"));
}

#[test]
fn json_output_is_parseable() {
    let dir = TempDir::new().unwrap();
    helpdesk(dir.path())
        .args(["ticket", "create", "Printer jam", "--requester", "bob"])
        .assert()
        .success();

    let output = helpdesk(dir.path())
        .args(["--format", "json", "ticket", "show", "1"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["subject"], "Printer jam");
    assert_eq!(value["requester"], "bob");
}

#[test]
fn invalid_priority_fails() {
    let dir = TempDir::new().unwrap();
    helpdesk(dir.path())
        .args(["ticket", "create", "Broken", "--requester", "alice", "-p", "whenever"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid priority: whenever"));
    assert!(!dir.path().join("state.json").exists());
}

#[test]
fn unknown_ticket_fails() {
    let dir = TempDir::new().unwrap();
    helpdesk(dir.path())
        .args(["ticket", "show", "TKT-000099"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TKT-000099"));
}

#[test]
fn settings_file_in_working_directory_is_picked_up() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("helpdesk.toml"),
        "[escalation]\nsweep_interval_secs = 60\n",
    )
    .unwrap();

    helpdesk(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("# helpdesk.toml"))
        .stdout(predicate::str::contains("sweep_interval_secs = 60"));
}

#[test]
fn named_settings_file_must_exist() {
    let dir = TempDir::new().unwrap();
    helpdesk(dir.path())
        .args(["--config", "missing.toml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot access missing.toml"));

    helpdesk(dir.path())
        .env("HELPDESK_CONFIG", "elsewhere.toml")
        .args(["ticket", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("elsewhere.toml"));
}

#[test]
fn report_after_assignment() {
    let dir = TempDir::new().unwrap();
    helpdesk(dir.path())
        .args(["ticket", "create", "Laptop slow", "--requester", "alice"])
        .assert()
        .success();
    helpdesk(dir.path())
        .args(["ticket", "assign", "1", "dave"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TKT-000001 assigned to dave"));

    helpdesk(dir.path())
        .arg("report")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tickets:          1 (1 active)"))
        .stdout(predicate::str::contains("Unassigned:       0"))
        .stdout(predicate::str::contains("Busiest agent:    dave (1 active)"));
}

#[test]
fn single_escalation_sweep() {
    let dir = TempDir::new().unwrap();
    helpdesk(dir.path())
        .args(["ticket", "create", "Server down", "--requester", "carol", "-p", "urgent"])
        .assert()
        .success();

    helpdesk(dir.path()).arg("escalate").assert().success();
}
