use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_connection_options() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cueclock"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--host"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--settings"))
        .stdout(predicate::str::contains("--no-auto-reload"))
        .stdout(predicate::str::contains("--debug"));
}

#[test]
fn rejects_unknown_flags() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cueclock"));
    cmd.arg("--definitely-not-a-flag").assert().failure();
}
