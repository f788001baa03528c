use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_bind_and_refresh_flags() {
    Command::cargo_bin("simmesh-aggregator")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--refresh-interval-ms"));
}

#[test]
fn rejects_an_unparseable_bind_address() {
    Command::cargo_bin("simmesh-aggregator")
        .unwrap()
        .args(["--bind", "not-an-ip"])
        .assert()
        .failure();
}
