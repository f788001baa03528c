use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_model_path_and_overrides() {
    Command::cargo_bin("simmesh-producer")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("num-escenarios"));
}

#[test]
fn missing_model_path_is_a_usage_error() {
    Command::cargo_bin("simmesh-producer").unwrap().assert().failure();
}
