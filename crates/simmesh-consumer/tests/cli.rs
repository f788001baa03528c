use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_consumer_id_and_retry_flags() {
    Command::cargo_bin("simmesh-consumer")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--consumer-id"))
        .stdout(predicate::str::contains("--max-retries"));
}

#[test]
fn rejects_a_non_numeric_prefetch_count() {
    Command::cargo_bin("simmesh-consumer")
        .unwrap()
        .args(["--prefetch-count", "not-a-number"])
        .assert()
        .failure();
}
