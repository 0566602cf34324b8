//! `polord config-hash` prints a stable hash and the canonical JSON.

use std::fs;

use predicates::prelude::*;

#[allow(deprecated)]
#[test]
fn config_hash_is_stable_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    fs::write(&base, "reconcile:\n  max_move_retries: 2\n").unwrap();

    let first = assert_cmd::Command::cargo_bin("polord")
        .unwrap()
        .arg("config-hash")
        .arg(&base)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("config_hash="))
        .stdout(predicate::str::contains(r#"{"reconcile":{"max_move_retries":2}}"#))
        .get_output()
        .stdout
        .clone();

    let second = assert_cmd::Command::cargo_bin("polord")
        .unwrap()
        .arg("config-hash")
        .arg(&base)
        .output()
        .unwrap()
        .stdout;

    assert_eq!(first, second);
}

#[allow(deprecated)]
#[test]
fn config_hash_requires_a_path() {
    assert_cmd::Command::cargo_bin("polord")
        .unwrap()
        .arg("config-hash")
        .assert()
        .failure();
}
