//! Integration tests for the SecretSafe host binary.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.  The
//! data key comes from `SECRETSAFE_MASTER_KEY` so no OS keyring is needed.

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::{json, Value};

/// 32 bytes, base64.
const TEST_KEY: &str = "QUJDREVGR0hJSktMTU5PUFFSU1RVVldYWVoxMjM0NTY=";

/// Helper: a Command for the binary, isolated to `dir`.
fn secretsafe(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("secretsafe").expect("binary should exist");
    cmd.env("SECRETSAFE_MASTER_KEY", TEST_KEY)
        .env("SECRETSAFE_CONFIG", dir.path().join("config.toml"))
        .env("SECRETSAFE_DATA_DIR", dir.path().join("data"))
        .env_remove("SECRETSAFE_LOG");
    cmd
}

fn call(dir: &TempDir, args: &[&str]) -> Value {
    let output = secretsafe(dir)
        .arg("call")
        .args(args)
        .output()
        .expect("run binary");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn help_flag_shows_usage() {
    let dir = TempDir::new().unwrap();
    secretsafe(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("call"));
}

#[test]
fn no_args_shows_usage() {
    let dir = TempDir::new().unwrap();
    secretsafe(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn call_roundtrip_through_files() {
    let dir = TempDir::new().unwrap();

    assert_eq!(
        call(&dir, &["get-all-secret-names"]),
        json!({"success": true, "data": []})
    );
    assert_eq!(
        call(&dir, &["check-encryption-available"]),
        Value::Bool(true)
    );
    assert_eq!(
        call(
            &dir,
            &["save-secret", r#"{"name":"api-key","value":"abc123"}"#]
        ),
        json!({"success": true, "data": null})
    );

    let got = call(&dir, &["get-secret", "api-key"]);
    assert_eq!(got["data"]["value"], "abc123");

    assert!(dir.path().join("data").join("secrets.encrypted").exists());
    let index = std::fs::read_to_string(dir.path().join("data").join("secrets-index.json")).unwrap();
    assert!(index.contains("api-key"));
    assert!(!index.contains("abc123"));
}

#[test]
fn call_missing_secret_is_error_envelope_with_zero_exit() {
    let dir = TempDir::new().unwrap();
    assert_eq!(
        call(&dir, &["get-secret", "missing"]),
        json!({"success": false, "error": "Secret not found"})
    );
}

#[test]
fn call_treats_numeric_name_as_a_name() {
    let dir = TempDir::new().unwrap();
    call(&dir, &["save-secret", r#"{"name":"2024","value":"leap"}"#]);

    assert_eq!(
        call(&dir, &["check-secret-exists", "2024"]),
        json!({"success": true, "data": true})
    );
    assert_eq!(call(&dir, &["get-secret", "2024"])["data"]["value"], "leap");
}

#[test]
fn serve_answers_json_lines() {
    let dir = TempDir::new().unwrap();
    let input = concat!(
        r#"{"channel":"save-secret","payload":{"name":"k","value":"v"}}"#,
        "\n",
        r#"{"channel":"get-secret","payload":"k"}"#,
        "\n",
        r#"{"channel":"delete-secret","payload":"k"}"#,
        "\n",
        r#"{"channel":"get-all-secret-names"}"#,
        "\n",
    );

    let output = secretsafe(&dir)
        .arg("serve")
        .write_stdin(input)
        .output()
        .expect("run binary");
    assert!(output.status.success());

    let lines: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["success"], true);
    assert_eq!(lines[1]["data"]["value"], "v");
    assert_eq!(lines[2]["success"], true);
    assert_eq!(lines[3], json!({"success": true, "data": []}));
}

#[test]
fn invalid_config_fails_startup() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "not valid {{toml").unwrap();

    secretsafe(&dir)
        .args(["call", "get-all-secret-names"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file error"));
}
