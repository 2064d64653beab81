//! CLI integration tests for muse-run

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const CREDENTIAL_VARS: [&str; 4] = [
    "TEXT_API_KEY",
    "IMAGE_API_KEY",
    "SOCIAL_ACCESS_TOKEN",
    "SOCIAL_INSTANCE_URL",
];

/// Write a config whose text endpoint refuses connections
fn setup_test_env() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let config_content = r#"
topics = ["Edge AI"]

[persona]
name = "Test Persona"
bio = "Writes tests."
interests = ["testing"]

[schedule]
pacing_interval = "0s"

[text]
base_url = "http://127.0.0.1:9"

[image]
backend = "none"
"#;
    fs::write(&config_path, config_content).unwrap();

    (temp_dir, config_path)
}

fn muse_run() -> Command {
    let mut cmd = Command::cargo_bin("muse-run").unwrap();
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("MUSECAST_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_flag() {
    muse_run()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("muse-run"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("EXIT CODES"));
}

#[test]
fn test_missing_text_key_exits_with_code_2() {
    let (_temp_dir, config_path) = setup_test_env();

    muse_run()
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("TEXT_API_KEY"));
}

#[test]
fn test_missing_social_credentials_exit_with_code_2() {
    let (_temp_dir, config_path) = setup_test_env();

    muse_run()
        .env("TEXT_API_KEY", "test-key")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_unreadable_config_exits_with_code_2() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    muse_run()
        .env("TEXT_API_KEY", "test-key")
        .arg("--config")
        .arg(&missing)
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_invalid_config_exits_with_code_2() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[schedule]\npacing_interval = \"soon\"\n").unwrap();

    muse_run()
        .env("MUSECAST_CONFIG", &config_path)
        .env("TEXT_API_KEY", "test-key")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("pacing_interval"));
}

#[test]
fn test_dry_run_skips_failed_topic_and_exits_zero() {
    let (_temp_dir, config_path) = setup_test_env();

    muse_run()
        .env("TEXT_API_KEY", "test-key")
        .arg("--config")
        .arg(&config_path)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "1 topic(s): 0 published, 1 skipped, 0 failed",
        ));
}

#[test]
fn test_topic_flag_replaces_configured_topics() {
    let (_temp_dir, config_path) = setup_test_env();

    muse_run()
        .env("TEXT_API_KEY", "test-key")
        .arg("--config")
        .arg(&config_path)
        .args(["--dry-run", "--pacing", "0s"])
        .args(["--topic", "Rust", "--topic", "WebAssembly", "--topic", "Zig"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 topic(s)"));
}

#[test]
fn test_invalid_pacing_flag_is_rejected() {
    muse_run()
        .args(["--pacing", "whenever"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--pacing"));
}
