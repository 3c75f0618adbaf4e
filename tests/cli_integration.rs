#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

mod common;

const PLAIN_CONFIG: &str = r#"
provider:
  type: ollama
  ollama:
    host: http://127.0.0.1:9
    model: test-model
"#;

fn mindchat(config_path: &std::path::Path, data_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("mindchat").unwrap();
    cmd.env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config_path)
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

#[test]
fn test_modes_lists_builtin_modes() {
    let (tmp, config_path) = common::temp_config_file(PLAIN_CONFIG);

    mindchat(&config_path, tmp.path())
        .arg("modes")
        .assert()
        .success()
        .stdout(predicate::str::contains("mind_chat"))
        .stdout(predicate::str::contains("plain_chat"))
        .stdout(predicate::str::contains("history_mindchat.json"));
}

#[test]
fn test_missing_config_file_falls_back_to_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let config_path = tmp.path().join("absent.yaml");

    mindchat(&config_path, tmp.path())
        .arg("modes")
        .assert()
        .success()
        .stdout(predicate::str::contains("mind_chat"));
}

#[test]
fn test_history_list_empty() {
    let (tmp, config_path) = common::temp_config_file(PLAIN_CONFIG);

    mindchat(&config_path, tmp.path())
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No conversation history found"));

    // Opening the history creates the mode's file
    assert!(tmp.path().join("history_mindchat.json").exists());
}

#[test]
fn test_history_list_shows_seeded_conversations() {
    let (tmp, config_path) = common::temp_config_file(PLAIN_CONFIG);
    let config = common::config_in(tmp.path());
    common::seed_mode(&config, "plain_chat", &["What's a good pasta recipe?"]);

    mindchat(&config_path, tmp.path())
        .args(["history", "list", "--mode", "plain_chat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("What's a good pasta recipe?"))
        .stdout(predicate::str::contains("Run mindchat chat and use /open <ID>"));
}

#[test]
fn test_json_logs_flag_emits_json_events() {
    let (tmp, config_path) = common::temp_config_file(PLAIN_CONFIG);

    mindchat(&config_path, tmp.path())
        .args(["--verbose", "--json-logs", "history", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("\"level\":\"DEBUG\""))
        .stderr(predicate::str::contains("Starting history command"));
}

#[test]
fn test_history_favorite_and_delete_by_prefix() {
    let (tmp, config_path) = common::temp_config_file(PLAIN_CONFIG);
    let config = common::config_in(tmp.path());
    let ids = common::seed_mode(&config, "mind_chat", &["I feel stuck at work"]);
    let id = &ids[0];

    mindchat(&config_path, tmp.path())
        .args(["history", "favorite", &id[..8]])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked"))
        .stdout(predicate::str::contains(id.as_str()));

    mindchat(&config_path, tmp.path())
        .args(["history", "delete", id.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted conversation"));

    let raw = std::fs::read_to_string(tmp.path().join("history_mindchat.json")).unwrap();
    let remaining: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    assert!(remaining.is_empty());
}

#[test]
fn test_history_delete_unknown_id_fails() {
    let (tmp, config_path) = common::temp_config_file(PLAIN_CONFIG);

    mindchat(&config_path, tmp.path())
        .args(["history", "delete", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Conversation not found"));
}

#[test]
fn test_history_unknown_mode_fails() {
    let (tmp, config_path) = common::temp_config_file(PLAIN_CONFIG);

    mindchat(&config_path, tmp.path())
        .args(["history", "list", "--mode", "poetry"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown mode: poetry"));
}

#[test]
fn test_invalid_limits_rejected_at_startup() {
    let (tmp, config_path) = common::temp_config_file(
        r#"
history:
  max_conversations: 5
  max_favorites: 5
"#,
    );

    mindchat(&config_path, tmp.path())
        .arg("modes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be less than"));
}

#[test]
fn test_malformed_config_rejected() {
    let (tmp, config_path) = common::temp_config_file("history: [not, a, map");

    mindchat(&config_path, tmp.path())
        .arg("modes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}
