//! CLI Integration Tests
//!
//! Tests the command-line interface end-to-end.

use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

const PROJECTS: &str = r#"[
    {"URL": "https://github.com/acme/api", "OFName": "Acme API"},
    {"URL": "https://github.com/acme/web", "OFName": "Acme Web"}
]"#;

const SOURCES: &str = r#"[
    {
        "Name": "github",
        "URL": "https://api.github.com/issues",
        "Headers": [{"Key": "Accept", "Value": "application/json"}],
        "Queries": "state=open",
        "Response": {"DataField": "", "Title": "title", "URL": "html_url", "Number": "number"},
        "Tags": ["github", "work"]
    }
]"#;

const RESPONSE: &str = r#"[
    {"number": 1, "title": "Crash", "html_url": "https://github.com/acme/api/issues/1"},
    {"number": 2, "title": "Typo", "html_url": "https://github.com/acme/web/issues/2"},
    {"number": 3, "title": "Stray", "html_url": "https://gitlab.com/other/3"}
]"#;

/// Get the binary to test.
fn omnisync() -> Command {
    let mut cmd = Command::cargo_bin("omnisync").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("OMNISYNC_CONFIG_DIR");
    cmd
}

/// A config directory holding projects and sources.
fn config_dir() -> assert_fs::TempDir {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("projects.json").write_str(PROJECTS).unwrap();
    dir.child("sources.json").write_str(SOURCES).unwrap();
    dir
}

// ============================================================================
// Help & Version Tests
// ============================================================================

#[test]
fn test_help_flag() {
    omnisync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_DESCRIPTION")))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("--config-dir"));
}

#[test]
fn test_version_flag() {
    omnisync()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_subcommand_fails() {
    omnisync().assert().failure().stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_completions_bash() {
    omnisync()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("omnisync"));
}

// ============================================================================
// Plan Command Tests
// ============================================================================

fn plan_inputs() -> assert_fs::TempDir {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("desired.json")
        .write_str(
            r#"[
                {"projectName": "Work", "name": "[1] Crash", "note": "https://t/1"},
                {"projectName": "Work", "name": "[2] Typo", "note": "https://t/2"}
            ]"#,
        )
        .unwrap();
    dir.child("observed.json").write_str(r#"[{"id": "a1", "name": "[0] Old"}]"#).unwrap();
    dir
}

#[test]
fn test_plan_text() {
    let dir = plan_inputs();
    omnisync()
        .arg("plan")
        .arg("--desired")
        .arg(dir.path().join("desired.json"))
        .arg("--observed")
        .arg(dir.path().join("observed.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("+ [NewItem] [1] Crash: Work"))
        .stdout(predicate::str::contains("- Item: [a1] [0] Old"))
        .stdout(predicate::str::contains("3 change(s): 2 add, 1 remove"));
}

#[test]
fn test_plan_json() {
    let dir = plan_inputs();
    let output = omnisync()
        .arg("plan")
        .arg("--desired")
        .arg(dir.path().join("desired.json"))
        .arg("--observed")
        .arg(dir.path().join("observed.json"))
        .args(["--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let changes: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let changes = changes.as_array().unwrap();
    assert_eq!(changes.len(), 3);
    assert_eq!(changes[0]["kind"], "add");
    assert_eq!(changes[0]["payload"]["name"], "[1] Crash");
    assert_eq!(changes[2]["kind"], "remove");
    assert_eq!(changes[2]["payload"]["id"], "a1");
}

#[test]
fn test_plan_missing_file() {
    let dir = assert_fs::TempDir::new().unwrap();
    omnisync()
        .arg("plan")
        .arg("--desired")
        .arg(dir.path().join("nope.json"))
        .arg("--observed")
        .arg(dir.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

// ============================================================================
// Configuration Command Tests
// ============================================================================

#[test]
fn test_projects_lists_configured_projects() {
    let dir = config_dir();
    omnisync()
        .arg("--config-dir")
        .arg(dir.path())
        .arg("projects")
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme API: https://github.com/acme/api"))
        .stdout(predicate::str::contains("Total: 2 projects"));
}

#[test]
fn test_config_dir_from_env() {
    let dir = config_dir();
    omnisync()
        .env("OMNISYNC_CONFIG_DIR", dir.path())
        .arg("projects")
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme Web"));
}

#[test]
fn test_sources_lists_tags() {
    let dir = config_dir();
    omnisync()
        .arg("--config-dir")
        .arg(dir.path())
        .arg("sources")
        .assert()
        .success()
        .stdout(predicate::str::contains("github: https://api.github.com/issues [github, work]"));
}

#[test]
fn test_match_finds_project() {
    let dir = config_dir();
    omnisync()
        .arg("--config-dir")
        .arg(dir.path())
        .args(["match", "https://github.com/acme/web/pull/7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme Web"));
}

#[test]
fn test_match_without_project_fails() {
    let dir = config_dir();
    omnisync()
        .arg("--config-dir")
        .arg(dir.path())
        .args(["match", "https://example.com/1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not match any projects"));
}

#[test]
fn test_missing_projects_file_fails() {
    let dir = assert_fs::TempDir::new().unwrap();
    omnisync()
        .arg("--config-dir")
        .arg(dir.path())
        .arg("projects")
        .assert()
        .failure()
        .stderr(predicate::str::contains("projects.json"));
}

#[test]
fn test_config_path() {
    let dir = config_dir();
    omnisync()
        .arg("--config-dir")
        .arg(dir.path())
        .args(["config", "--path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(dir.path().to_string_lossy().to_string()));
}

#[test]
fn test_config_shows_settings() {
    let dir = config_dir();
    dir.child("config.toml").write_str("[sync]\npolicy = \"continue\"\n").unwrap();
    omnisync()
        .arg("--config-dir")
        .arg(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("policy = \"continue\""))
        .stdout(predicate::str::contains("level = \"warn\""));
}

#[test]
fn test_bad_settings_fail() {
    let dir = config_dir();
    dir.child("config.toml").write_str("[sync]\npolicy = \"sometimes\"\n").unwrap();
    omnisync()
        .arg("--config-dir")
        .arg(dir.path())
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load settings"));
}

// ============================================================================
// Sync Command Tests
// ============================================================================

#[test]
fn test_sync_dry_run_leaves_state_alone() {
    let dir = config_dir();
    dir.child("responses").create_dir_all().unwrap();
    dir.child("responses/github.json").write_str(RESPONSE).unwrap();
    let state = dir.child("tasks.json");

    omnisync()
        .arg("--config-dir")
        .arg(dir.path())
        .arg("sync")
        .arg("--responses")
        .arg(dir.path().join("responses"))
        .arg("--state")
        .arg(state.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN] 2 change(s): 2 add, 0 remove"))
        .stdout(predicate::str::contains("Unmatched items: 1"));

    state.assert(predicate::path::missing());
}

#[test]
fn test_sync_writes_state() {
    let dir = config_dir();
    dir.child("responses").create_dir_all().unwrap();
    dir.child("responses/github.json").write_str(RESPONSE).unwrap();
    let state = dir.child("tasks.json");

    omnisync()
        .arg("--config-dir")
        .arg(dir.path())
        .arg("sync")
        .arg("--responses")
        .arg(dir.path().join("responses"))
        .arg("--state")
        .arg(state.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("github -> Acme API"))
        .stdout(predicate::str::contains("+ [NewItem] [1] Crash: Acme API"));

    state.assert(predicate::str::contains("\"projectName\": \"Acme Web\""));
    state.assert(predicate::str::contains("\"work\""));
}

#[test]
fn test_sync_missing_response_fails() {
    let dir = config_dir();
    omnisync()
        .arg("--config-dir")
        .arg(dir.path())
        .arg("sync")
        .arg("--responses")
        .arg(dir.path().join("responses"))
        .arg("--state")
        .arg(dir.path().join("tasks.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("source `github` is unreachable"));
}
