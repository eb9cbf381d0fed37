//! CLI integration tests for the add / backup / restore / sync / archive flow.
//!
//! Every invocation runs the real binary with `HOME` pointed at a tempdir, so
//! the default config locations resolve inside it.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context, Result};
use serde_json::{json, Value};

const OVERRIDES: [&str; 7] = [
    "MCPBRIDGE_OPENCODE_CONFIG",
    "MCPBRIDGE_CLAUDE_CONFIG",
    "MCPBRIDGE_SKILLS_CONFIG",
    "MCPBRIDGE_BACKUP_DIR",
    "MCPBRIDGE_ARCHIVE_DIR",
    "MCPBRIDGE_SETTINGS",
    "MCPBRIDGE_JSON",
];

fn run(home: &Path, args: &[&str]) -> Result<Output> {
    let bin_path = env!("CARGO_BIN_EXE_mcpbridge");
    let mut cmd = Command::new(bin_path);
    cmd.env("HOME", home);
    for key in OVERRIDES {
        cmd.env_remove(key);
    }
    let output = cmd
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute mcpbridge {}", args.join(" ")))?;

    if cfg!(debug_assertions) {
        eprintln!("{} stdout:\n{}", args.join(" "), String::from_utf8_lossy(&output.stdout));
        eprintln!("{} stderr:\n{}", args.join(" "), String::from_utf8_lossy(&output.stderr));
    }
    Ok(output)
}

fn run_ok(home: &Path, args: &[&str]) -> Result<String> {
    let output = run(home, args)?;
    assert!(
        output.status.success(),
        "mcpbridge {} should succeed\nStatus: {:?}\nSTDERR:\n{}",
        args.join(" "),
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn run_json(home: &Path, args: &[&str]) -> Result<Value> {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let stdout = run_ok(home, &full)?;
    serde_json::from_str(&stdout).context("stdout should be JSON")
}

#[test]
fn given_added_mcp_when_deleted_then_restore_brings_it_back() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let home = tmp.path();

    // GIVEN a remote MCP added to OpenCode
    run_ok(
        home,
        &[
            "add",
            "opencode",
            "weather",
            r#"{"type": "remote", "url": "https://weather.example/mcp"}"#,
            "--description",
            "Forecasts",
        ],
    )?;
    let opencode: Value =
        serde_json::from_str(&fs::read_to_string(home.join(".config/opencode/opencode.json"))?)?;
    assert_eq!(opencode["mcp"]["weather"]["enabled"], json!(true));
    assert_eq!(opencode["mcp"]["weather"]["description"], json!("Forecasts"));

    // WHEN it is backed up, deleted, and restored
    let meta = run_json(home, &["backup", "opencode"])?;
    assert_eq!(meta["item_count"], json!(1));
    assert!(home
        .join(".config/mcpbridge/.mcpbridge-sync/opencode_mcps.json")
        .exists());

    run_ok(home, &["delete", "opencode", "weather"])?;
    let listed = run_json(home, &["list", "--source", "opencode"])?;
    assert_eq!(listed, json!([]));

    let report = run_json(home, &["restore", "opencode", "--name", "weather"])?;
    assert_eq!(report["restored"], json!(["weather"]));

    // THEN the item is live again
    let listed = run_json(home, &["list", "--source", "opencode"])?;
    assert_eq!(listed[0]["name"], json!("weather"));
    assert_eq!(listed[0]["kind"], json!("remote"));
    Ok(())
}

#[test]
fn given_opencode_local_mcp_when_synced_then_claude_gets_native_shape() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let home = tmp.path();

    run_ok(
        home,
        &[
            "add",
            "opencode",
            "git",
            r#"{"type": "local", "command": ["uvx", "mcp-git"], "environment": {"A": "1"}}"#,
        ],
    )?;

    let diff = run_json(home, &["diff"])?;
    assert_eq!(diff["only_in_a"], json!(["git"]));

    run_ok(home, &["sync-all", "--from", "opencode", "--to", "claude"])?;

    let claude: Value = serde_json::from_str(&fs::read_to_string(home.join(".claude.json"))?)?;
    assert_eq!(
        claude["mcpServers"]["git"],
        json!({"type": "stdio", "command": "uvx", "args": ["mcp-git"], "env": {"A": "1"}})
    );

    let diff = run_json(home, &["diff"])?;
    assert_eq!(diff["only_in_a"], json!([]));
    assert_eq!(diff["only_in_b"], json!([]));
    Ok(())
}

#[test]
fn given_invalid_config_when_added_then_command_fails_without_writing() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let home = tmp.path();

    let output = run(home, &["add", "claude", "broken", "{not json"])?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid JSON config"));
    assert!(!home.join(".claude.json").exists());
    Ok(())
}

#[test]
fn given_no_backup_when_restoring_then_command_fails() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let home = tmp.path();

    let info = run_json(home, &["backup-info", "claude"])?;
    assert_eq!(info["state"], json!("no_backup"));

    let output = run(home, &["restore", "claude"])?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No backup found"));
    Ok(())
}

#[test]
fn given_skill_when_toggled_then_oh_my_opencode_records_it() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let home = tmp.path();

    run_ok(home, &["skills", "add", "review", "--description", "Code review"])?;
    run_ok(home, &["skills", "toggle", "review", "--enabled", "false"])?;

    let skills = run_json(home, &["skills", "list"])?;
    assert_eq!(skills[0]["name"], json!("review"));
    assert_eq!(skills[0]["enabled"], json!(false));

    let doc: Value = serde_json::from_str(&fs::read_to_string(
        home.join(".config/opencode/oh-my-opencode.json"),
    )?)?;
    assert_eq!(doc["skills"][0]["source"], json!("global"));
    Ok(())
}

#[test]
fn given_archive_when_configs_change_then_restore_rolls_them_back() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let home = tmp.path();

    // GIVEN one item per source and a skill, archived together
    run_ok(home, &["add", "opencode", "weather", r#"{"url": "https://weather.example/mcp"}"#])?;
    run_ok(home, &["add", "claude", "git", r#"{"command": "uvx", "args": ["mcp-git"]}"#])?;
    run_ok(home, &["skills", "add", "review"])?;
    let info = run_json(home, &["archive", "create"])?;
    let id = info["id"].as_str().context("archive id")?.to_string();
    assert!(home.join(".config/mcpbridge/backups").join(&id).exists());
    assert_eq!(info["skills"], json!(true));

    // WHEN everything is changed afterwards
    run_ok(home, &["delete", "opencode", "weather"])?;
    run_ok(home, &["delete", "claude", "git"])?;
    run_ok(home, &["skills", "remove", "review"])?;

    let listed = run_json(home, &["archive", "list"])?;
    assert_eq!(listed[0]["id"], json!(id));

    // THEN restoring the archive brings all three files back
    run_ok(home, &["archive", "restore", &id])?;
    let opencode = run_json(home, &["list", "--source", "opencode"])?;
    assert_eq!(opencode[0]["name"], json!("weather"));
    let claude = run_json(home, &["list", "--source", "claude"])?;
    assert_eq!(claude[0]["name"], json!("git"));
    let skills = run_json(home, &["skills", "list"])?;
    assert_eq!(skills[0]["name"], json!("review"));

    let output = run(home, &["archive", "restore", "backup_19990101_000000.json"])?;
    assert!(!output.status.success());
    Ok(())
}

#[test]
fn given_skills_when_exported_then_file_holds_the_list() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let home = tmp.path();

    run_ok(home, &["skills", "add", "review", "--description", "Code review"])?;
    run_ok(home, &["skills", "add", "deploy", "--partition", "project"])?;

    let target = home.join("exports/skills.json");
    let summary = run_json(home, &["skills", "export", &target.to_string_lossy()])?;
    assert_eq!(summary["exported"], json!(2));

    let doc: Value = serde_json::from_str(&fs::read_to_string(&target)?)?;
    let names: Vec<_> = doc["skills"]
        .as_array()
        .context("skills array")?
        .iter()
        .map(|s| s["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("review"), json!("deploy")]);
    assert_eq!(doc["skills"][0]["description"], json!("Code review"));
    Ok(())
}
