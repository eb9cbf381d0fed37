//! Shared test utilities for mcpbridge crates.
//!
//! Provides env-var guards for tests that touch process-global state, a temp
//! HOME laid out like a real machine, and sample MCP documents.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

/// Serialize tests that mutate process-global state (env vars, cwd, etc).
pub fn env_guard() -> MutexGuard<'static, ()> {
    static TEST_SERIAL: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    TEST_SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// Restores an environment variable to its previous value on drop.
pub struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

/// Sets (or removes, with `None`) an environment variable until the guard drops.
///
/// ```
/// let _guard = mcpbridge_test_utils::set_env_var("MCPBRIDGE_DOC_VAR", Some("value"));
/// assert_eq!(std::env::var("MCPBRIDGE_DOC_VAR").unwrap(), "value");
/// ```
pub fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
    let previous = std::env::var(key).ok();
    match value {
        Some(val) => std::env::set_var(key, val),
        None => std::env::remove_var(key),
    }
    EnvVarGuard { key, previous }
}

/// A remote (URL) item as OpenCode writes it.
pub fn remote_config(url: &str) -> Value {
    json!({ "type": "remote", "url": url })
}

/// A local (command) item in Claude Code's `command` + `args` shape.
pub fn local_config(command: &str, args: &[&str]) -> Value {
    json!({ "command": command, "args": args })
}

/// Temp HOME with the config layout the disk backend expects.
///
/// The tempdir is removed when the fixture drops.
pub struct TestFixture {
    pub tempdir: tempfile::TempDir,
    /// `$HOME/.config/opencode/opencode.json`
    pub opencode_config: PathBuf,
    /// `$HOME/.claude.json`
    pub claude_config: PathBuf,
    /// `$HOME/.config/opencode/oh-my-opencode.json`
    pub skills_config: PathBuf,
    /// `$HOME/.config/mcpbridge/.mcpbridge-sync`
    pub backup_dir: PathBuf,
    /// `$HOME/.config/mcpbridge/backups`
    pub archive_dir: PathBuf,
}

impl TestFixture {
    /// Creates the directories; no config file is written yet.
    pub fn new() -> std::io::Result<Self> {
        let tempdir = tempfile::tempdir()?;
        let root = tempdir.path().to_path_buf();
        let opencode_dir = root.join(".config/opencode");
        std::fs::create_dir_all(&opencode_dir)?;

        Ok(Self {
            opencode_config: opencode_dir.join("opencode.json"),
            claude_config: root.join(".claude.json"),
            skills_config: opencode_dir.join("oh-my-opencode.json"),
            backup_dir: root.join(".config/mcpbridge/.mcpbridge-sync"),
            archive_dir: root.join(".config/mcpbridge/backups"),
            tempdir,
        })
    }

    pub fn home_path(&self) -> &Path {
        self.tempdir.path()
    }

    /// Points HOME at the fixture until the guard drops.
    pub fn home_guard(&self) -> EnvVarGuard {
        set_env_var("HOME", Some(&self.home_path().to_string_lossy()))
    }

    /// Writes `opencode.json` with the given `mcp` table plus an unrelated key.
    pub fn write_opencode(&self, mcp: Value) -> std::io::Result<()> {
        let doc = json!({
            "$schema": "https://opencode.ai/config.json",
            "mcp": mcp,
        });
        write_json(&self.opencode_config, &doc)
    }

    /// Writes `.claude.json` with the given `mcpServers` table plus unrelated keys.
    pub fn write_claude(&self, servers: Value) -> std::io::Result<()> {
        let doc = json!({
            "numStartups": 3,
            "mcpServers": servers,
        });
        write_json(&self.claude_config, &doc)
    }

    /// Writes `oh-my-opencode.json` with the given `skills` array plus an unrelated key.
    pub fn write_skills(&self, skills: Value) -> std::io::Result<()> {
        let doc = json!({
            "agents": {"oracle": {"model": "gpt"}},
            "skills": skills,
        });
        write_json(&self.skills_config, &doc)
    }

    /// Reads a JSON file written by the code under test.
    pub fn read_json(&self, path: &Path) -> std::io::Result<Value> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(std::io::Error::other)
    }
}

fn write_json(path: &Path, value: &Value) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    std::fs::write(path, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_env_var_restores_previous_value() {
        let _g = env_guard();

        const KEY: &str = "MCPBRIDGE_TEST_RESTORE_VAR";
        std::env::set_var(KEY, "original");
        {
            let _guard = set_env_var(KEY, Some("changed"));
            assert_eq!(std::env::var(KEY).ok(), Some("changed".to_string()));
        }
        assert_eq!(std::env::var(KEY).ok(), Some("original".to_string()));
        std::env::remove_var(KEY);
    }

    #[test]
    fn set_env_var_none_removes_temporarily() {
        let _g = env_guard();

        const KEY: &str = "MCPBRIDGE_TEST_REMOVE_VAR";
        std::env::set_var(KEY, "exists");
        {
            let _guard = set_env_var(KEY, None);
            assert!(std::env::var(KEY).is_err());
        }
        assert_eq!(std::env::var(KEY).ok(), Some("exists".to_string()));
        std::env::remove_var(KEY);
    }

    #[test]
    fn fixture_writes_both_configs() {
        let fixture = TestFixture::new().unwrap();
        fixture
            .write_opencode(json!({"weather": remote_config("https://x/mcp")}))
            .unwrap();
        fixture
            .write_claude(json!({"fs": local_config("npx", &["-y", "fs"])}))
            .unwrap();

        let opencode = fixture.read_json(&fixture.opencode_config).unwrap();
        assert_eq!(opencode["mcp"]["weather"]["url"], "https://x/mcp");
        let claude = fixture.read_json(&fixture.claude_config).unwrap();
        assert_eq!(claude["mcpServers"]["fs"]["args"], json!(["-y", "fs"]));
        assert_eq!(claude["numStartups"], 3);
    }

    #[test]
    fn fixture_home_guard_restores_home() {
        let _g = env_guard();
        let fixture = TestFixture::new().unwrap();
        let original_home = std::env::var("HOME").ok();
        {
            let _home = fixture.home_guard();
            assert_eq!(
                std::env::var("HOME").unwrap(),
                fixture.home_path().to_string_lossy()
            );
        }
        assert_eq!(std::env::var("HOME").ok(), original_home);
    }
}
