use anyhow::Result;
use std::path::PathBuf;

/// Overrides the OpenCode config file (`opencode.json`).
pub const ENV_OPENCODE_CONFIG: &str = "MCPBRIDGE_OPENCODE_CONFIG";
/// Overrides the Claude Code config file (`.claude.json`).
pub const ENV_CLAUDE_CONFIG: &str = "MCPBRIDGE_CLAUDE_CONFIG";
/// Overrides the skills file (`oh-my-opencode.json`).
pub const ENV_SKILLS_CONFIG: &str = "MCPBRIDGE_SKILLS_CONFIG";
/// Overrides the directory holding per-source MCP backups.
pub const ENV_BACKUP_DIR: &str = "MCPBRIDGE_BACKUP_DIR";
/// Overrides the directory holding full-configuration archives.
pub const ENV_ARCHIVE_DIR: &str = "MCPBRIDGE_ARCHIVE_DIR";
/// Overrides the location of `settings.json`.
pub const ENV_SETTINGS: &str = "MCPBRIDGE_SETTINGS";

/// Returns the user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    #[cfg(unix)]
    if let Ok(home) = std::env::var("HOME") {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("home directory not found"))
}

/// Reads a path-valued environment variable, ignoring empty values.
pub fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// Checks if `MCPBRIDGE_JSON` is set to true (machine-readable CLI output).
pub fn env_json_output() -> bool {
    std::env::var("MCPBRIDGE_JSON")
        .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Base directory for OpenCode files.
///
/// Windows keeps them under the roaming config dir; everything else uses
/// `~/.config/opencode`.
fn opencode_dir() -> Result<PathBuf> {
    if cfg!(target_os = "windows") {
        if let Some(dir) = dirs::config_dir() {
            return Ok(dir.join("opencode"));
        }
    }
    Ok(home_dir()?.join(".config").join("opencode"))
}

/// Base directory for mcpbridge's own files.
pub fn app_dir() -> Result<PathBuf> {
    if cfg!(target_os = "windows") {
        if let Some(dir) = dirs::config_dir() {
            return Ok(dir.join("mcpbridge"));
        }
    }
    Ok(home_dir()?.join(".config").join("mcpbridge"))
}

pub fn default_opencode_config() -> Result<PathBuf> {
    Ok(opencode_dir()?.join("opencode.json"))
}

pub fn default_skills_config() -> Result<PathBuf> {
    Ok(opencode_dir()?.join("oh-my-opencode.json"))
}

pub fn default_claude_config() -> Result<PathBuf> {
    Ok(home_dir()?.join(".claude.json"))
}

pub fn default_backup_dir() -> Result<PathBuf> {
    Ok(app_dir()?.join(".mcpbridge-sync"))
}

pub fn default_archive_dir() -> Result<PathBuf> {
    Ok(app_dir()?.join("backups"))
}

/// Returns the path to `settings.json`.
pub fn settings_file() -> Option<PathBuf> {
    if let Some(custom) = env_path(ENV_SETTINGS) {
        return Some(custom);
    }
    app_dir().ok().map(|dir| dir.join("settings.json"))
}
