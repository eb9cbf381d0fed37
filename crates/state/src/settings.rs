use crate::env::{
    default_archive_dir, default_backup_dir, default_claude_config, default_opencode_config,
    default_skills_config, env_path, settings_file, ENV_ARCHIVE_DIR, ENV_BACKUP_DIR,
    ENV_CLAUDE_CONFIG, ENV_OPENCODE_CONFIG, ENV_SKILLS_CONFIG,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// User settings parsed from `settings.json`.
///
/// Every field is optional; anything unset falls back to the platform default.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub opencode_config: Option<PathBuf>,
    #[serde(default)]
    pub claude_config: Option<PathBuf>,
    #[serde(default)]
    pub skills_config: Option<PathBuf>,
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,
}

/// Loads settings from disk if available.
///
/// A missing file yields defaults. So does an unparseable one, with a warning,
/// so a broken settings file never blocks access to the MCP configs.
pub fn load_settings() -> Result<Settings> {
    let Some(path) = settings_file() else {
        return Ok(Settings::default());
    };
    load_settings_from(&path)
}

/// Loads settings from an explicit path.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let text = fs::read_to_string(path)?;
    match serde_json::from_str::<Settings>(&text) {
        Ok(settings) => Ok(settings),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "Ignoring unparseable settings file"
            );
            Ok(Settings::default())
        }
    }
}

/// Resolved locations of every file the disk backend touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPaths {
    pub opencode: PathBuf,
    pub claude: PathBuf,
    pub skills: PathBuf,
    /// Per-source `<source>_mcps.json` backups.
    pub backup_dir: PathBuf,
    /// Timestamped `backup_<ts>.json` archives of all three files.
    pub archive_dir: PathBuf,
}

impl ConfigPaths {
    /// Resolves paths from env vars, then `settings.json`, then defaults.
    pub fn resolve() -> Result<Self> {
        let settings = load_settings()?;
        Self::resolve_with(&settings)
    }

    /// Resolves paths from env vars, then the given settings, then defaults.
    pub fn resolve_with(settings: &Settings) -> Result<Self> {
        let pick = |key: &str, configured: &Option<PathBuf>, fallback: fn() -> Result<PathBuf>| {
            match env_path(key).or_else(|| configured.clone()) {
                Some(path) => Ok(path),
                None => fallback(),
            }
        };
        Ok(Self {
            opencode: pick(
                ENV_OPENCODE_CONFIG,
                &settings.opencode_config,
                default_opencode_config,
            )?,
            claude: pick(ENV_CLAUDE_CONFIG, &settings.claude_config, default_claude_config)?,
            skills: pick(ENV_SKILLS_CONFIG, &settings.skills_config, default_skills_config)?,
            backup_dir: pick(ENV_BACKUP_DIR, &settings.backup_dir, default_backup_dir)?,
            archive_dir: pick(ENV_ARCHIVE_DIR, &settings.archive_dir, default_archive_dir)?,
        })
    }

    /// Lays every file out under a single root (tests, portable setups).
    pub fn under_root(root: &Path) -> Self {
        Self {
            opencode: root.join(".config/opencode/opencode.json"),
            claude: root.join(".claude.json"),
            skills: root.join(".config/opencode/oh-my-opencode.json"),
            backup_dir: root.join(".config/mcpbridge/.mcpbridge-sync"),
            archive_dir: root.join(".config/mcpbridge/backups"),
        }
    }
}
