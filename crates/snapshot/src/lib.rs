//! Wire-format types for mcpbridge.
//!
//! These types cross the boundary between the engine (`mcpbridge_sync`), the
//! persistence backends and the CLI. They carry no behavior beyond parsing and
//! display helpers so they can be serialized freely.

#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One of the two host ecosystems whose MCP configurations are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// OpenCode (`opencode.json`, `mcp` table)
    OpenCode,
    /// Claude Code (`.claude.json`, `mcpServers` table)
    Claude,
}

impl Source {
    /// Both sources, in a stable order.
    pub const ALL: [Source; 2] = [Source::OpenCode, Source::Claude];

    /// Wire name used in files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenCode => "opencode",
            Self::Claude => "claude",
        }
    }

    /// Human-readable product name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenCode => "OpenCode",
            Self::Claude => "Claude Code",
        }
    }

    /// The opposite ecosystem.
    pub fn other(&self) -> Source {
        match self {
            Self::OpenCode => Self::Claude,
            Self::Claude => Self::OpenCode,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known [`Source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSource(pub String);

impl fmt::Display for UnknownSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown source '{}'. Use 'opencode' or 'claude'", self.0)
    }
}

impl std::error::Error for UnknownSource {}

impl FromStr for Source {
    type Err = UnknownSource;

    /// ```
    /// use mcpbridge_snapshot::Source;
    ///
    /// assert_eq!("OpenCode".parse::<Source>().unwrap(), Source::OpenCode);
    /// assert_eq!("claude".parse::<Source>().unwrap(), Source::Claude);
    /// assert!("codex".parse::<Source>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "opencode" => Ok(Self::OpenCode),
            "claude" | "claude-code" => Ok(Self::Claude),
            _ => Err(UnknownSource(s.to_string())),
        }
    }
}

/// A single named MCP configuration within one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpItem {
    /// Unique within `source`; never renamed.
    pub name: String,
    /// The raw configuration document, kept opaque.
    pub config: Value,
    pub source: Source,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Both item collections, as last loaded from a backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpList {
    pub opencode: Vec<McpItem>,
    pub claude: Vec<McpItem>,
}

impl McpList {
    /// Items of one source.
    pub fn get(&self, source: Source) -> &[McpItem] {
        match source {
            Source::OpenCode => &self.opencode,
            Source::Claude => &self.claude,
        }
    }

    /// Replaces the items of one source wholesale.
    pub fn set(&mut self, source: Source, items: Vec<McpItem>) {
        match source {
            Source::OpenCode => self.opencode = items,
            Source::Claude => self.claude = items,
        }
    }

    /// Looks up an item by name within a source.
    pub fn find(&self, source: Source, name: &str) -> Option<&McpItem> {
        self.get(source).iter().find(|item| item.name == name)
    }

    /// Total number of items across both sources.
    pub fn len(&self) -> usize {
        self.opencode.len() + self.claude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Descriptive metadata of the retained snapshot of one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// File name of the snapshot inside the backup directory.
    pub filename: String,
    /// Compact sortable stamp (`YYYYMMDD_HHMMSS`).
    pub timestamp: String,
    pub source: Source,
    pub item_count: usize,
    /// RFC 3339 creation time.
    pub created_at: String,
}

/// An immutable point-in-time copy of one source's items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub metadata: SnapshotMetadata,
    pub items: BTreeMap<String, Value>,
    /// Item descriptions kept outside the documents, by item name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub descriptions: BTreeMap<String, String>,
}

/// Metadata of a full-configuration archive (`backup_<ts>.json`).
///
/// Unlike a [`BackupSnapshot`], an archive holds the complete OpenCode,
/// Claude Code and skills documents, and any number of them are retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveInfo {
    /// File name, also the identifier passed to restore.
    pub id: String,
    /// Compact sortable stamp (`YYYYMMDD_HHMMSS`).
    pub timestamp: String,
    /// RFC 3339 creation time; empty for archives written by older releases.
    #[serde(default)]
    pub created_at: String,
    /// Version of the tool that wrote the archive.
    #[serde(default)]
    pub version: String,
    /// Which of the three documents the archive holds.
    pub opencode: bool,
    pub claude: bool,
    pub skills: bool,
}

/// Outcome of a restore operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReport {
    pub source: Source,
    /// Names upserted into the live configuration, sorted.
    pub restored: Vec<String>,
    pub message: String,
}

impl RestoreReport {
    /// Builds a report with the standard summary message.
    pub fn new(source: Source, mut restored: Vec<String>) -> Self {
        restored.sort();
        let message = match restored.as_slice() {
            [single] => format!(
                "Successfully restored '{}' to {}",
                single,
                source.display_name()
            ),
            _ => format!(
                "Successfully restored {} MCPs to {}",
                restored.len(),
                source.display_name()
            ),
        };
        Self {
            source,
            restored,
            message,
        }
    }
}

/// Scope a skill is registered in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillPartition {
    #[default]
    Global,
    Project,
}

impl SkillPartition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for SkillPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillPartition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "project" => Ok(Self::Project),
            other => Err(format!(
                "Unknown skill scope '{}'. Use 'global' or 'project'",
                other
            )),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A skill entry. The partition is stored under the `source` key to stay
/// compatible with `oh-my-opencode.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, rename = "source")]
    pub partition: SkillPartition,
}

impl SkillConfig {
    pub fn new(name: impl Into<String>, partition: SkillPartition) -> Self {
        Self {
            name: name.into(),
            description: None,
            enabled: true,
            partition,
        }
    }
}
