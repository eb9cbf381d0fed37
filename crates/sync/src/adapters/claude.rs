//! Claude Code adapter for reading/writing the `mcpServers` table of ~/.claude.json.

use super::traits::SourceAdapter;
use super::utils::{read_table, write_table};
use crate::report::WriteReport;
use anyhow::Result;
use mcpbridge_snapshot::Source;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

const TABLE_KEY: &str = "mcpServers";

/// Adapter for Claude Code configuration.
pub struct ClaudeAdapter {
    path: PathBuf,
}

impl ClaudeAdapter {
    /// Creates a new ClaudeAdapter with the default path (~/.claude.json).
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: mcpbridge_state::home_dir()?.join(".claude.json"),
        })
    }

    /// Creates a ClaudeAdapter reading an explicit file.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SourceAdapter for ClaudeAdapter {
    fn source(&self) -> Source {
        Source::Claude
    }

    fn config_path(&self) -> PathBuf {
        self.path.clone()
    }

    fn read_servers(&self) -> Result<BTreeMap<String, Value>> {
        let servers = read_table(&self.path, TABLE_KEY)?;
        for (name, config) in &servers {
            if let Some(kind) = config.get("type").and_then(Value::as_str) {
                if !matches!(kind, "stdio" | "http" | "sse") {
                    tracing::warn!(unknown_type = kind, name = %name, "Unknown MCP server type");
                }
            }
        }
        Ok(servers)
    }

    fn write_servers(&self, servers: &BTreeMap<String, Value>) -> Result<WriteReport> {
        let mut report = WriteReport::default();
        for (name, config) in servers {
            if config.get("command").is_none() && config.get("url").is_none() {
                report
                    .warnings
                    .push(format!("'{name}' has neither command nor url"));
            }
        }
        write_table(&self.path, TABLE_KEY, servers)?;
        report.written = servers.len();
        tracing::debug!(
            path = %self.path.display(),
            written = report.written,
            "Wrote Claude MCP servers"
        );
        Ok(report)
    }
}
