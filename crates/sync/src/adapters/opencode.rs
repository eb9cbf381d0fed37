//! OpenCode adapter for reading/writing the `mcp` table of opencode.json.

use super::traits::SourceAdapter;
use super::utils::{read_table, write_table};
use crate::report::WriteReport;
use anyhow::Result;
use mcpbridge_snapshot::Source;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

const TABLE_KEY: &str = "mcp";

/// Adapter for OpenCode configuration.
pub struct OpenCodeAdapter {
    path: PathBuf,
}

impl OpenCodeAdapter {
    /// Creates a new OpenCodeAdapter with the platform default path.
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: mcpbridge_state::ConfigPaths::resolve()?.opencode,
        })
    }

    /// Creates an OpenCodeAdapter reading an explicit file.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SourceAdapter for OpenCodeAdapter {
    fn source(&self) -> Source {
        Source::OpenCode
    }

    fn config_path(&self) -> PathBuf {
        self.path.clone()
    }

    fn read_servers(&self) -> Result<BTreeMap<String, Value>> {
        read_table(&self.path, TABLE_KEY)
    }

    fn write_servers(&self, servers: &BTreeMap<String, Value>) -> Result<WriteReport> {
        let mut report = WriteReport::default();
        for (name, config) in servers {
            if config.get("command").is_some_and(Value::is_string) {
                report.warnings.push(format!(
                    "'{name}' uses a string command; OpenCode expects an array"
                ));
            }
        }
        write_table(&self.path, TABLE_KEY, servers)?;
        report.written = servers.len();
        tracing::debug!(
            path = %self.path.display(),
            written = report.written,
            "Wrote OpenCode MCP servers"
        );
        Ok(report)
    }
}
