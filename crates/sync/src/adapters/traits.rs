//! Trait definition for source adapters.

use crate::report::WriteReport;
use anyhow::Result;
use mcpbridge_snapshot::Source;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[cfg(test)]
use mockall::automock;

/// Reads and writes the MCP table of one ecosystem's native config file.
#[cfg_attr(test, automock)]
pub trait SourceAdapter: Send + Sync {
    /// Ecosystem this adapter serves.
    fn source(&self) -> Source;

    /// Native config file (e.g., ~/.claude.json)
    fn config_path(&self) -> PathBuf;

    /// Reads every MCP entry, keyed by name, in native format.
    fn read_servers(&self) -> Result<BTreeMap<String, Value>>;

    /// Replaces the MCP table. Other keys of the file are preserved.
    fn write_servers(&self, servers: &BTreeMap<String, Value>) -> Result<WriteReport>;
}
