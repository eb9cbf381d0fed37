//! Shared file helpers for config adapters.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Reads a JSON object document. A missing file reads as `{}`.
pub fn read_document(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Config file not found, treating as empty");
        return Ok(Map::new());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("config file is not a JSON object: {}", path.display()),
    }
}

/// Writes a JSON value, creating parent directories.
///
/// Atomic: the content goes to a sibling temp file that is then renamed over
/// the target, so readers never see a half-written file.
pub fn write_document(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(value).context("failed to serialize config")?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, data)
        .with_context(|| format!("failed to write temp file: {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("failed to rename temp file to: {}", path.display()))?;
    Ok(())
}

/// Reads the object stored under `key`. A missing key reads as empty.
pub fn read_table(path: &Path, key: &str) -> Result<BTreeMap<String, Value>> {
    let doc = read_document(path)?;
    match doc.get(key) {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(table)) => Ok(table
            .iter()
            .map(|(name, config)| (name.clone(), config.clone()))
            .collect()),
        Some(_) => anyhow::bail!("'{}' in {} is not an object", key, path.display()),
    }
}

/// Replaces the object under `key`, preserving every other top-level key.
pub fn write_table(path: &Path, key: &str, table: &BTreeMap<String, Value>) -> Result<()> {
    let mut doc = read_document(path)?;
    let entries: Map<String, Value> = table
        .iter()
        .map(|(name, config)| (name.clone(), config.clone()))
        .collect();
    doc.insert(key.to_string(), Value::Object(entries));
    write_document(path, &Value::Object(doc))
}

/// Computes a SHA-256 hash of the given content, returning a lowercase hex string.
pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn missing_file_reads_empty() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("absent.json");
        assert!(read_document(&path).unwrap().is_empty());
        assert!(read_table(&path, "mcp").unwrap().is_empty());
    }

    #[test]
    fn write_table_preserves_other_keys() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested/opencode.json");
        write_document(&path, &json!({"$schema": "s", "theme": "dark", "mcp": {"old": {}}}))
            .unwrap();

        let mut table = BTreeMap::new();
        table.insert("new".to_string(), json!({"url": "https://x"}));
        write_table(&path, "mcp", &table).unwrap();

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["theme"], "dark");
        assert_eq!(doc["$schema"], "s");
        assert_eq!(doc["mcp"], json!({"new": {"url": "https://x"}}));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn malformed_file_is_an_error_with_path() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, "{ nope").unwrap();
        let err = read_document(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }

    #[test]
    fn non_object_table_is_an_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("c.json");
        fs::write(&path, r#"{"mcpServers": []}"#).unwrap();
        assert!(read_table(&path, "mcpServers").is_err());
    }

    #[test]
    fn test_hash_content() {
        let hash = hash_content(b"hello");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
