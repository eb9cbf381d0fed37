use super::{
    archive_id, backup_filename, is_archive_id, now, snapshot_metadata, sort_archives, stamp,
    Backend, ARCHIVE_VERSION,
};
use crate::adapters::utils::{read_document, write_document};
use crate::adapters::{
    item_from_native, prepare_for_insert, ClaudeAdapter, OpenCodeAdapter, SourceAdapter,
};
use crate::convert::convert_for_target;
use crate::error::{Error, Result};
use anyhow::Context;
use async_trait::async_trait;
use mcpbridge_snapshot::{
    ArchiveInfo, McpItem, RestoreReport, SkillConfig, SkillPartition, SnapshotMetadata, Source,
};
use mcpbridge_state::ConfigPaths;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::sync::Mutex;

/// On-disk layout of `<source>_mcps.json`.
///
/// Files written by older releases carry only `source` and `mcps`; their
/// creation time is taken from the file's modification time.
#[derive(Debug, Serialize, Deserialize)]
struct BackupFile {
    source: Source,
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    mcps: BTreeMap<String, Value>,
}

/// On-disk layout of `backup_<ts>.json`: the three documents verbatim.
/// A missing file at archive time is stored as `null` and left alone on
/// restore.
#[derive(Debug, Serialize, Deserialize)]
struct ArchiveFile {
    timestamp: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    opencode_config: Option<Value>,
    #[serde(default)]
    claude_config: Option<Value>,
    #[serde(default)]
    skills_config: Option<Value>,
}

impl ArchiveFile {
    fn info(&self, id: &str) -> ArchiveInfo {
        ArchiveInfo {
            id: id.to_string(),
            timestamp: self.timestamp.clone(),
            created_at: self.created_at.clone(),
            version: self.version.clone(),
            opencode: self.opencode_config.is_some(),
            claude: self.claude_config.is_some(),
            skills: self.skills_config.is_some(),
        }
    }
}

/// Backend over the real ecosystem config files.
///
/// Every read-modify-write cycle runs under one internal lock, so two
/// mutations through the same backend never interleave on a file.
pub struct DiskBackend {
    opencode: Box<dyn SourceAdapter>,
    claude: Box<dyn SourceAdapter>,
    skills_path: PathBuf,
    backup_dir: PathBuf,
    archive_dir: PathBuf,
    lock: Mutex<()>,
}

impl DiskBackend {
    pub fn new(paths: &ConfigPaths) -> Self {
        Self::with_adapters(
            Box::new(OpenCodeAdapter::with_path(paths.opencode.clone())),
            Box::new(ClaudeAdapter::with_path(paths.claude.clone())),
            paths.skills.clone(),
            paths.backup_dir.clone(),
        )
        .with_archive_dir(paths.archive_dir.clone())
    }

    /// Builds a backend over custom adapters (mocks in tests, alternate formats).
    /// Archives share `backup_dir` until [`Self::with_archive_dir`] says otherwise.
    pub fn with_adapters(
        opencode: Box<dyn SourceAdapter>,
        claude: Box<dyn SourceAdapter>,
        skills_path: PathBuf,
        backup_dir: PathBuf,
    ) -> Self {
        Self {
            opencode,
            claude,
            skills_path,
            archive_dir: backup_dir.clone(),
            backup_dir,
            lock: Mutex::new(()),
        }
    }

    pub fn with_archive_dir(mut self, archive_dir: PathBuf) -> Self {
        self.archive_dir = archive_dir;
        self
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    fn adapter(&self, source: Source) -> &dyn SourceAdapter {
        match source {
            Source::OpenCode => self.opencode.as_ref(),
            Source::Claude => self.claude.as_ref(),
        }
    }

    fn backup_path(&self, source: Source) -> PathBuf {
        self.backup_dir.join(backup_filename(source))
    }

    fn read_servers(&self, source: Source) -> Result<BTreeMap<String, Value>> {
        Ok(self.adapter(source).read_servers()?)
    }

    fn write_servers(&self, source: Source, servers: &BTreeMap<String, Value>) -> Result<()> {
        let report = self.adapter(source).write_servers(servers)?;
        for warning in &report.warnings {
            tracing::warn!(%source, warning = %warning, "Config written with warnings");
        }
        Ok(())
    }

    fn read_backup(&self, source: Source) -> Result<Option<(BackupFile, PathBuf)>> {
        let path = self.backup_path(source);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read backup: {}", path.display()))?;
        let backup: BackupFile = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse backup: {}", path.display()))?;
        if backup.source != source {
            return Err(Error::Backend(format!(
                "backup {} belongs to {}, expected {}",
                path.display(),
                backup.source,
                source
            )));
        }
        Ok(Some((backup, path)))
    }

    fn require_backup(&self, source: Source) -> Result<BackupFile> {
        self.read_backup(source)?
            .map(|(backup, _)| backup)
            .ok_or(Error::NoBackup(source))
    }

    /// Paths archived together, in `ArchiveFile` field order.
    fn archived_paths(&self) -> [PathBuf; 3] {
        [
            self.opencode.config_path(),
            self.claude.config_path(),
            self.skills_path.clone(),
        ]
    }

    fn read_archive(&self, path: &Path) -> Result<ArchiveFile> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read archive: {}", path.display()))?;
        let archive = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse archive: {}", path.display()))?;
        Ok(archive)
    }

    fn read_skills_doc(&self) -> Result<(serde_json::Map<String, Value>, Vec<SkillConfig>)> {
        let doc = read_document(&self.skills_path)?;
        let skills = match doc.get("skills") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value(value.clone()).with_context(|| {
                format!("failed to parse skills in {}", self.skills_path.display())
            })?,
        };
        Ok((doc, skills))
    }

    fn write_skills_doc(
        &self,
        mut doc: serde_json::Map<String, Value>,
        skills: &[SkillConfig],
    ) -> Result<()> {
        let value = serde_json::to_value(skills).context("failed to serialize skills")?;
        doc.insert("skills".into(), value);
        write_document(&self.skills_path, &Value::Object(doc))?;
        Ok(())
    }
}

fn modified_at(path: &Path) -> Option<OffsetDateTime> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(OffsetDateTime::from(modified))
}

fn read_if_present(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(Value::Object(read_document(path)?)))
}

fn skill_scope(partition: SkillPartition) -> String {
    format!("{partition} skills")
}

#[async_trait]
impl Backend for DiskBackend {
    async fn list_configs(&self, source: Source) -> Result<Vec<McpItem>> {
        let _guard = self.lock.lock().await;
        let servers = self.read_servers(source)?;
        tracing::debug!(%source, count = servers.len(), "Loaded MCP configs");
        Ok(servers
            .iter()
            .map(|(name, config)| item_from_native(source, name, config))
            .collect())
    }

    async fn add_item(
        &self,
        name: &str,
        config: Value,
        source: Source,
        description: Option<String>,
    ) -> Result<()> {
        if !config.is_object() {
            return Err(Error::Validation("config must be a JSON object".into()));
        }
        let _guard = self.lock.lock().await;
        let mut servers = self.read_servers(source)?;
        if servers.contains_key(name) {
            return Err(Error::duplicate(source, name));
        }
        let config = prepare_for_insert(source, config, description.as_deref(), true);
        servers.insert(name.to_string(), config);
        self.write_servers(source, &servers)
    }

    async fn update_item(
        &self,
        name: &str,
        config: Value,
        source: Source,
        description: Option<String>,
    ) -> Result<()> {
        if !config.is_object() {
            return Err(Error::Validation("config must be a JSON object".into()));
        }
        let _guard = self.lock.lock().await;
        let mut servers = self.read_servers(source)?;
        if !servers.contains_key(name) {
            return Err(Error::not_found(source, name));
        }
        let config = prepare_for_insert(source, config, description.as_deref(), false);
        servers.insert(name.to_string(), config);
        self.write_servers(source, &servers)
    }

    async fn delete_item(&self, name: &str, source: Source) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut servers = self.read_servers(source)?;
        if servers.remove(name).is_none() {
            return Err(Error::not_found(source, name));
        }
        self.write_servers(source, &servers)
    }

    async fn sync_item(&self, name: &str, from: Source, to: Source, config: Value) -> Result<()> {
        let converted = convert_for_target(&config, from, to);
        if from != to {
            tracing::debug!(%name, %from, %to, "Converted MCP config between formats");
        }
        let _guard = self.lock.lock().await;
        let mut servers = self.read_servers(to)?;
        servers.insert(name.to_string(), converted);
        self.write_servers(to, &servers)
    }

    async fn backup_source(&self, source: Source) -> Result<SnapshotMetadata> {
        let _guard = self.lock.lock().await;
        let mcps = self.read_servers(source)?;
        let metadata = snapshot_metadata(source, mcps.len(), now());
        let file = BackupFile {
            source,
            timestamp: metadata.timestamp.clone(),
            created_at: metadata.created_at.clone(),
            mcps,
        };
        let value = serde_json::to_value(&file).context("failed to serialize backup")?;
        write_document(&self.backup_path(source), &value)?;
        tracing::debug!(path = %self.backup_path(source).display(), "Wrote backup file");
        Ok(metadata)
    }

    async fn latest_backup(&self, source: Source) -> Result<Option<SnapshotMetadata>> {
        let _guard = self.lock.lock().await;
        let Some((backup, path)) = self.read_backup(source)? else {
            return Ok(None);
        };
        let item_count = backup.mcps.len();
        if backup.created_at.is_empty() {
            let at = modified_at(&path).unwrap_or_else(now);
            return Ok(Some(snapshot_metadata(source, item_count, at)));
        }
        Ok(Some(SnapshotMetadata {
            filename: backup_filename(source),
            timestamp: backup.timestamp,
            source,
            item_count,
            created_at: backup.created_at,
        }))
    }

    async fn read_backup_content(&self, source: Source) -> Result<BTreeMap<String, Value>> {
        let _guard = self.lock.lock().await;
        Ok(self.require_backup(source)?.mcps)
    }

    async fn restore_all(&self, source: Source) -> Result<RestoreReport> {
        let _guard = self.lock.lock().await;
        let backup = self.require_backup(source)?;
        let mut servers = self.read_servers(source)?;
        let restored: Vec<String> = backup.mcps.keys().cloned().collect();
        servers.extend(backup.mcps);
        self.write_servers(source, &servers)?;
        Ok(RestoreReport::new(source, restored))
    }

    async fn restore_one(&self, source: Source, name: &str) -> Result<RestoreReport> {
        let _guard = self.lock.lock().await;
        let mut backup = self.require_backup(source)?;
        let config = backup
            .mcps
            .remove(name)
            .ok_or_else(|| Error::not_found(format!("{source} backup"), name))?;
        let mut servers = self.read_servers(source)?;
        servers.insert(name.to_string(), config);
        self.write_servers(source, &servers)?;
        Ok(RestoreReport::new(source, vec![name.to_string()]))
    }

    async fn list_skills(&self) -> Result<Vec<SkillConfig>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_skills_doc()?.1)
    }

    async fn add_skill(&self, skill: SkillConfig) -> Result<()> {
        let _guard = self.lock.lock().await;
        let (doc, mut skills) = self.read_skills_doc()?;
        if skills
            .iter()
            .any(|s| s.name == skill.name && s.partition == skill.partition)
        {
            return Err(Error::duplicate(skill_scope(skill.partition), skill.name));
        }
        skills.push(skill);
        self.write_skills_doc(doc, &skills)
    }

    async fn update_skill(&self, skill: SkillConfig) -> Result<()> {
        let _guard = self.lock.lock().await;
        let (doc, mut skills) = self.read_skills_doc()?;
        let Some(slot) = skills
            .iter_mut()
            .find(|s| s.name == skill.name && s.partition == skill.partition)
        else {
            return Err(Error::not_found(skill_scope(skill.partition), skill.name));
        };
        *slot = skill;
        self.write_skills_doc(doc, &skills)
    }

    async fn remove_skill(&self, name: &str, partition: SkillPartition) -> Result<()> {
        let _guard = self.lock.lock().await;
        let (doc, mut skills) = self.read_skills_doc()?;
        let before = skills.len();
        skills.retain(|s| !(s.name == name && s.partition == partition));
        if skills.len() == before {
            return Err(Error::not_found(skill_scope(partition), name));
        }
        self.write_skills_doc(doc, &skills)
    }

    async fn create_archive(&self) -> Result<ArchiveInfo> {
        let _guard = self.lock.lock().await;
        let [opencode, claude, skills] = self.archived_paths();
        let (timestamp, created_at) = stamp(now());
        let file = ArchiveFile {
            timestamp,
            created_at,
            version: ARCHIVE_VERSION.to_string(),
            opencode_config: read_if_present(&opencode)?,
            claude_config: read_if_present(&claude)?,
            skills_config: read_if_present(&skills)?,
        };
        let id = archive_id(&file.timestamp, |id| self.archive_dir.join(id).exists());
        let path = self.archive_dir.join(&id);
        let value = serde_json::to_value(&file).context("failed to serialize archive")?;
        write_document(&path, &value)?;
        tracing::info!(path = %path.display(), "Wrote config archive");
        Ok(file.info(&id))
    }

    async fn list_archives(&self) -> Result<Vec<ArchiveInfo>> {
        let _guard = self.lock.lock().await;
        if !self.archive_dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.archive_dir).with_context(|| {
            format!("failed to read archive directory: {}", self.archive_dir.display())
        })?;
        let mut archives = Vec::new();
        for entry in entries.flatten() {
            let Some(id) = entry.file_name().to_str().map(String::from) else {
                continue;
            };
            if !is_archive_id(&id) {
                continue;
            }
            match self.read_archive(&entry.path()) {
                Ok(file) => archives.push(file.info(&id)),
                Err(err) => tracing::warn!(%id, error = %err, "Skipping unreadable archive"),
            }
        }
        sort_archives(&mut archives);
        Ok(archives)
    }

    async fn restore_archive(&self, id: &str) -> Result<ArchiveInfo> {
        if !is_archive_id(id) {
            return Err(Error::Validation(format!("'{id}' is not an archive name")));
        }
        let _guard = self.lock.lock().await;
        let path = self.archive_dir.join(id);
        if !path.exists() {
            return Err(Error::not_found("archives", id));
        }
        let file = self.read_archive(&path)?;
        let parts = [
            &file.opencode_config,
            &file.claude_config,
            &file.skills_config,
        ];
        // Check every document first so a bad archive writes nothing.
        if parts.iter().any(|doc| doc.as_ref().is_some_and(|d| !d.is_object())) {
            return Err(Error::Backend(format!(
                "archive {} holds a document that is not a JSON object",
                path.display()
            )));
        }
        for (doc, target) in parts.into_iter().zip(self.archived_paths()) {
            if let Some(doc) = doc {
                write_document(&target, doc)?;
            }
        }
        tracing::info!(path = %path.display(), "Restored config archive");
        Ok(file.info(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::traits::MockSourceAdapter;
    use crate::report::WriteReport;
    use serde_json::json;

    fn mock_pair() -> (MockSourceAdapter, MockSourceAdapter) {
        let mut opencode = MockSourceAdapter::new();
        opencode.expect_source().return_const(Source::OpenCode);
        let mut claude = MockSourceAdapter::new();
        claude.expect_source().return_const(Source::Claude);
        (opencode, claude)
    }

    #[tokio::test]
    async fn adapter_read_failure_surfaces_as_backend_error() {
        let (opencode, mut claude) = mock_pair();
        claude
            .expect_read_servers()
            .returning(|| Err(anyhow::anyhow!("permission denied")));
        let tmp = tempfile::tempdir().unwrap();
        let backend = DiskBackend::with_adapters(
            Box::new(opencode),
            Box::new(claude),
            tmp.path().join("skills.json"),
            tmp.path().join("backups"),
        );
        let err = backend.list_configs(Source::Claude).await.unwrap_err();
        assert_eq!(err, Error::Backend("permission denied".into()));
    }

    #[tokio::test]
    async fn sync_converts_before_writing() {
        let (mut opencode, mut claude) = mock_pair();
        opencode.expect_read_servers().never();
        claude
            .expect_read_servers()
            .returning(|| Ok(BTreeMap::new()));
        claude
            .expect_write_servers()
            .withf(|servers| {
                servers.get("fs")
                    == Some(&json!({"type": "stdio", "command": "npx", "args": ["fs"]}))
            })
            .times(1)
            .returning(|servers| {
                Ok(WriteReport {
                    written: servers.len(),
                    warnings: Vec::new(),
                })
            });
        let tmp = tempfile::tempdir().unwrap();
        let backend = DiskBackend::with_adapters(
            Box::new(opencode),
            Box::new(claude),
            tmp.path().join("skills.json"),
            tmp.path().join("backups"),
        );
        backend
            .sync_item(
                "fs",
                Source::OpenCode,
                Source::Claude,
                json!({"type": "local", "command": ["npx", "fs"], "enabled": true}),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn legacy_backup_without_stamps_uses_mtime() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::under_root(tmp.path());
        fs::create_dir_all(&paths.backup_dir).unwrap();
        fs::write(
            paths.backup_dir.join("opencode_mcps.json"),
            r#"{"source": "opencode", "mcps": {"a": {}, "b": {}}}"#,
        )
        .unwrap();

        let backend = DiskBackend::new(&paths);
        let meta = backend
            .latest_backup(Source::OpenCode)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(meta.item_count, 2);
        assert_eq!(meta.filename, "opencode_mcps.json");
        assert_eq!(meta.timestamp.len(), "YYYYMMDD_HHMMSS".len());
        assert!(!meta.created_at.is_empty());
    }

    #[tokio::test]
    async fn backup_for_wrong_source_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::under_root(tmp.path());
        fs::create_dir_all(&paths.backup_dir).unwrap();
        fs::write(
            paths.backup_dir.join("claude_mcps.json"),
            r#"{"source": "opencode", "mcps": {}}"#,
        )
        .unwrap();
        let backend = DiskBackend::new(&paths);
        assert!(matches!(
            backend.restore_all(Source::Claude).await,
            Err(Error::Backend(_))
        ));
    }
}
