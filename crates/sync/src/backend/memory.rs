use super::{archive_id, now, snapshot_metadata, sort_archives, stamp, Backend, ARCHIVE_VERSION};
use crate::error::{Error, Result};
use async_trait::async_trait;
use mcpbridge_snapshot::{
    ArchiveInfo, BackupSnapshot, McpItem, RestoreReport, SkillConfig, SkillPartition,
    SnapshotMetadata, Source,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

type Table = BTreeMap<String, McpItem>;

struct MemArchive {
    info: ArchiveInfo,
    items: HashMap<Source, Table>,
    skills: Vec<SkillConfig>,
}

#[derive(Default)]
struct MemState {
    items: HashMap<Source, Table>,
    backups: HashMap<Source, BackupSnapshot>,
    archives: Vec<MemArchive>,
    skills: Vec<SkillConfig>,
}

impl MemState {
    fn table(&mut self, source: Source) -> &mut Table {
        self.items.entry(source).or_default()
    }

    fn description_of(&self, source: Source, name: &str) -> Option<String> {
        self.items
            .get(&source)
            .and_then(|table| table.get(name))
            .and_then(|item| item.description.clone())
    }

    /// Upsert used by seed, sync and restore. Without an explicit description
    /// the document's own `description` field is used.
    fn upsert(&mut self, source: Source, name: &str, config: Value, description: Option<String>) {
        let description = description.or_else(|| {
            config
                .get("description")
                .and_then(Value::as_str)
                .map(String::from)
        });
        let enabled = enabled_flag(&config);
        self.table(source).insert(
            name.to_string(),
            McpItem {
                name: name.to_string(),
                config,
                source,
                enabled,
                description,
            },
        );
    }

    fn restore_from(&mut self, source: Source, snapshot: &BackupSnapshot, name: &str) -> bool {
        let Some(config) = snapshot.items.get(name) else {
            return false;
        };
        let description = snapshot.descriptions.get(name).cloned();
        self.upsert(source, name, config.clone(), description);
        true
    }
}

fn enabled_flag(config: &Value) -> bool {
    config.get("enabled").and_then(Value::as_bool).unwrap_or(true)
}

fn require_object(config: &Value) -> Result<()> {
    if config.is_object() {
        Ok(())
    } else {
        Err(Error::Validation("config must be a JSON object".into()))
    }
}

/// In-memory backend for tests and ephemeral sessions.
///
/// Stores documents verbatim; no format conversion happens on sync, so a
/// synced item is identical to its origin (description included).
#[derive(Clone)]
pub struct MemBackend {
    inner: Arc<Mutex<MemState>>,
}

impl Default for MemBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemState::default())),
        }
    }

    /// Seeds items directly, bypassing duplicate checks.
    pub async fn seed(&self, source: Source, items: impl IntoIterator<Item = (String, Value)>) {
        let mut state = self.inner.lock().await;
        for (name, config) in items {
            state.upsert(source, &name, config, None);
        }
    }
}

#[async_trait]
impl Backend for MemBackend {
    async fn list_configs(&self, source: Source) -> Result<Vec<McpItem>> {
        let state = self.inner.lock().await;
        Ok(state
            .items
            .get(&source)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_item(
        &self,
        name: &str,
        config: Value,
        source: Source,
        description: Option<String>,
    ) -> Result<()> {
        require_object(&config)?;
        let mut state = self.inner.lock().await;
        let table = state.table(source);
        if table.contains_key(name) {
            return Err(Error::duplicate(source, name));
        }
        let enabled = enabled_flag(&config);
        table.insert(
            name.to_string(),
            McpItem {
                name: name.to_string(),
                config,
                source,
                enabled,
                description,
            },
        );
        Ok(())
    }

    async fn update_item(
        &self,
        name: &str,
        config: Value,
        source: Source,
        description: Option<String>,
    ) -> Result<()> {
        require_object(&config)?;
        let mut state = self.inner.lock().await;
        let item = state
            .table(source)
            .get_mut(name)
            .ok_or_else(|| Error::not_found(source, name))?;
        item.enabled = enabled_flag(&config);
        item.config = config;
        if description.is_some() {
            item.description = description;
        }
        Ok(())
    }

    async fn delete_item(&self, name: &str, source: Source) -> Result<()> {
        let mut state = self.inner.lock().await;
        state
            .table(source)
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(source, name))
    }

    async fn sync_item(&self, name: &str, from: Source, to: Source, config: Value) -> Result<()> {
        let mut state = self.inner.lock().await;
        let description = state.description_of(from, name);
        state.upsert(to, name, config, description);
        Ok(())
    }

    async fn backup_source(&self, source: Source) -> Result<SnapshotMetadata> {
        let mut state = self.inner.lock().await;
        let table = state.table(source);
        let items: BTreeMap<String, Value> = table
            .iter()
            .map(|(name, item)| (name.clone(), item.config.clone()))
            .collect();
        let descriptions: BTreeMap<String, String> = table
            .iter()
            .filter_map(|(name, item)| Some((name.clone(), item.description.clone()?)))
            .collect();
        let metadata = snapshot_metadata(source, items.len(), now());
        state.backups.insert(
            source,
            BackupSnapshot {
                metadata: metadata.clone(),
                items,
                descriptions,
            },
        );
        Ok(metadata)
    }

    async fn latest_backup(&self, source: Source) -> Result<Option<SnapshotMetadata>> {
        let state = self.inner.lock().await;
        Ok(state.backups.get(&source).map(|b| b.metadata.clone()))
    }

    async fn read_backup_content(&self, source: Source) -> Result<BTreeMap<String, Value>> {
        let state = self.inner.lock().await;
        state
            .backups
            .get(&source)
            .map(|b| b.items.clone())
            .ok_or(Error::NoBackup(source))
    }

    async fn restore_all(&self, source: Source) -> Result<RestoreReport> {
        let mut state = self.inner.lock().await;
        let snapshot = state
            .backups
            .get(&source)
            .cloned()
            .ok_or(Error::NoBackup(source))?;
        let restored: Vec<String> = snapshot.items.keys().cloned().collect();
        for name in &restored {
            state.restore_from(source, &snapshot, name);
        }
        Ok(RestoreReport::new(source, restored))
    }

    async fn restore_one(&self, source: Source, name: &str) -> Result<RestoreReport> {
        let mut state = self.inner.lock().await;
        let snapshot = state
            .backups
            .get(&source)
            .cloned()
            .ok_or(Error::NoBackup(source))?;
        if !state.restore_from(source, &snapshot, name) {
            return Err(Error::not_found(format!("{source} backup"), name));
        }
        Ok(RestoreReport::new(source, vec![name.to_string()]))
    }

    async fn list_skills(&self) -> Result<Vec<SkillConfig>> {
        Ok(self.inner.lock().await.skills.clone())
    }

    async fn add_skill(&self, skill: SkillConfig) -> Result<()> {
        let mut state = self.inner.lock().await;
        if state
            .skills
            .iter()
            .any(|s| s.name == skill.name && s.partition == skill.partition)
        {
            return Err(Error::duplicate(
                format!("{} skills", skill.partition),
                skill.name,
            ));
        }
        state.skills.push(skill);
        Ok(())
    }

    async fn update_skill(&self, skill: SkillConfig) -> Result<()> {
        let mut state = self.inner.lock().await;
        let slot = state
            .skills
            .iter_mut()
            .find(|s| s.name == skill.name && s.partition == skill.partition)
            .ok_or_else(|| {
                Error::not_found(format!("{} skills", skill.partition), skill.name.clone())
            })?;
        *slot = skill;
        Ok(())
    }

    async fn remove_skill(&self, name: &str, partition: SkillPartition) -> Result<()> {
        let mut state = self.inner.lock().await;
        let before = state.skills.len();
        state
            .skills
            .retain(|s| !(s.name == name && s.partition == partition));
        if state.skills.len() == before {
            return Err(Error::not_found(format!("{partition} skills"), name));
        }
        Ok(())
    }

    async fn create_archive(&self) -> Result<ArchiveInfo> {
        let mut state = self.inner.lock().await;
        let (timestamp, created_at) = stamp(now());
        let id = archive_id(&timestamp, |id| state.archives.iter().any(|a| a.info.id == id));
        let info = ArchiveInfo {
            id,
            timestamp,
            created_at,
            version: ARCHIVE_VERSION.to_string(),
            opencode: true,
            claude: true,
            skills: true,
        };
        let archive = MemArchive {
            info: info.clone(),
            items: state.items.clone(),
            skills: state.skills.clone(),
        };
        state.archives.push(archive);
        Ok(info)
    }

    async fn list_archives(&self) -> Result<Vec<ArchiveInfo>> {
        let state = self.inner.lock().await;
        let mut list: Vec<ArchiveInfo> = state.archives.iter().map(|a| a.info.clone()).collect();
        sort_archives(&mut list);
        Ok(list)
    }

    async fn restore_archive(&self, id: &str) -> Result<ArchiveInfo> {
        let mut state = self.inner.lock().await;
        let Some(archive) = state.archives.iter().find(|a| a.info.id == id) else {
            return Err(Error::not_found("archives", id));
        };
        let (info, items, skills) = (
            archive.info.clone(),
            archive.items.clone(),
            archive.skills.clone(),
        );
        state.items = items;
        state.skills = skills;
        Ok(info)
    }
}
