//! Persistence contract consumed by the engine, plus two implementations.
//!
//! [`MemBackend`] keeps everything in memory for tests and ephemeral use.
//! [`DiskBackend`] reads and writes the real ecosystem config files.

mod disk;
mod memory;

pub use disk::DiskBackend;
pub use memory::MemBackend;

use crate::error::Result;
use async_trait::async_trait;
use mcpbridge_snapshot::{
    ArchiveInfo, McpItem, RestoreReport, SkillConfig, SkillPartition, SnapshotMetadata, Source,
};
use serde_json::Value;
use std::collections::BTreeMap;
use time::macros::format_description;
use time::OffsetDateTime;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Every item of `source`, sorted by name.
    async fn list_configs(&self, source: Source) -> Result<Vec<McpItem>>;
    async fn add_item(
        &self,
        name: &str,
        config: Value,
        source: Source,
        description: Option<String>,
    ) -> Result<()>;
    async fn update_item(
        &self,
        name: &str,
        config: Value,
        source: Source,
        description: Option<String>,
    ) -> Result<()>;
    async fn delete_item(&self, name: &str, source: Source) -> Result<()>;
    /// Upserts `name` into `to`. `config` is in `from`'s format.
    async fn sync_item(&self, name: &str, from: Source, to: Source, config: Value) -> Result<()>;

    /// Snapshots `source`, replacing any previous snapshot.
    async fn backup_source(&self, source: Source) -> Result<SnapshotMetadata>;
    async fn latest_backup(&self, source: Source) -> Result<Option<SnapshotMetadata>>;
    async fn read_backup_content(&self, source: Source) -> Result<BTreeMap<String, Value>>;
    /// Upserts every snapshot item. Live items absent from the snapshot stay.
    async fn restore_all(&self, source: Source) -> Result<RestoreReport>;
    async fn restore_one(&self, source: Source, name: &str) -> Result<RestoreReport>;

    async fn list_skills(&self) -> Result<Vec<SkillConfig>>;
    async fn add_skill(&self, skill: SkillConfig) -> Result<()>;
    /// Replaces the skill with the same name and partition.
    async fn update_skill(&self, skill: SkillConfig) -> Result<()>;
    async fn remove_skill(&self, name: &str, partition: SkillPartition) -> Result<()>;

    /// Archives both sources' complete documents and the skills file.
    async fn create_archive(&self) -> Result<ArchiveInfo>;
    /// Every retained archive, newest first.
    async fn list_archives(&self) -> Result<Vec<ArchiveInfo>>;
    /// Replaces every document the archive holds. Unlike `restore_all`, this
    /// is not additive: items created after the archive are gone afterwards.
    async fn restore_archive(&self, id: &str) -> Result<ArchiveInfo>;
}

/// Version recorded in every archive.
pub const ARCHIVE_VERSION: &str = env!("CARGO_PKG_VERSION");

const ARCHIVE_PREFIX: &str = "backup_";
const ARCHIVE_SUFFIX: &str = ".json";

/// File name of the snapshot of `source`.
pub fn backup_filename(source: Source) -> String {
    format!("{}_mcps.json", source)
}

/// Whether `id` names an archive file. Rejects anything that is not a bare
/// file name.
pub fn is_archive_id(id: &str) -> bool {
    id.starts_with(ARCHIVE_PREFIX)
        && id.ends_with(ARCHIVE_SUFFIX)
        && !id.contains(['/', '\\'])
}

/// Archive file name for `timestamp`, suffixed `_N` when `taken` already
/// holds the plain one (several archives within one second).
pub(crate) fn archive_id(timestamp: &str, taken: impl Fn(&str) -> bool) -> String {
    let base = format!("{ARCHIVE_PREFIX}{timestamp}{ARCHIVE_SUFFIX}");
    if !taken(&base) {
        return base;
    }
    (1u32..)
        .map(|n| format!("{ARCHIVE_PREFIX}{timestamp}_{n}{ARCHIVE_SUFFIX}"))
        .find(|id| !taken(id))
        .unwrap_or(base)
}

fn archive_sequence(info: &ArchiveInfo) -> u32 {
    info.id
        .strip_prefix(ARCHIVE_PREFIX)
        .and_then(|rest| rest.strip_suffix(ARCHIVE_SUFFIX))
        .and_then(|rest| rest.strip_prefix(info.timestamp.as_str()))
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

/// Newest first: by timestamp, then by same-second sequence number.
pub(crate) fn sort_archives(archives: &mut [ArchiveInfo]) {
    archives.sort_by(|a, b| {
        let newer = (b.timestamp.as_str(), archive_sequence(b));
        newer.cmp(&(a.timestamp.as_str(), archive_sequence(a)))
    });
}

/// Returns `(timestamp, created_at)` for a snapshot taken at `at`.
pub(crate) fn stamp(at: OffsetDateTime) -> (String, String) {
    let compact = format_description!("[year][month][day]_[hour][minute][second]");
    let timestamp = at.format(&compact).unwrap_or_default();
    let created_at = at
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    (timestamp, created_at)
}

/// Local time when the offset is known, UTC otherwise.
pub(crate) fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

pub(crate) fn snapshot_metadata(
    source: Source,
    item_count: usize,
    at: OffsetDateTime,
) -> SnapshotMetadata {
    let (timestamp, created_at) = stamp(at);
    SnapshotMetadata {
        filename: backup_filename(source),
        timestamp,
        source,
        item_count,
        created_at,
    }
}
