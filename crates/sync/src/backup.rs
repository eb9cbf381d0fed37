//! Point-in-time snapshots per source.
//!
//! At most one snapshot is retained per source; a new backup replaces the
//! previous one. Restores are additive and never delete live items.

use crate::error::Result;
use crate::registry::SourceRegistry;
use crate::single_flight::{Operation, SingleFlight};
use mcpbridge_snapshot::{ArchiveInfo, RestoreReport, SnapshotMetadata, Source};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupState {
    NoBackup,
    BackupAvailable,
}

#[derive(Clone)]
pub struct BackupManager {
    registry: Arc<SourceRegistry>,
    flights: SingleFlight,
}

impl BackupManager {
    pub fn new(registry: Arc<SourceRegistry>, flights: SingleFlight) -> Self {
        Self { registry, flights }
    }

    /// Snapshots every live item of `source`.
    ///
    /// Rejected with [`crate::Error::InFlight`] while another backup of the
    /// same source is running; the rejected call makes no backend request.
    pub async fn backup(&self, source: Source) -> Result<SnapshotMetadata> {
        let _flight = self.flights.try_acquire(Operation::Backup, source)?;
        let backend = Arc::clone(self.registry.backend());
        let metadata = self.registry.track(backend.backup_source(source)).await?;
        tracing::info!(
            %source,
            items = metadata.item_count,
            timestamp = %metadata.timestamp,
            "Backed up MCPs"
        );
        Ok(metadata)
    }

    pub async fn latest_backup(&self, source: Source) -> Result<Option<SnapshotMetadata>> {
        self.registry.backend().latest_backup(source).await
    }

    pub async fn state(&self, source: Source) -> Result<BackupState> {
        Ok(match self.latest_backup(source).await? {
            Some(_) => BackupState::BackupAvailable,
            None => BackupState::NoBackup,
        })
    }

    /// Items of the retained snapshot, keyed by name.
    pub async fn read_backup_content(&self, source: Source) -> Result<BTreeMap<String, Value>> {
        self.registry.backend().read_backup_content(source).await
    }

    /// Upserts every snapshot item into the live configuration.
    pub async fn restore_all(&self, source: Source) -> Result<RestoreReport> {
        let _flight = self.flights.try_acquire(Operation::Restore, source)?;
        let backend = Arc::clone(self.registry.backend());
        let report = self.registry.apply(backend.restore_all(source)).await?;
        tracing::info!(%source, restored = report.restored.len(), "Restored MCPs from backup");
        Ok(report)
    }

    /// Upserts a single snapshot item. Fails `NotFound` without touching
    /// live state when the snapshot does not contain `name`.
    pub async fn restore_one(&self, source: Source, name: &str) -> Result<RestoreReport> {
        let _flight = self.flights.try_acquire(Operation::Restore, source)?;
        let backend = Arc::clone(self.registry.backend());
        let report = self.registry.apply(backend.restore_one(source, name)).await?;
        tracing::info!(%source, %name, "Restored MCP from backup");
        Ok(report)
    }

    /// Archives the complete config files of both sources and the skills
    /// file. Earlier archives are kept.
    pub async fn archive(&self) -> Result<ArchiveInfo> {
        let _flights = self.flights.try_acquire_all(Operation::Backup)?;
        let backend = Arc::clone(self.registry.backend());
        let info = self.registry.track(backend.create_archive()).await?;
        tracing::info!(id = %info.id, "Archived configuration");
        Ok(info)
    }

    /// Retained archives, newest first.
    pub async fn list_archives(&self) -> Result<Vec<ArchiveInfo>> {
        self.registry.backend().list_archives().await
    }

    /// Replaces both sources and the skills file with the archived documents,
    /// then reloads the MCP view. A loaded [`crate::SkillRegistry`] must be
    /// reloaded by its owner.
    pub async fn restore_archive(&self, id: &str) -> Result<ArchiveInfo> {
        let _flights = self.flights.try_acquire_all(Operation::Restore)?;
        let backend = Arc::clone(self.registry.backend());
        let info = self.registry.apply(backend.restore_archive(id)).await?;
        tracing::info!(id = %info.id, "Restored configuration archive");
        Ok(info)
    }
}
