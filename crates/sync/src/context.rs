//! Owned application context wiring every component to one backend.

use crate::backend::{Backend, DiskBackend, MemBackend};
use crate::backup::BackupManager;
use crate::orchestrator::SyncOrchestrator;
use crate::registry::SourceRegistry;
use crate::single_flight::SingleFlight;
use crate::skills::SkillRegistry;
use mcpbridge_state::ConfigPaths;
use std::sync::Arc;

/// Built once by the entry point (or per test) and passed by reference.
/// Components share the backend, the registry and the single-flight set.
pub struct AppContext {
    backend: Arc<dyn Backend>,
    registry: Arc<SourceRegistry>,
    orchestrator: SyncOrchestrator,
    backups: BackupManager,
    skills: SkillRegistry,
}

impl AppContext {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let flights = SingleFlight::new();
        let registry = Arc::new(SourceRegistry::new(Arc::clone(&backend)));
        Self {
            orchestrator: SyncOrchestrator::new(Arc::clone(&registry), flights.clone()),
            backups: BackupManager::new(Arc::clone(&registry), flights),
            skills: SkillRegistry::new(Arc::clone(&backend)),
            registry,
            backend,
        }
    }

    /// Context over the real config files at `paths`.
    pub fn from_paths(paths: &ConfigPaths) -> Self {
        Self::new(Arc::new(DiskBackend::new(paths)))
    }

    /// Isolated in-memory context.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemBackend::new()))
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn orchestrator(&self) -> &SyncOrchestrator {
        &self.orchestrator
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    pub fn skills(&self) -> &SkillRegistry {
        &self.skills
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpbridge_snapshot::Source;

    #[tokio::test]
    async fn contexts_are_isolated() {
        let first = AppContext::in_memory();
        let second = AppContext::in_memory();
        first
            .registry()
            .add("a", "{}", Source::Claude, None)
            .await
            .unwrap();
        second.registry().load_all().await.unwrap();
        assert!(second.registry().items(Source::Claude).await.is_empty());
    }
}
