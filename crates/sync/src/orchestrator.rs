//! Sync orchestrator that copies items between sources.

use crate::diff::compute_diff;
use crate::error::{Error, Result};
use crate::registry::SourceRegistry;
use crate::report::BatchReport;
use crate::single_flight::{Operation, SingleFlight};
use mcpbridge_snapshot::Source;
use serde_json::Value;
use std::sync::Arc;

/// Copies items from one source into the other with upsert semantics.
#[derive(Clone)]
pub struct SyncOrchestrator {
    registry: Arc<SourceRegistry>,
    flights: SingleFlight,
}

impl SyncOrchestrator {
    pub fn new(registry: Arc<SourceRegistry>, flights: SingleFlight) -> Self {
        Self { registry, flights }
    }

    /// Upserts `name` into `to`, then reloads.
    ///
    /// Idempotent: repeating the call with the same arguments leaves `to`
    /// unchanged. `config` is in `from`'s native format.
    pub async fn sync_item(
        &self,
        name: &str,
        from: Source,
        to: Source,
        config: Value,
    ) -> Result<()> {
        if from == to {
            return Err(Error::Validation(format!(
                "cannot sync '{name}' from {from} into itself"
            )));
        }
        if name.trim().is_empty() {
            return Err(Error::Validation("name must not be empty".into()));
        }
        let backend = Arc::clone(self.registry.backend());
        self.registry
            .apply(backend.sync_item(name, from, to, config))
            .await?;
        tracing::info!(%name, %from, %to, "Synced MCP");
        Ok(())
    }

    /// Syncs `names` one after another.
    ///
    /// Not transactional: a failure is recorded and the next name is still
    /// attempted, and items synced before the failure stay synced. Names
    /// missing from `from` count as failures. Only one batch per target runs
    /// at a time.
    pub async fn sync_batch(
        &self,
        names: &[String],
        from: Source,
        to: Source,
    ) -> Result<BatchReport> {
        if from == to {
            return Err(Error::Validation(format!("cannot sync {from} into itself")));
        }
        let _flight = self.flights.try_acquire(Operation::Sync, to)?;

        let mut report = BatchReport::new(from, to);
        for name in names {
            let Some(item) = self.registry.get(from, name).await else {
                report.record_failure(name, Error::not_found(from, name));
                continue;
            };
            match self.sync_item(name, from, to, item.config).await {
                Ok(()) => report.record_success(name),
                Err(err) => {
                    tracing::warn!(%name, %from, %to, error = %err, "Batch sync item failed");
                    report.record_failure(name, err);
                }
            }
        }
        tracing::info!(
            %from,
            %to,
            completed = report.completed,
            failed = report.failures.len(),
            "Batch sync finished"
        );
        Ok(report)
    }

    /// Syncs every item present in `from` but absent from `to`.
    pub async fn sync_missing(&self, from: Source, to: Source) -> Result<BatchReport> {
        let view = self.registry.snapshot().await;
        let diff = compute_diff(view.get(from), view.get(to));
        self.sync_batch(&diff.only_in_a, from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, MemBackend};
    use serde_json::json;

    async fn setup() -> (Arc<MemBackend>, Arc<SourceRegistry>, SyncOrchestrator) {
        let backend = Arc::new(MemBackend::new());
        let registry = Arc::new(SourceRegistry::new(backend.clone()));
        let orchestrator = SyncOrchestrator::new(registry.clone(), SingleFlight::new());
        (backend, registry, orchestrator)
    }

    #[tokio::test]
    async fn same_source_sync_is_rejected() {
        let (_, _, orchestrator) = setup().await;
        let err = orchestrator
            .sync_item("a", Source::Claude, Source::Claude, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn sync_item_overwrites_existing_target() {
        let (backend, registry, orchestrator) = setup().await;
        backend
            .seed(Source::Claude, [("a".to_string(), json!({"url": "old"}))])
            .await;
        orchestrator
            .sync_item("a", Source::OpenCode, Source::Claude, json!({"url": "new"}))
            .await
            .unwrap();
        let item = registry.get(Source::Claude, "a").await.unwrap();
        assert_eq!(item.config, json!({"url": "new"}));
    }

    #[tokio::test]
    async fn batch_continues_past_missing_names() {
        let (backend, registry, orchestrator) = setup().await;
        backend
            .seed(
                Source::OpenCode,
                [
                    ("a".to_string(), json!({"url": "a"})),
                    ("c".to_string(), json!({"url": "c"})),
                ],
            )
            .await;
        registry.load_all().await.unwrap();

        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let report = orchestrator
            .sync_batch(&names, Source::OpenCode, Source::Claude)
            .await
            .unwrap();

        assert_eq!(report.completed, 2);
        assert_eq!(report.attempted, 3);
        assert_eq!(report.first_failure().unwrap().name, "b");
        assert_eq!(registry.names(Source::Claude).await, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn sync_missing_only_copies_absent_names() {
        let (backend, registry, orchestrator) = setup().await;
        backend
            .seed(
                Source::Claude,
                [
                    ("shared".to_string(), json!({"url": "claude"})),
                    ("only".to_string(), json!({"url": "only"})),
                ],
            )
            .await;
        backend
            .seed(Source::OpenCode, [("shared".to_string(), json!({"url": "oc"}))])
            .await;
        registry.load_all().await.unwrap();

        let report = orchestrator
            .sync_missing(Source::Claude, Source::OpenCode)
            .await
            .unwrap();
        assert_eq!(report.synced, vec!["only"]);
        let shared = backend.list_configs(Source::OpenCode).await.unwrap();
        assert_eq!(shared[1].name, "shared");
        assert_eq!(shared[1].config, json!({"url": "oc"}));
    }
}
