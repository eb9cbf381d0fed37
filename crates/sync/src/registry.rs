//! In-memory authoritative view of both item collections.

use crate::backend::Backend;
use crate::error::Result;
use crate::normalize::validate_for_submit;
use mcpbridge_snapshot::{McpItem, McpList, Source};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct RegistryState {
    list: McpList,
    loading: bool,
    last_error: Option<String>,
}

/// Holds the last loaded [`McpList`] and routes mutations to the backend.
///
/// State is refreshed wholesale after every successful mutation. A failed
/// call leaves the view exactly as it was, so callers should treat it as
/// stale until the next [`SourceRegistry::load_all`].
pub struct SourceRegistry {
    backend: Arc<dyn Backend>,
    state: RwLock<RegistryState>,
}

impl SourceRegistry {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: RwLock::new(RegistryState::default()),
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Replaces the in-memory view with the backend's current state.
    pub async fn load_all(&self) -> Result<McpList> {
        let list = self
            .track(async {
                let opencode = self.backend.list_configs(Source::OpenCode).await?;
                let claude = self.backend.list_configs(Source::Claude).await?;
                Ok(McpList { opencode, claude })
            })
            .await?;
        tracing::debug!(
            opencode = list.opencode.len(),
            claude = list.claude.len(),
            "Reloaded MCP registry"
        );
        self.state.write().await.list = list.clone();
        Ok(list)
    }

    pub async fn add(
        &self,
        name: &str,
        raw: &str,
        source: Source,
        description: Option<String>,
    ) -> Result<()> {
        let config = validate_for_submit(name, raw)?;
        self.apply(self.backend.add_item(name, config, source, description))
            .await?;
        tracing::info!(%source, %name, "Added MCP");
        Ok(())
    }

    pub async fn update(
        &self,
        name: &str,
        raw: &str,
        source: Source,
        description: Option<String>,
    ) -> Result<()> {
        let config = validate_for_submit(name, raw)?;
        self.apply(self.backend.update_item(name, config, source, description))
            .await?;
        tracing::info!(%source, %name, "Updated MCP");
        Ok(())
    }

    /// Permanently removes an item.
    pub async fn delete(&self, name: &str, source: Source) -> Result<()> {
        self.apply(self.backend.delete_item(name, source)).await?;
        tracing::info!(%source, %name, "Deleted MCP");
        Ok(())
    }

    /// Runs a backend mutation, then reloads on success.
    pub(crate) async fn apply<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        let value = self.track(op).await?;
        self.load_all().await?;
        Ok(value)
    }

    /// Runs a backend call with the loading flag set and records its error.
    pub(crate) async fn track<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        self.state.write().await.loading = true;
        let result = op.await;
        let mut state = self.state.write().await;
        state.loading = false;
        match &result {
            Ok(_) => state.last_error = None,
            Err(err) => {
                tracing::warn!(error = %err, "Backend call failed");
                state.last_error = Some(err.to_string());
            }
        }
        result
    }

    pub async fn items(&self, source: Source) -> Vec<McpItem> {
        self.state.read().await.list.get(source).to_vec()
    }

    pub async fn get(&self, source: Source, name: &str) -> Option<McpItem> {
        self.state.read().await.list.find(source, name).cloned()
    }

    pub async fn names(&self, source: Source) -> Vec<String> {
        self.state
            .read()
            .await
            .list
            .get(source)
            .iter()
            .map(|item| item.name.clone())
            .collect()
    }

    pub async fn snapshot(&self) -> McpList {
        self.state.read().await.list.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemBackend;
    use crate::error::Error;
    use serde_json::json;

    fn registry() -> (Arc<MemBackend>, SourceRegistry) {
        let backend = Arc::new(MemBackend::new());
        let registry = SourceRegistry::new(backend.clone());
        (backend, registry)
    }

    #[tokio::test]
    async fn add_reloads_view() {
        let (_, registry) = registry();
        registry
            .add("weather", r#"{"url": "https://x/mcp"}"#, Source::OpenCode, None)
            .await
            .unwrap();
        assert_eq!(registry.names(Source::OpenCode).await, vec!["weather"]);
        assert!(registry.items(Source::Claude).await.is_empty());
        assert!(!registry.is_loading().await);
    }

    #[tokio::test]
    async fn invalid_submission_never_reaches_backend() {
        let (backend, registry) = registry();
        let err = registry
            .add("x", "{broken", Source::Claude, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(backend.list_configs(Source::Claude).await.unwrap().is_empty());
        // Local validation is not a backend failure.
        assert_eq!(registry.last_error().await, None);
    }

    #[tokio::test]
    async fn load_all_replaces_rather_than_merges() {
        let (backend, registry) = registry();
        backend
            .seed(Source::Claude, [("a".to_string(), json!({}))])
            .await;
        registry.load_all().await.unwrap();
        backend.delete_item("a", Source::Claude).await.unwrap();
        backend
            .seed(Source::Claude, [("b".to_string(), json!({}))])
            .await;
        registry.load_all().await.unwrap();
        assert_eq!(registry.names(Source::Claude).await, vec!["b"]);
    }

    #[tokio::test]
    async fn failed_mutation_keeps_view_and_records_error() {
        let (_, registry) = registry();
        registry
            .add("a", "{}", Source::OpenCode, None)
            .await
            .unwrap();
        let before = registry.snapshot().await;

        let err = registry.delete("missing", Source::OpenCode).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(registry.snapshot().await, before);
        assert_eq!(
            registry.last_error().await.as_deref(),
            Some("'missing' not found in opencode")
        );

        registry.load_all().await.unwrap();
        assert_eq!(registry.last_error().await, None);
    }
}
