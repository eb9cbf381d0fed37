//! Global/project partitioned skill list.

use crate::backend::Backend;
use crate::error::{Error, Result};
use mcpbridge_snapshot::{SkillConfig, SkillPartition};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct SkillRegistry {
    backend: Arc<dyn Backend>,
    skills: RwLock<Vec<SkillConfig>>,
}

impl SkillRegistry {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            skills: RwLock::new(Vec::new()),
        }
    }

    /// Replaces the cached list with the backend's.
    pub async fn load(&self) -> Result<Vec<SkillConfig>> {
        let skills = self.backend.list_skills().await?;
        tracing::debug!(count = skills.len(), "Reloaded skills");
        *self.skills.write().await = skills.clone();
        Ok(skills)
    }

    /// Cached skills, optionally restricted to one partition.
    pub async fn list(&self, partition: Option<SkillPartition>) -> Vec<SkillConfig> {
        self.skills
            .read()
            .await
            .iter()
            .filter(|s| partition.is_none_or(|p| s.partition == p))
            .cloned()
            .collect()
    }

    pub async fn add(
        &self,
        name: &str,
        description: Option<String>,
        partition: SkillPartition,
    ) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("skill name must not be empty".into()));
        }
        let mut skill = SkillConfig::new(name, partition);
        skill.description = description.filter(|d| !d.trim().is_empty());
        self.backend.add_skill(skill).await?;
        tracing::info!(%name, %partition, "Added skill");
        self.load().await?;
        Ok(())
    }

    /// Changes description and/or enabled flag; `None` keeps the current value.
    pub async fn update(
        &self,
        name: &str,
        partition: SkillPartition,
        description: Option<String>,
        enabled: Option<bool>,
    ) -> Result<()> {
        let mut skill = self.current(name, partition).await?;
        if let Some(description) = description {
            skill.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        if let Some(enabled) = enabled {
            skill.enabled = enabled;
        }
        self.backend.update_skill(skill).await?;
        tracing::info!(%name, %partition, "Updated skill");
        self.load().await?;
        Ok(())
    }

    pub async fn toggle(&self, name: &str, partition: SkillPartition, enabled: bool) -> Result<()> {
        self.update(name, partition, None, Some(enabled)).await
    }

    pub async fn remove(&self, name: &str, partition: SkillPartition) -> Result<()> {
        self.backend.remove_skill(name, partition).await?;
        tracing::info!(%name, %partition, "Removed skill");
        self.load().await?;
        Ok(())
    }

    /// Fresh copy of one skill from the backend.
    async fn current(&self, name: &str, partition: SkillPartition) -> Result<SkillConfig> {
        self.backend
            .list_skills()
            .await?
            .into_iter()
            .find(|s| s.name == name && s.partition == partition)
            .ok_or_else(|| Error::not_found(format!("{partition} skills"), name))
    }
}
