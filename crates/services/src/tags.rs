//! # Tag Directory

use std::sync::Arc;

use domains::validation::required_text;
use domains::{DomainError, Result, Tag, TagId, TagRepository};

use crate::Ports;

#[derive(Clone)]
pub struct TagDirectory {
    tags: Arc<dyn TagRepository>,
}

impl TagDirectory {
    pub fn new(ports: &Ports) -> Self {
        Self {
            tags: ports.tags.clone(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Tag>> {
        self.tags.list().await
    }

    pub async fn get(&self, id: TagId) -> Result<Tag> {
        self.tags
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("tag", id))
    }

    pub async fn create(&self, name: &str) -> Result<Tag> {
        let name = required_text("name", name)?;
        let tag = self.tags.create(&name).await?;
        tracing::info!(tag_id = tag.id, name = %tag.name, "tag created");
        Ok(tag)
    }

    pub async fn rename(&self, id: TagId, name: &str) -> Result<Tag> {
        let name = required_text("name", name)?;
        if !self.tags.rename(id, &name).await? {
            return Err(DomainError::not_found("tag", id));
        }
        Ok(Tag { id, name })
    }

    pub async fn delete(&self, id: TagId) -> Result<()> {
        if self.tags.delete(id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found("tag", id))
        }
    }
}
