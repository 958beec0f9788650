//! # History Tracker
//!
//! Per-user record of consulted materials. Entries older than the retention
//! window are purged lazily whenever the user lists their history.

use std::sync::Arc;

use chrono::{Duration, Utc};
use domains::visibility;
use domains::{
    DomainError, HistoryEntry, HistoryRepository, MaterialId, MaterialRepository, Result, UserId,
};

use crate::roles::RoleResolver;
use crate::Ports;

#[derive(Clone)]
pub struct HistoryTracker {
    history: Arc<dyn HistoryRepository>,
    materials: Arc<dyn MaterialRepository>,
    roles: RoleResolver,
    retention: Duration,
}

impl HistoryTracker {
    pub fn new(ports: &Ports, roles: RoleResolver, retention: Duration) -> Self {
        Self {
            history: ports.history.clone(),
            materials: ports.materials.clone(),
            roles,
            retention,
        }
    }

    /// Hidden materials are reported as missing, exactly as on direct access.
    pub async fn record_view(&self, user_id: UserId, material_id: MaterialId) -> Result<()> {
        let role = self.roles.resolve(Some(user_id)).await?;
        let visible = self
            .materials
            .find(material_id)
            .await?
            .is_some_and(|m| m.is_visible_to(role));
        if !visible {
            return Err(DomainError::not_found("material", material_id));
        }
        self.history.record(user_id, material_id, Utc::now()).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, user_id: UserId) -> Result<Vec<HistoryEntry>> {
        let cutoff = Utc::now() - self.retention;
        let purged = self.history.purge_before(user_id, cutoff).await?;
        if purged > 0 {
            tracing::info!(user_id, purged, "purged stale history entries");
        }

        let role = self.roles.resolve(Some(user_id)).await?;
        let visited = self
            .history
            .list(user_id, visibility::requires_available(role))
            .await?;

        let mut entries = Vec::with_capacity(visited.len());
        for row in visited {
            if !row.material.is_visible_to(role) {
                continue;
            }
            let id = row.material.id;
            entries.push(HistoryEntry {
                material_id: id,
                url: row.material.public_url(),
                name: row.material.name,
                file_type: row.material.file_type,
                last_consulted: row.last_consulted,
                authors: self.materials.authors_of(id).await?,
                tags: self.materials.tags_of(id).await?,
            });
        }
        Ok(entries)
    }

    pub async fn remove(&self, user_id: UserId, material_id: MaterialId) -> Result<()> {
        if self.history.remove(user_id, material_id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found(
                "history entry",
                format!("{user_id}/{material_id}"),
            ))
        }
    }

    /// Returns how many entries were removed.
    pub async fn clear(&self, user_id: UserId) -> Result<u64> {
        match self.history.clear(user_id).await? {
            0 => Err(DomainError::not_found("history", user_id)),
            removed => {
                tracing::info!(user_id, removed, "history cleared");
                Ok(removed)
            }
        }
    }
}
