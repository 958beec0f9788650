//! # Favorites Tracker

use std::sync::Arc;

use chrono::Utc;
use domains::visibility;
use domains::{
    DomainError, FavoriteEntry, FavoriteRepository, MaterialId, MaterialRepository, Result,
    UserId,
};

use crate::roles::RoleResolver;
use crate::Ports;

#[derive(Clone)]
pub struct FavoritesTracker {
    favorites: Arc<dyn FavoriteRepository>,
    materials: Arc<dyn MaterialRepository>,
    roles: RoleResolver,
}

impl FavoritesTracker {
    pub fn new(ports: &Ports, roles: RoleResolver) -> Self {
        Self {
            favorites: ports.favorites.clone(),
            materials: ports.materials.clone(),
            roles,
        }
    }

    /// Only materials the user can currently see may be added.
    #[tracing::instrument(skip(self))]
    pub async fn add(&self, user_id: UserId, material_id: MaterialId) -> Result<()> {
        let role = self.roles.resolve(Some(user_id)).await?;
        let visible = self
            .materials
            .find(material_id)
            .await?
            .is_some_and(|m| m.is_visible_to(role));
        if !visible {
            return Err(DomainError::not_found("material", material_id));
        }
        if !self.favorites.add(user_id, material_id, Utc::now()).await? {
            return Err(DomainError::conflict(format!(
                "material {material_id} is already a favorite"
            )));
        }
        tracing::info!(user_id, material_id, "favorite added");
        Ok(())
    }

    pub async fn remove(&self, user_id: UserId, material_id: MaterialId) -> Result<()> {
        if self.favorites.remove(user_id, material_id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found(
                "favorite",
                format!("{user_id}/{material_id}"),
            ))
        }
    }

    pub async fn list(&self, user_id: UserId) -> Result<Vec<FavoriteEntry>> {
        let role = self.roles.resolve(Some(user_id)).await?;
        let rows = self
            .favorites
            .list(user_id, visibility::requires_available(role))
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows.into_iter().filter(|r| r.material.is_visible_to(role)) {
            let id = row.material.id;
            entries.push(FavoriteEntry {
                material_id: id,
                url: row.material.public_url(),
                name: row.material.name,
                file_type: row.material.file_type,
                created_at: row.material.created_at,
                added_at: row.added_at,
                authors: self.materials.authors_of(id).await?,
                tags: self.materials.tags_of(id).await?,
            });
        }
        Ok(entries)
    }

    pub async fn is_favorite(&self, user_id: UserId, material_id: MaterialId) -> Result<bool> {
        self.favorites.contains(user_id, material_id).await
    }

    pub async fn count(&self, material_id: MaterialId) -> Result<i64> {
        if self.materials.find(material_id).await?.is_none() {
            return Err(DomainError::not_found("material", material_id));
        }
        self.favorites.count(material_id).await
    }
}
