//! # Material Catalog
//!
//! Read side of the repository: hydrates materials with their authors and
//! tags and applies the visibility policy at every boundary. Ids come from
//! the storage query (whose WHERE clause is authoritative); each hydrated row
//! is gated again before it is returned.

use std::sync::Arc;

use chrono::Utc;
use domains::visibility;
use domains::{
    AuthorId, AuthorRepository, DomainError, FavoriteRepository, FileStore, HistoryRepository,
    Material, MaterialDetail, MaterialFile, MaterialFilter, MaterialId, MaterialRepository,
    Result, Role, TagId, TagRepository, UserId,
};

use crate::roles::RoleResolver;
use crate::Ports;

/// Optional search inputs; all categories combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub material_name: Option<String>,
    pub author_name: Option<String>,
    pub tag_ids: Vec<TagId>,
}

impl SearchQuery {
    pub fn into_filter(self, role: Role) -> MaterialFilter {
        MaterialFilter::new()
            .name_contains(self.material_name.as_deref())
            .author_query(self.author_name.as_deref())
            .with_any_tag(self.tag_ids)
            .visible_to(role)
    }
}

#[derive(Clone)]
pub struct MaterialCatalog {
    materials: Arc<dyn MaterialRepository>,
    authors: Arc<dyn AuthorRepository>,
    tags: Arc<dyn TagRepository>,
    favorites: Arc<dyn FavoriteRepository>,
    history: Arc<dyn HistoryRepository>,
    files: Arc<dyn FileStore>,
    roles: RoleResolver,
    viewer_base_url: Option<String>,
}

pub(crate) fn require_user(user_id: Option<UserId>) -> Result<UserId> {
    user_id.ok_or_else(|| DomainError::validation("userId is required"))
}

impl MaterialCatalog {
    pub fn new(ports: &Ports, roles: RoleResolver, viewer_base_url: Option<String>) -> Self {
        Self {
            materials: ports.materials.clone(),
            authors: ports.authors.clone(),
            tags: ports.tags.clone(),
            favorites: ports.favorites.clone(),
            history: ports.history.clone(),
            files: ports.files.clone(),
            roles,
            viewer_base_url: viewer_base_url.map(|base| {
                if base.ends_with('/') {
                    base
                } else {
                    format!("{base}/")
                }
            }),
        }
    }

    /// Listing form: no relations hydrated.
    #[tracing::instrument(skip(self))]
    pub async fn list_materials(&self, user_id: Option<UserId>) -> Result<Vec<Material>> {
        let user_id = require_user(user_id)?;
        let role = self.roles.resolve(Some(user_id)).await?;
        let materials = self
            .materials
            .list(visibility::requires_available(role))
            .await?;
        Ok(materials
            .into_iter()
            .filter(|m| m.is_visible_to(role))
            .collect())
    }

    /// Every material with both flags, for the admin review screen.
    pub async fn list_for_review(&self) -> Result<Vec<Material>> {
        self.materials.list(false).await
    }

    /// Detail form. Records a history entry when the material is available.
    #[tracing::instrument(skip(self))]
    pub async fn get_material(
        &self,
        id: MaterialId,
        user_id: Option<UserId>,
    ) -> Result<MaterialDetail> {
        let user_id = require_user(user_id)?;
        let role = self.roles.resolve(Some(user_id)).await?;
        let detail = self.detail(id, role, Some(user_id)).await?;

        if detail.material.available {
            if let Err(err) = self.history.record(user_id, id, Utc::now()).await {
                tracing::warn!(user_id, material_id = id, error = %err, "failed to record history entry");
            }
        }
        Ok(detail)
    }

    /// Hydrated material, or `NotFound` when absent or hidden from `role`.
    pub async fn detail(
        &self,
        id: MaterialId,
        role: Role,
        viewer: Option<UserId>,
    ) -> Result<MaterialDetail> {
        self.hydrate(id, role, viewer)
            .await?
            .ok_or_else(|| DomainError::not_found("material", id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn materials_by_author(
        &self,
        author_id: AuthorId,
        user_id: Option<UserId>,
    ) -> Result<Vec<MaterialDetail>> {
        if self.authors.find(author_id).await?.is_none() {
            return Err(DomainError::not_found("author", author_id));
        }
        let role = self.roles.resolve(user_id).await?;
        let filter = MaterialFilter::new().by_author(author_id).visible_to(role);
        let ids = self.materials.search(&filter).await?;
        self.hydrate_all(ids, role, user_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn materials_by_tag(
        &self,
        tag_id: TagId,
        user_id: Option<UserId>,
    ) -> Result<Vec<MaterialDetail>> {
        if self.tags.find(tag_id).await?.is_none() {
            return Err(DomainError::not_found("tag", tag_id));
        }
        let role = self.roles.resolve(user_id).await?;
        let filter = MaterialFilter::new().with_any_tag([tag_id]).visible_to(role);
        let ids = self.materials.search(&filter).await?;
        self.hydrate_all(ids, role, user_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn search(
        &self,
        query: SearchQuery,
        user_id: Option<UserId>,
    ) -> Result<Vec<MaterialDetail>> {
        let user_id = require_user(user_id)?;
        let role = self.roles.resolve(Some(user_id)).await?;
        let filter = query.into_filter(role);
        tracing::debug!(?filter, "compiled search filter");
        let ids = self.materials.search(&filter).await?;
        self.hydrate_all(ids, role, Some(user_id)).await
    }

    /// Stored content of a PDF or ZIP material, behind the same gate as `get_material`.
    #[tracing::instrument(skip(self))]
    pub async fn material_file(
        &self,
        id: MaterialId,
        user_id: Option<UserId>,
    ) -> Result<MaterialFile> {
        let user_id = require_user(user_id)?;
        let role = self.roles.resolve(Some(user_id)).await?;
        let material = self
            .materials
            .find(id)
            .await?
            .filter(|m| m.is_visible_to(role))
            .ok_or_else(|| DomainError::not_found("material", id))?;
        if !material.file_type.is_stored_file() {
            return Err(DomainError::not_found("material file", id));
        }
        let content = self.files.read(&material.url).await?;
        Ok(MaterialFile {
            file_name: format!(
                "{}.{}",
                material.name,
                material.file_type.as_str().to_ascii_lowercase()
            ),
            file_type: material.file_type,
            content,
        })
    }

    async fn hydrate_all(
        &self,
        ids: Vec<MaterialId>,
        role: Role,
        viewer: Option<UserId>,
    ) -> Result<Vec<MaterialDetail>> {
        let mut details = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(detail) = self.hydrate(id, role, viewer).await? {
                details.push(detail);
            }
        }
        Ok(details)
    }

    async fn hydrate(
        &self,
        id: MaterialId,
        role: Role,
        viewer: Option<UserId>,
    ) -> Result<Option<MaterialDetail>> {
        let Some(material) = self.materials.find(id).await? else {
            return Ok(None);
        };
        if !material.is_visible_to(role) {
            return Ok(None);
        }
        let authors = self.materials.authors_of(id).await?;
        let tags = self.materials.tags_of(id).await?;
        let is_favorite = match viewer {
            Some(user_id) => self.favorites.contains(user_id, id).await?,
            None => false,
        };
        let access_url = self.access_url(&material);
        Ok(Some(MaterialDetail {
            material,
            authors,
            tags,
            is_favorite,
            access_url,
        }))
    }

    fn access_url(&self, material: &Material) -> Option<String> {
        match (&self.viewer_base_url, material.file_type) {
            (Some(base), domains::FileKind::Zip) => Some(format!("{base}view?id={}", material.id)),
            _ => None,
        }
    }
}
