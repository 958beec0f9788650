//! # Material Lifecycle
//!
//! Upload, update, the two admin toggles and deletion. Files are written
//! before the storage transaction and discarded again if it fails; old files
//! are removed only after the transaction commits.

use std::sync::Arc;

use domains::validation::{check_institutional_email, required_text};
use domains::{
    parse_flag, AuthorDraft, AuthorId, AuthorRepository, DomainError, FileKind, FileReplacement,
    FileStore, MaterialChanges, MaterialDetail, MaterialId, MaterialRepository, NewMaterial,
    Result, ReviewNotifier, Role, TagId, TagRepository,
};
use tracing::{info, warn};

use crate::catalog::{require_user, MaterialCatalog};
use crate::upload::{Source, UpdateMetadata, UpdateRequest, UploadMetadata, UploadRequest};
use crate::Ports;

#[derive(Clone)]
pub struct MaterialLifecycle {
    materials: Arc<dyn MaterialRepository>,
    authors: Arc<dyn AuthorRepository>,
    tags: Arc<dyn TagRepository>,
    files: Arc<dyn FileStore>,
    notifier: Arc<dyn ReviewNotifier>,
    catalog: MaterialCatalog,
    allowed_email_domains: Arc<[String]>,
}

impl MaterialLifecycle {
    pub fn new(ports: &Ports, catalog: MaterialCatalog, allowed_email_domains: Vec<String>) -> Self {
        Self {
            materials: ports.materials.clone(),
            authors: ports.authors.clone(),
            tags: ports.tags.clone(),
            files: ports.files.clone(),
            notifier: ports.notifier.clone(),
            catalog,
            allowed_email_domains: allowed_email_domains.into(),
        }
    }

    #[tracing::instrument(skip(self, request), fields(user_id = ?request.user_id))]
    pub async fn upload(&self, request: UploadRequest) -> Result<MaterialDetail> {
        let user_id = require_user(request.user_id)?;
        let source = Source::exactly_one(request.file, request.url)?;
        let metadata = UploadMetadata::parse(&request.metadata)?;

        let name = required_text(
            "materialName",
            metadata.material_name.as_deref().unwrap_or_default(),
        )?;
        if metadata.authors.is_empty() {
            return Err(DomainError::validation("at least one author is required"));
        }
        let authors = metadata
            .authors
            .into_iter()
            .map(|draft| self.check_author(draft))
            .collect::<Result<Vec<_>>>()?;
        let tag_ids = dedup(metadata.tag_ids);
        self.ensure_tags_exist(&tag_ids).await?;
        let file_type = source.file_type()?;

        let author_names = authors
            .iter()
            .map(AuthorDraft::full_name)
            .collect::<Vec<_>>()
            .join(", ");
        let url = self.store(source).await?;
        let new_material = NewMaterial {
            name: name.clone(),
            url: url.clone(),
            file_type,
            state: file_type.initial_state(),
            created_by: Some(user_id),
            authors,
            tag_ids,
        };

        let id = match self.materials.create(new_material).await {
            Ok(id) => id,
            Err(err) => {
                if file_type.is_stored_file() {
                    self.discard_file(&url).await;
                }
                return Err(err);
            }
        };
        info!(material_id = id, %file_type, "material uploaded");

        if file_type.needs_review() {
            self.notify(&name, &author_names).await;
        }
        self.catalog.detail(id, Role::Admin, Some(user_id)).await
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update(&self, id: MaterialId, request: UpdateRequest) -> Result<MaterialDetail> {
        let replacement = Source::at_most_one(request.file, request.url)?;
        let metadata = UpdateMetadata::parse(request.metadata.as_deref())?;

        let name = metadata
            .material_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if let Some(author_ids) = &metadata.author_ids {
            if author_ids.is_empty() {
                return Err(DomainError::validation(
                    "a material must keep at least one author",
                ));
            }
            self.ensure_authors_exist(author_ids).await?;
        }
        let author_ids = metadata.author_ids.map(dedup);
        let tag_ids = metadata.tag_ids.map(dedup);
        if let Some(tag_ids) = &tag_ids {
            self.ensure_tags_exist(tag_ids).await?;
        }
        let new_type = replacement.as_ref().map(Source::file_type).transpose()?;

        let existing = self
            .materials
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("material", id))?;

        let file = match (replacement, new_type) {
            (Some(source), Some(file_type)) => Some(FileReplacement {
                url: self.store(source).await?,
                file_type,
                state: file_type.initial_state(),
            }),
            _ => None,
        };
        let new_name = name.clone();
        let changes = MaterialChanges {
            name,
            file: file.clone(),
            author_ids,
            tag_ids,
        };

        let updated = self.materials.update(id, changes).await;
        if !matches!(updated, Ok(true)) {
            if let Some(new_file) = file.as_ref().filter(|f| f.file_type.is_stored_file()) {
                self.discard_file(&new_file.url).await;
            }
            updated?;
            return Err(DomainError::not_found("material", id));
        }

        if let Some(new_file) = &file {
            if existing.file_type.is_stored_file() && existing.url != new_file.url {
                self.discard_file(&existing.url).await;
            }
            info!(material_id = id, file_type = %new_file.file_type, "material content replaced");
            if new_file.file_type.needs_review() {
                let name = new_name.unwrap_or(existing.name);
                let author_names = match self.materials.authors_of(id).await {
                    Ok(authors) => authors
                        .iter()
                        .map(|a| a.full_name())
                        .collect::<Vec<_>>()
                        .join(", "),
                    Err(err) => {
                        warn!(material_id = id, error = %err, "could not load authors for notification");
                        String::new()
                    }
                };
                self.notify(&name, &author_names).await;
            }
        } else {
            info!(material_id = id, "material updated");
        }
        self.catalog.detail(id, Role::Admin, None).await
    }

    /// Admin toggle for the `available` flag; `value` must be 0 or 1.
    #[tracing::instrument(skip(self))]
    pub async fn set_availability(&self, id: MaterialId, value: i64) -> Result<()> {
        let available = parse_flag("disponible", value)?;
        if !self.materials.set_available(id, available).await? {
            return Err(DomainError::not_found("material", id));
        }
        info!(material_id = id, available, "availability changed");
        Ok(())
    }

    /// Admin toggle for the `reviewed` flag; `value` must be 0 or 1.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(&self, id: MaterialId, value: i64) -> Result<()> {
        let reviewed = parse_flag("status", value)?;
        if !self.materials.set_reviewed(id, reviewed).await? {
            return Err(DomainError::not_found("material", id));
        }
        info!(material_id = id, reviewed, "review status changed");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: MaterialId) -> Result<()> {
        let existing = self
            .materials
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("material", id))?;
        if !self.materials.delete(id).await? {
            return Err(DomainError::not_found("material", id));
        }
        if existing.file_type.is_stored_file() {
            self.discard_file(&existing.url).await;
        }
        info!(material_id = id, "material deleted");
        Ok(())
    }

    fn check_author(&self, draft: AuthorDraft) -> Result<AuthorDraft> {
        let email = draft.email.trim().to_string();
        check_institutional_email(&email, &self.allowed_email_domains)?;
        Ok(AuthorDraft {
            first_name: required_text("author first name", &draft.first_name)?,
            paternal_surname: required_text("author paternal surname", &draft.paternal_surname)?,
            maternal_surname: draft
                .maternal_surname
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
            email,
        })
    }

    async fn ensure_tags_exist(&self, tag_ids: &[TagId]) -> Result<()> {
        for &tag_id in tag_ids {
            if self.tags.find(tag_id).await?.is_none() {
                return Err(DomainError::validation(format!("tag {tag_id} does not exist")));
            }
        }
        Ok(())
    }

    async fn ensure_authors_exist(&self, author_ids: &[AuthorId]) -> Result<()> {
        for &author_id in author_ids {
            if self.authors.find(author_id).await?.is_none() {
                return Err(DomainError::validation(format!(
                    "author {author_id} does not exist"
                )));
            }
        }
        Ok(())
    }

    async fn store(&self, source: Source) -> Result<String> {
        match source {
            Source::Link(url) => Ok(url),
            Source::File(upload) => self.files.save(upload).await,
        }
    }

    async fn discard_file(&self, locator: &str) {
        if let Err(err) = self.files.delete(locator).await {
            warn!(locator, error = %err, "failed to remove stored file");
        }
    }

    async fn notify(&self, material_name: &str, author_names: &str) {
        if let Err(err) = self
            .notifier
            .notify_pending_review(material_name, author_names)
            .await
        {
            warn!(material_name, error = %err, "pending review notification failed");
        }
    }
}

fn dedup(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}
