//! # Ports
//!
//! Any adapter must implement these traits to be wired into the services.
//! Multi-table mutations (`create`, `update`, `delete`) are all-or-nothing:
//! implementations run them inside a single transaction.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::error::Result;
use crate::models::{
    Author, AuthorDraft, AuthorId, AuthorPatch, Favorited, FileUpload, Material, MaterialChanges,
    MaterialId, NewMaterial, Tag, TagId, UserId, Visited,
};
use crate::search::MaterialFilter;

/// Single role lookup against the users store.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait UserRoleStore: Send + Sync {
    /// Raw role code, or `None` when the user is unknown.
    async fn role_of(&self, user_id: UserId) -> Result<Option<i64>>;
}

/// Persistence contract for materials and their author/tag links.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait MaterialRepository: Send + Sync {
    async fn list(&self, only_available: bool) -> Result<Vec<Material>>;
    async fn find(&self, id: MaterialId) -> Result<Option<Material>>;
    async fn authors_of(&self, id: MaterialId) -> Result<Vec<Author>>;
    async fn tags_of(&self, id: MaterialId) -> Result<Vec<Tag>>;

    /// Ids matching the filter, ascending. The filter's visibility clause is authoritative.
    async fn search(&self, filter: &MaterialFilter) -> Result<Vec<MaterialId>>;

    async fn create(&self, material: NewMaterial) -> Result<MaterialId>;
    /// Returns `false` when the material does not exist.
    async fn update(&self, id: MaterialId, changes: MaterialChanges) -> Result<bool>;
    async fn set_available(&self, id: MaterialId, available: bool) -> Result<bool>;
    async fn set_reviewed(&self, id: MaterialId, reviewed: bool) -> Result<bool>;
    /// Removes the material with its author links, tag links, favorites and history.
    async fn delete(&self, id: MaterialId) -> Result<bool>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Author>>;
    async fn find(&self, id: AuthorId) -> Result<Option<Author>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Author>>;
    /// Fails with `Conflict` when the email is taken.
    async fn create(&self, draft: AuthorDraft) -> Result<Author>;
    /// Returns the author with this exact email, creating it if absent.
    async fn find_or_create(&self, draft: AuthorDraft) -> Result<Author>;
    async fn update(&self, id: AuthorId, patch: AuthorPatch) -> Result<Option<Author>>;
    /// Removes the author with its material links and user relation.
    async fn delete(&self, id: AuthorId) -> Result<bool>;

    async fn author_of_user(&self, user_id: UserId) -> Result<Option<AuthorId>>;
    /// Fails with `Conflict` when either side already has a relation.
    async fn link_user(&self, user_id: UserId, author_id: AuthorId) -> Result<()>;
    async fn unlink_user(&self, user_id: UserId, author_id: AuthorId) -> Result<bool>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Tag>>;
    async fn find(&self, id: TagId) -> Result<Option<Tag>>;
    /// Fails with `Conflict` when the name is taken.
    async fn create(&self, name: &str) -> Result<Tag>;
    async fn rename(&self, id: TagId, name: &str) -> Result<bool>;
    /// Removes the tag with its material links.
    async fn delete(&self, id: TagId) -> Result<bool>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Returns `false` when the pair already exists.
    async fn add(&self, user_id: UserId, material_id: MaterialId, at: DateTime<Utc>) -> Result<bool>;
    async fn remove(&self, user_id: UserId, material_id: MaterialId) -> Result<bool>;
    async fn contains(&self, user_id: UserId, material_id: MaterialId) -> Result<bool>;
    /// Most recently added first.
    async fn list(&self, user_id: UserId, only_available: bool) -> Result<Vec<Favorited>>;
    async fn count(&self, material_id: MaterialId) -> Result<i64>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Inserts the pair or refreshes its timestamp.
    async fn record(&self, user_id: UserId, material_id: MaterialId, at: DateTime<Utc>) -> Result<()>;
    /// Deletes the user's entries last consulted before `cutoff`; returns the count.
    async fn purge_before(&self, user_id: UserId, cutoff: DateTime<Utc>) -> Result<u64>;
    /// Most recently consulted first.
    async fn list(&self, user_id: UserId, only_available: bool) -> Result<Vec<Visited>>;
    async fn remove(&self, user_id: UserId, material_id: MaterialId) -> Result<bool>;
    async fn clear(&self, user_id: UserId) -> Result<u64>;
}

/// Raw file persistence.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Saves the bytes under a fresh name and returns its locator.
    async fn save(&self, upload: FileUpload) -> Result<String>;
    /// Fails with `NotFound` when the locator does not exist.
    async fn read(&self, locator: &str) -> Result<Bytes>;
    /// Deleting a missing locator is not an error.
    async fn delete(&self, locator: &str) -> Result<()>;
}

/// Outbound notification for materials waiting for review.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ReviewNotifier: Send + Sync {
    async fn notify_pending_review(&self, material_name: &str, author_names: &str) -> Result<()>;
}
