//! # Domain Models
//!
//! These structs represent the core entities of the materials repository.
//! Identifiers are the storage engine's integer row ids.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::{FileKind, ReviewState};
use crate::role::Role;
use crate::visibility;

pub type MaterialId = i64;
pub type AuthorId = i64;
pub type TagId = i64;
pub type UserId = i64;

/// An uploaded document or external link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    /// File store locator for PDF/ZIP, external address for LINK.
    pub url: String,
    pub file_type: FileKind,
    /// Gates visibility for unprivileged roles.
    pub available: bool,
    /// Admin review flag, independent of `available`.
    pub reviewed: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Material {
    pub fn state(&self) -> ReviewState {
        ReviewState::new(self.available, self.reviewed)
    }

    pub fn is_visible_to(&self, role: Role) -> bool {
        visibility::is_visible(role, self.available)
    }

    /// Summaries never expose the internal locator of a stored PDF.
    pub fn public_url(&self) -> Option<String> {
        match self.file_type {
            FileKind::Pdf => None,
            FileKind::Zip | FileKind::Link => Some(self.url.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: AuthorId,
    pub first_name: String,
    pub paternal_surname: String,
    pub maternal_surname: Option<String>,
    /// Identity key: uploads reuse an author by exact email match.
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Author {
    pub fn full_name(&self) -> String {
        join_name(
            &self.first_name,
            &self.paternal_surname,
            self.maternal_surname.as_deref(),
        )
    }
}

/// Author data as submitted with an upload or a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorDraft {
    #[serde(alias = "nombre")]
    pub first_name: String,
    #[serde(alias = "apellidoP")]
    pub paternal_surname: String,
    #[serde(default, alias = "apellidoM")]
    pub maternal_surname: Option<String>,
    pub email: String,
}

impl AuthorDraft {
    pub fn full_name(&self) -> String {
        join_name(
            &self.first_name,
            &self.paternal_surname,
            self.maternal_surname.as_deref(),
        )
    }
}

/// Partial author update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorPatch {
    pub first_name: Option<String>,
    pub paternal_surname: Option<String>,
    pub maternal_surname: Option<String>,
    pub email: Option<String>,
}

fn join_name(first: &str, paternal: &str, maternal: Option<&str>) -> String {
    [Some(first), Some(paternal), maternal]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// A material hydrated with its relations for the requesting user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDetail {
    #[serde(flatten)]
    pub material: Material,
    pub authors: Vec<Author>,
    pub tags: Vec<Tag>,
    pub is_favorite: bool,
    /// External viewer address for ZIP materials, when a viewer is configured.
    pub access_url: Option<String>,
}

/// Everything needed to insert a material and its links in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMaterial {
    pub name: String,
    pub url: String,
    pub file_type: FileKind,
    pub state: ReviewState,
    pub created_by: Option<UserId>,
    /// Resolved by exact email inside the transaction; missing ones are created.
    pub authors: Vec<AuthorDraft>,
    pub tag_ids: Vec<TagId>,
}

/// A new locator replacing the material's file or link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReplacement {
    pub url: String,
    pub file_type: FileKind,
    pub state: ReviewState,
}

/// Changes applied by an update; `None` leaves the field or relation untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialChanges {
    pub name: Option<String>,
    pub file: Option<FileReplacement>,
    pub author_ids: Option<Vec<AuthorId>>,
    pub tag_ids: Option<Vec<TagId>>,
}

/// Raw bytes received for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content: Bytes,
}

/// File content served back to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialFile {
    pub file_name: String,
    pub file_type: FileKind,
    pub content: Bytes,
}

/// A history row joined with its material.
#[derive(Debug, Clone, PartialEq)]
pub struct Visited {
    pub material: Material,
    pub last_consulted: DateTime<Utc>,
}

/// A favorites row joined with its material.
#[derive(Debug, Clone, PartialEq)]
pub struct Favorited {
    pub material: Material,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub material_id: MaterialId,
    pub name: String,
    pub url: Option<String>,
    pub file_type: FileKind,
    pub last_consulted: DateTime<Utc>,
    pub authors: Vec<Author>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub material_id: MaterialId,
    pub name: String,
    pub url: Option<String>,
    pub file_type: FileKind,
    pub created_at: DateTime<Utc>,
    pub added_at: DateTime<Utc>,
    pub authors: Vec<Author>,
    pub tags: Vec<Tag>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(file_type: FileKind) -> Material {
        let now = Utc::now();
        Material {
            id: 1,
            name: "Apuntes".into(),
            url: "stored-name.bin".into(),
            file_type,
            available: true,
            reviewed: true,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn pdf_locator_is_not_public() {
        assert_eq!(material(FileKind::Pdf).public_url(), None);
        assert_eq!(
            material(FileKind::Zip).public_url().as_deref(),
            Some("stored-name.bin")
        );
    }

    #[test]
    fn full_name_skips_missing_maternal_surname() {
        let draft = AuthorDraft {
            first_name: "Juan".into(),
            paternal_surname: "Perez".into(),
            maternal_surname: None,
            email: "jperez@ipn.mx".into(),
        };
        assert_eq!(draft.full_name(), "Juan Perez");
    }

    #[test]
    fn author_draft_accepts_spanish_field_names() {
        let draft: AuthorDraft = serde_json::from_str(
            r#"{"nombre":"Ana","apellidoP":"Lopez","apellidoM":"Diaz","email":"ana@ipn.mx"}"#,
        )
        .unwrap();
        assert_eq!(draft.full_name(), "Ana Lopez Diaz");
    }

    #[test]
    fn detail_serializes_flat() {
        let detail = MaterialDetail {
            material: material(FileKind::Link),
            authors: vec![],
            tags: vec![],
            is_favorite: false,
            access_url: None,
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["fileType"], "LINK");
        assert_eq!(json["available"], true);
        assert_eq!(json["isFavorite"], false);
    }
}
