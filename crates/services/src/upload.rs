//! Request shapes for uploads and updates, and the "file or link" choice.

use serde::Deserialize;

use domains::validation::check_link;
use domains::{AuthorDraft, AuthorId, DomainError, FileKind, FileUpload, Result, TagId, UserId};

/// JSON `metadata` part of an upload request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    #[serde(default, alias = "nombreMaterial")]
    pub material_name: Option<String>,
    #[serde(default, alias = "autores")]
    pub authors: Vec<AuthorDraft>,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
}

/// JSON `metadata` part of an update request; absent fields stay untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMetadata {
    #[serde(default, alias = "nombreMaterial")]
    pub material_name: Option<String>,
    #[serde(default, alias = "autores")]
    pub author_ids: Option<Vec<AuthorId>>,
    #[serde(default)]
    pub tag_ids: Option<Vec<TagId>>,
}

fn parse_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| DomainError::validation(format!("metadata is not valid JSON: {e}")))
}

impl UploadMetadata {
    pub fn parse(raw: &str) -> Result<Self> {
        parse_json(raw)
    }
}

impl UpdateMetadata {
    /// A missing or blank payload means "no metadata changes".
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => parse_json(raw),
            None => Ok(Self::default()),
        }
    }
}

pub struct UploadRequest {
    pub user_id: Option<UserId>,
    pub metadata: String,
    pub file: Option<FileUpload>,
    pub url: Option<String>,
}

#[derive(Default)]
pub struct UpdateRequest {
    pub metadata: Option<String>,
    pub file: Option<FileUpload>,
    pub url: Option<String>,
}

/// Where the material's content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(FileUpload),
    Link(String),
}

impl Source {
    /// Uploads need exactly one of file or link.
    pub fn exactly_one(file: Option<FileUpload>, url: Option<String>) -> Result<Self> {
        Self::at_most_one(file, url)?
            .ok_or_else(|| DomainError::validation("either a file or a url is required"))
    }

    /// Updates may carry neither.
    pub fn at_most_one(file: Option<FileUpload>, url: Option<String>) -> Result<Option<Self>> {
        let url = url.filter(|u| !u.trim().is_empty());
        match (file, url) {
            (Some(_), Some(_)) => Err(DomainError::validation(
                "send either a file or a url, not both",
            )),
            (Some(file), None) => Ok(Some(Self::File(file))),
            (None, Some(url)) => Ok(Some(Self::Link(check_link(&url)?))),
            (None, None) => Ok(None),
        }
    }

    pub fn file_type(&self) -> Result<FileKind> {
        match self {
            Self::Link(_) => Ok(FileKind::Link),
            Self::File(upload) => {
                if upload.content.is_empty() {
                    return Err(DomainError::validation("uploaded file is empty"));
                }
                FileKind::from_file_name(&upload.file_name).ok_or_else(|| {
                    DomainError::validation(format!(
                        "'{}' is not a PDF or ZIP file",
                        upload.file_name
                    ))
                })
            }
        }
    }
}
