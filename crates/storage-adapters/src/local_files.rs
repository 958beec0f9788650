//! # Local file store
//!
//! Stores uploaded PDFs and ZIPs as flat files under one root directory.
//! Each upload gets a fresh random name that keeps the original extension,
//! so two uploads never collide and replacing a file never touches another
//! material's content.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use domains::{DomainError, FileStore, FileUpload, Result};
use tokio::fs;
use uuid::Uuid;

use crate::StorageError;

pub struct LocalFileStore {
    /// Root directory for all uploads (e.g., "./uploads")
    root: PathBuf,
}

fn io_error(locator: &str, err: std::io::Error) -> DomainError {
    tracing::error!(locator, error = %err, "file store i/o failed");
    DomainError::internal("file store failure")
}

impl LocalFileStore {
    /// Opens the store, creating the root directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> std::result::Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        tracing::info!(root = %root.display(), "local file store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Locators are bare file names; anything that could escape the root is rejected.
    fn resolve(&self, locator: &str) -> Result<PathBuf> {
        let valid = !locator.is_empty()
            && locator != "."
            && locator != ".."
            && !locator.contains(['/', '\\'])
            && !locator.contains("..");
        if valid {
            Ok(self.root.join(locator))
        } else {
            Err(DomainError::validation(format!("invalid file locator '{locator}'")))
        }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, upload: FileUpload) -> Result<String> {
        let extension = Path::new(&upload.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()));
        let locator = match extension {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4().simple()),
            None => Uuid::new_v4().simple().to_string(),
        };

        let path = self.resolve(&locator)?;
        fs::write(&path, &upload.content)
            .await
            .map_err(|e| io_error(&locator, e))?;
        tracing::debug!(locator, bytes = upload.content.len(), original = %upload.file_name, "file stored");
        Ok(locator)
    }

    async fn read(&self, locator: &str) -> Result<Bytes> {
        let path = self.resolve(locator)?;
        match fs::read(&path).await {
            Ok(content) => Ok(Bytes::from(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(DomainError::not_found("file", locator)),
            Err(e) => Err(io_error(locator, e)),
        }
    }

    async fn delete(&self, locator: &str) -> Result<()> {
        let path = self.resolve(locator)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(locator, e)),
        }
    }
}
