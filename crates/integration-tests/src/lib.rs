//! Shared harness for the end-to-end tests: a migrated in-memory SQLite
//! database, a throwaway uploads directory and a notifier that remembers
//! what it was asked to send.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use domains::{AuthorDraft, FileUpload, ReviewNotifier, UserId};
use serde_json::{json, Value};
use services::{Policy, Ports, Services, UploadRequest};
use storage_adapters::{LocalFileStore, SqliteDatabase};
use tempfile::TempDir;

pub const ADMIN: UserId = 1;
pub const REVIEWER: UserId = 2;
pub const STUDENT: UserId = 10;
/// Never seeded; resolves to the guest role.
pub const STRANGER: UserId = 99;

pub const VIEWER_BASE: &str = "https://visor.ipn.mx/";

/// Records every pending-review notification.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReviewNotifier for RecordingNotifier {
    async fn notify_pending_review(
        &self,
        material_name: &str,
        author_names: &str,
    ) -> domains::Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((material_name.to_string(), author_names.to_string()));
        }
        Ok(())
    }
}

pub struct TestApp {
    pub db: SqliteDatabase,
    pub services: Services,
    pub notifier: Arc<RecordingNotifier>,
    pub uploads: TempDir,
}

impl TestApp {
    pub async fn start() -> anyhow::Result<Self> {
        let db = SqliteDatabase::in_memory().await?;
        let users = db.users();
        users.upsert(ADMIN, 3).await?;
        users.upsert(REVIEWER, 2).await?;
        users.upsert(STUDENT, 1).await?;

        let uploads = tempfile::tempdir()?;
        let files = LocalFileStore::open(uploads.path()).await?;
        let notifier = Arc::new(RecordingNotifier::default());

        let ports = Ports {
            users: Arc::new(users),
            materials: Arc::new(db.materials()),
            authors: Arc::new(db.authors()),
            tags: Arc::new(db.tags()),
            favorites: Arc::new(db.favorites()),
            history: Arc::new(db.history()),
            files: Arc::new(files),
            notifier: notifier.clone(),
        };
        let policy = Policy {
            viewer_base_url: Some(VIEWER_BASE.to_string()),
            ..Policy::default()
        };
        Ok(Self {
            db,
            services: Services::new(ports, policy),
            notifier,
            uploads,
        })
    }

    /// Names of the files currently in the uploads directory.
    pub fn stored_files(&self) -> anyhow::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.uploads.path())? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

pub fn author(first: &str, paternal: &str, maternal: Option<&str>, email: &str) -> AuthorDraft {
    AuthorDraft {
        first_name: first.to_string(),
        paternal_surname: paternal.to_string(),
        maternal_surname: maternal.map(str::to_string),
        email: email.to_string(),
    }
}

/// Upload metadata in the shape clients send it.
pub fn metadata(name: &str, authors: &[AuthorDraft], tag_ids: &[i64]) -> String {
    let authors: Vec<Value> = authors
        .iter()
        .map(|a| {
            json!({
                "nombre": a.first_name,
                "apellidoP": a.paternal_surname,
                "apellidoM": a.maternal_surname,
                "email": a.email,
            })
        })
        .collect();
    json!({ "nombreMaterial": name, "autores": authors, "tagIds": tag_ids }).to_string()
}

pub fn file(name: &str, content: &'static [u8]) -> FileUpload {
    FileUpload {
        file_name: name.to_string(),
        content: Bytes::from_static(content),
    }
}

pub fn file_upload(user_id: UserId, metadata: String, upload: FileUpload) -> UploadRequest {
    UploadRequest {
        user_id: Some(user_id),
        metadata,
        file: Some(upload),
        url: None,
    }
}

pub fn link_upload(user_id: UserId, metadata: String, url: &str) -> UploadRequest {
    UploadRequest {
        user_id: Some(user_id),
        metadata,
        file: None,
        url: Some(url.to_string()),
    }
}
