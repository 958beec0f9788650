//! # storage-adapters
//!
//! Implementations of the persistence ports: SQLite repositories (`db-sqlite`)
//! and the local-disk file store (`media-local`).

#[cfg(feature = "media-local")]
pub mod local_files;
#[cfg(feature = "db-sqlite")]
pub mod sqlite;

#[cfg(feature = "media-local")]
pub use local_files::LocalFileStore;
#[cfg(feature = "db-sqlite")]
pub use sqlite::SqliteDatabase;

/// Failures while opening or preparing a store, before any port is served.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[cfg(feature = "db-sqlite")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[cfg(feature = "db-sqlite")]
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
