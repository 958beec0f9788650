//! # SQLite adapters
//!
//! One repository struct per port, all sharing the same pool. Multi-table
//! mutations run inside a single transaction; dropping the transaction
//! without committing rolls it back.

use std::str::FromStr;
use std::time::Duration;

use domains::DomainError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};

use crate::StorageError;

mod authors;
mod favorites;
mod history;
mod materials;
mod rows;
pub mod search;
mod tags;
mod users;

pub use authors::SqliteAuthorRepository;
pub use favorites::SqliteFavoriteRepository;
pub use history::SqliteHistoryRepository;
pub use materials::SqliteMaterialRepository;
pub use tags::SqliteTagRepository;
pub use users::SqliteUserRoleStore;

/// How long a writer waits for the database lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Opens (creating if needed) the database at `url` with foreign keys enforced.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        tracing::info!(url, max_connections, "connected to sqlite");
        Ok(Self { pool })
    }

    /// Single-connection in-memory database, already migrated. The connection
    /// never expires, so the data lives as long as the pool.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn users(&self) -> SqliteUserRoleStore {
        SqliteUserRoleStore::new(self.pool.clone())
    }

    pub fn materials(&self) -> SqliteMaterialRepository {
        SqliteMaterialRepository::new(self.pool.clone())
    }

    pub fn authors(&self) -> SqliteAuthorRepository {
        SqliteAuthorRepository::new(self.pool.clone())
    }

    pub fn tags(&self) -> SqliteTagRepository {
        SqliteTagRepository::new(self.pool.clone())
    }

    pub fn favorites(&self) -> SqliteFavoriteRepository {
        SqliteFavoriteRepository::new(self.pool.clone())
    }

    pub fn history(&self) -> SqliteHistoryRepository {
        SqliteHistoryRepository::new(self.pool.clone())
    }
}

/// Search key stored next to user-visible text. Lowercases beyond ASCII,
/// so `Álgebra` and `álgebra` share one key.
pub(crate) fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Starts a transaction holding the write lock from its first statement.
/// Deferred transactions that read before writing fail with SQLITE_BUSY when
/// another writer commits in between; immediate ones wait their turn instead,
/// so their reads see the latest committed state.
pub(crate) async fn begin_write(
    pool: &SqlitePool,
) -> Result<Transaction<'static, Sqlite>, DomainError> {
    pool.begin_with("BEGIN IMMEDIATE").await.map_err(db_error)
}

/// Maps a sqlx error onto the domain taxonomy. Constraint violations are the
/// caller's fault; anything else is logged and reported as internal.
pub(crate) fn db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return DomainError::conflict(format!("duplicate value: {}", db.message()));
        }
        if db.is_foreign_key_violation() {
            return DomainError::validation("referenced author, tag or material does not exist");
        }
        if db.is_check_violation() {
            return DomainError::validation(format!("invalid value: {}", db.message()));
        }
    }
    tracing::error!(error = %err, "sqlite query failed");
    DomainError::internal("storage failure")
}
