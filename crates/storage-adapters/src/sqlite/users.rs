use async_trait::async_trait;
use domains::{Result, UserId, UserRoleStore};
use sqlx::SqlitePool;

use super::db_error;

pub struct SqliteUserRoleStore {
    pool: SqlitePool,
}

impl SqliteUserRoleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts the user or overwrites its role code. Used for seeding; the
    /// identity system owns these rows in production.
    pub async fn upsert(&self, user_id: UserId, role_code: i64) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, role) VALUES (?, ?) \
             ON CONFLICT (id) DO UPDATE SET role = excluded.role",
        )
        .bind(user_id)
        .bind(role_code)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }
}

#[async_trait]
impl UserRoleStore for SqliteUserRoleStore {
    async fn role_of(&self, user_id: UserId) -> Result<Option<i64>> {
        sqlx::query_scalar("SELECT role FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }
}
