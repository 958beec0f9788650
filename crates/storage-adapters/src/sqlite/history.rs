use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{HistoryRepository, MaterialId, Result, UserId, Visited};
use sqlx::SqlitePool;

use super::db_error;
use super::rows::{convert_all, VisitedRow, MATERIAL_COLUMNS};

pub struct SqliteHistoryRepository {
    pool: SqlitePool,
}

impl SqliteHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryRepository for SqliteHistoryRepository {
    async fn record(&self, user_id: UserId, material_id: MaterialId, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_history (user_id, material_id, last_consulted) VALUES (?, ?, ?) \
             ON CONFLICT (user_id, material_id) DO UPDATE SET last_consulted = excluded.last_consulted",
        )
        .bind(user_id)
        .bind(material_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn purge_before(&self, user_id: UserId, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_history WHERE user_id = ? AND last_consulted < ?")
            .bind(user_id)
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    async fn list(&self, user_id: UserId, only_available: bool) -> Result<Vec<Visited>> {
        let availability = if only_available { " AND m.available = 1" } else { "" };
        let sql = format!(
            "SELECT {MATERIAL_COLUMNS}, h.last_consulted FROM user_history h \
             JOIN materials m ON m.id = h.material_id \
             WHERE h.user_id = ?{availability} ORDER BY h.last_consulted DESC, m.id"
        );
        let rows = sqlx::query_as::<_, VisitedRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        convert_all(rows)
    }

    async fn remove(&self, user_id: UserId, material_id: MaterialId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_history WHERE user_id = ? AND material_id = ?")
            .bind(user_id)
            .bind(material_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_history WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }
}
