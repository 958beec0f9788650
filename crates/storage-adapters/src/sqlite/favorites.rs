use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{FavoriteRepository, Favorited, MaterialId, Result, UserId};
use sqlx::SqlitePool;

use super::db_error;
use super::rows::{convert_all, FavoritedRow, MATERIAL_COLUMNS};

pub struct SqliteFavoriteRepository {
    pool: SqlitePool,
}

impl SqliteFavoriteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteRepository for SqliteFavoriteRepository {
    async fn add(&self, user_id: UserId, material_id: MaterialId, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO favorites (user_id, material_id, added_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(material_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, user_id: UserId, material_id: MaterialId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = ? AND material_id = ?")
            .bind(user_id)
            .bind(material_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn contains(&self, user_id: UserId, material_id: MaterialId) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM favorites WHERE user_id = ? AND material_id = ?")
                .bind(user_id)
                .bind(material_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(found.is_some())
    }

    async fn list(&self, user_id: UserId, only_available: bool) -> Result<Vec<Favorited>> {
        let availability = if only_available { " AND m.available = 1" } else { "" };
        let sql = format!(
            "SELECT {MATERIAL_COLUMNS}, f.added_at FROM favorites f \
             JOIN materials m ON m.id = f.material_id \
             WHERE f.user_id = ?{availability} ORDER BY f.added_at DESC, m.id"
        );
        let rows = sqlx::query_as::<_, FavoritedRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        convert_all(rows)
    }

    async fn count(&self, material_id: MaterialId) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE material_id = ?")
            .bind(material_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::fixtures::{db, draft, material, new_material};
    use chrono::Duration;
    use domains::FileKind;

    #[tokio::test]
    async fn duplicates_are_reported_and_lists_are_newest_first() {
        let db = db().await;
        let repo = db.favorites();
        let author = || vec![draft("A", "B", None, "a@ipn.mx")];
        let old = material(&db, new_material("Viejo", FileKind::Pdf, author())).await;
        let new = material(&db, new_material("Nuevo", FileKind::Pdf, author())).await;
        let hidden = material(&db, new_material("Oculto", FileKind::Zip, author())).await;
        let now = Utc::now();

        assert!(repo.add(3, old, now - Duration::hours(2)).await.unwrap());
        assert!(repo.add(3, new, now).await.unwrap());
        assert!(repo.add(3, hidden, now - Duration::hours(1)).await.unwrap());
        assert!(!repo.add(3, old, now).await.unwrap());

        let ids: Vec<_> = repo
            .list(3, true)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.material.id)
            .collect();
        assert_eq!(ids, vec![new, old]);
        assert_eq!(repo.list(3, false).await.unwrap().len(), 3);
        assert_eq!(repo.count(old).await.unwrap(), 1);
        assert!(repo.contains(3, old).await.unwrap());

        assert!(repo.remove(3, old).await.unwrap());
        assert!(!repo.remove(3, old).await.unwrap());
    }
}
