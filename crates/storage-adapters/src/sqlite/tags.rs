use async_trait::async_trait;
use domains::{Result, Tag, TagId, TagRepository};
use sqlx::SqlitePool;

use super::{begin_write, db_error};
use super::rows::TagRow;

pub struct SqliteTagRepository {
    pool: SqlitePool,
}

impl SqliteTagRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for SqliteTagRepository {
    async fn list(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query_as::<_, TagRow>("SELECT id, name FROM tags ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    async fn find(&self, id: TagId) -> Result<Option<Tag>> {
        let row = sqlx::query_as::<_, TagRow>("SELECT id, name FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Tag::from))
    }

    async fn create(&self, name: &str) -> Result<Tag> {
        let row = sqlx::query_as::<_, TagRow>("INSERT INTO tags (name) VALUES (?) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.into())
    }

    async fn rename(&self, id: TagId, name: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE tags SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: TagId) -> Result<bool> {
        let mut tx = begin_write(&self.pool).await?;
        sqlx::query("DELETE FROM material_tags WHERE tag_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        let deleted = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?
            .rows_affected();
        if deleted == 0 {
            return Ok(false);
        }
        tx.commit().await.map_err(db_error)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::fixtures::{db, draft, material, new_material};
    use domains::{DomainError, FileKind, MaterialRepository};

    #[tokio::test]
    async fn names_are_unique() {
        let db = db().await;
        let repo = db.tags();
        let redes = repo.create("redes").await.unwrap();
        let bd = repo.create("bd").await.unwrap();

        assert!(matches!(repo.create("redes").await, Err(DomainError::Conflict(_))));
        assert!(matches!(repo.rename(bd.id, "redes").await, Err(DomainError::Conflict(_))));
        assert!(repo.rename(redes.id, "redes de computadoras").await.unwrap());
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_unlinks_materials() {
        let db = db().await;
        let repo = db.tags();
        let t = repo.create("uno").await.unwrap();
        let mut seed = new_material("A", FileKind::Pdf, vec![draft("A", "B", None, "a@ipn.mx")]);
        seed.tag_ids = vec![t.id];
        let id = material(&db, seed).await;

        assert!(repo.delete(t.id).await.unwrap());
        assert!(db.materials().tags_of(id).await.unwrap().is_empty());
        assert!(repo.find(t.id).await.unwrap().is_none());
        assert!(!repo.delete(t.id).await.unwrap());
    }
}
