use async_trait::async_trait;
use chrono::Utc;
use domains::{
    Author, Material, MaterialChanges, MaterialFilter, MaterialId, MaterialRepository,
    NewMaterial, Result, Tag,
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::authors::find_or_insert;
use super::rows::{convert_all, AuthorRow, MaterialRow, TagRow, AUTHOR_COLUMNS, MATERIAL_COLUMNS};
use super::{begin_write, db_error, fold, search};

pub struct SqliteMaterialRepository {
    pool: SqlitePool,
}

impl SqliteMaterialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn link_author(conn: &mut SqliteConnection, author_id: i64, material_id: MaterialId) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO author_materials (author_id, material_id) VALUES (?, ?)")
        .bind(author_id)
        .bind(material_id)
        .execute(conn)
        .await
        .map_err(db_error)?;
    Ok(())
}

async fn link_tag(conn: &mut SqliteConnection, material_id: MaterialId, tag_id: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO material_tags (material_id, tag_id) VALUES (?, ?)")
        .bind(material_id)
        .bind(tag_id)
        .execute(conn)
        .await
        .map_err(db_error)?;
    Ok(())
}

async fn set_flag(pool: &SqlitePool, column: &str, id: MaterialId, value: bool) -> Result<bool> {
    let sql = format!("UPDATE materials SET {column} = ?, updated_at = ? WHERE id = ?");
    let result = sqlx::query(&sql)
        .bind(value)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_error)?;
    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl MaterialRepository for SqliteMaterialRepository {
    async fn list(&self, only_available: bool) -> Result<Vec<Material>> {
        let filter = if only_available { " WHERE m.available = 1" } else { "" };
        let sql = format!("SELECT {MATERIAL_COLUMNS} FROM materials m{filter} ORDER BY m.id");
        let rows = sqlx::query_as::<_, MaterialRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        convert_all(rows)
    }

    async fn find(&self, id: MaterialId) -> Result<Option<Material>> {
        let sql = format!("SELECT {MATERIAL_COLUMNS} FROM materials m WHERE m.id = ?");
        sqlx::query_as::<_, MaterialRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Material::try_from)
            .transpose()
    }

    async fn authors_of(&self, id: MaterialId) -> Result<Vec<Author>> {
        let sql = format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors a \
             JOIN author_materials am ON am.author_id = a.id \
             WHERE am.material_id = ? ORDER BY a.id"
        );
        let rows = sqlx::query_as::<_, AuthorRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Author::from).collect())
    }

    async fn tags_of(&self, id: MaterialId) -> Result<Vec<Tag>> {
        let rows = sqlx::query_as::<_, TagRow>(
            "SELECT t.id, t.name FROM tags t \
             JOIN material_tags mt ON mt.tag_id = t.id \
             WHERE mt.material_id = ? ORDER BY t.id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    async fn search(&self, filter: &MaterialFilter) -> Result<Vec<MaterialId>> {
        let mut qb = search::compile(filter);
        qb.build_query_scalar::<i64>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    /// Inserts the material, resolves its authors by email and links tags,
    /// all in one transaction.
    async fn create(&self, material: NewMaterial) -> Result<MaterialId> {
        let now = Utc::now();
        let mut tx = begin_write(&self.pool).await?;

        // 1. Material row
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO materials (name, name_folded, url, file_type, available, reviewed, created_by, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&material.name)
        .bind(fold(&material.name))
        .bind(&material.url)
        .bind(material.file_type.as_str())
        .bind(material.state.available)
        .bind(material.state.reviewed)
        .bind(material.created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        // 2. Authors, reused by exact email or created
        for draft in &material.authors {
            let author_id = find_or_insert(&mut tx, draft, now).await?;
            link_author(&mut tx, author_id, id).await?;
        }

        // 3. Tags
        for tag_id in &material.tag_ids {
            link_tag(&mut tx, id, *tag_id).await?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(id)
    }

    async fn update(&self, id: MaterialId, changes: MaterialChanges) -> Result<bool> {
        let mut tx = begin_write(&self.pool).await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM materials WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;
        if exists.is_none() {
            return Ok(false);
        }

        // 1. Scalar columns
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE materials SET ");
        let mut set = qb.separated(", ");
        set.push("updated_at = ").push_bind_unseparated(Utc::now());
        if let Some(name) = changes.name {
            set.push("name_folded = ").push_bind_unseparated(fold(&name));
            set.push("name = ").push_bind_unseparated(name);
        }
        if let Some(file) = changes.file {
            set.push("url = ").push_bind_unseparated(file.url);
            set.push("file_type = ").push_bind_unseparated(file.file_type.as_str());
            set.push("available = ").push_bind_unseparated(file.state.available);
            set.push("reviewed = ").push_bind_unseparated(file.state.reviewed);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.build().execute(&mut *tx).await.map_err(db_error)?;

        // 2. Author links, replaced as a whole
        if let Some(author_ids) = changes.author_ids {
            sqlx::query("DELETE FROM author_materials WHERE material_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            for author_id in author_ids {
                link_author(&mut tx, author_id, id).await?;
            }
        }

        // 3. Tag links, replaced as a whole
        if let Some(tag_ids) = changes.tag_ids {
            sqlx::query("DELETE FROM material_tags WHERE material_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            for tag_id in tag_ids {
                link_tag(&mut tx, id, tag_id).await?;
            }
        }

        tx.commit().await.map_err(db_error)?;
        Ok(true)
    }

    async fn set_available(&self, id: MaterialId, available: bool) -> Result<bool> {
        set_flag(&self.pool, "available", id, available).await
    }

    async fn set_reviewed(&self, id: MaterialId, reviewed: bool) -> Result<bool> {
        set_flag(&self.pool, "reviewed", id, reviewed).await
    }

    async fn delete(&self, id: MaterialId) -> Result<bool> {
        let mut tx = begin_write(&self.pool).await?;

        for table in ["author_materials", "material_tags", "favorites", "user_history"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE material_id = ?"))
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }
        let deleted = sqlx::query("DELETE FROM materials WHERE id = ?")
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
    use crate::sqlite::fixtures::{db, draft, material, new_material, tag};
    use domains::{
        AuthorRepository, DomainError, FavoriteRepository, FileKind, FileReplacement,
        HistoryRepository, ReviewState,
    };

    #[tokio::test]
    async fn create_reuses_authors_by_email_and_links_tags() {
        let db = db().await;
        let repo = db.materials();
        let redes = tag(&db, "redes").await;

        let mut first = new_material("Redes", FileKind::Zip, vec![draft("Juan", "Perez", None, "jp@ipn.mx")]);
        first.tag_ids = vec![redes];
        let first = material(&db, first).await;
        let second = material(
            &db,
            new_material("Otra", FileKind::Pdf, vec![draft("J.", "P.", None, "jp@ipn.mx")]),
        )
        .await;

        let a = repo.authors_of(first).await.unwrap();
        let b = repo.authors_of(second).await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].id, b[0].id);
        assert_eq!(a[0].first_name, "Juan");
        assert_eq!(repo.tags_of(first).await.unwrap()[0].name, "redes");

        let stored = repo.find(first).await.unwrap().unwrap();
        assert_eq!(stored.state(), ReviewState::PENDING);
        assert_eq!(stored.file_type, FileKind::Zip);
    }

    #[tokio::test]
    async fn unknown_tag_rolls_back_the_whole_insert() {
        let db = db().await;
        let repo = db.materials();
        let mut bad = new_material("Roto", FileKind::Pdf, vec![draft("Ana", "Diaz", None, "ad@ipn.mx")]);
        bad.tag_ids = vec![999];

        let err = repo.create(bad).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(repo.list(false).await.unwrap().is_empty());
        assert!(db.authors().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_hides_unavailable_when_asked() {
        let db = db().await;
        let repo = db.materials();
        let pdf = material(&db, new_material("A", FileKind::Pdf, vec![draft("A", "B", None, "a@ipn.mx")])).await;
        let zip = material(&db, new_material("B", FileKind::Zip, vec![draft("A", "B", None, "a@ipn.mx")])).await;

        let ids = |ms: Vec<Material>| ms.into_iter().map(|m| m.id).collect::<Vec<_>>();
        assert_eq!(ids(repo.list(true).await.unwrap()), vec![pdf]);
        assert_eq!(ids(repo.list(false).await.unwrap()), vec![pdf, zip]);
    }

    #[tokio::test]
    async fn flags_toggle_independently() {
        let db = db().await;
        let repo = db.materials();
        let id = material(&db, new_material("A", FileKind::Zip, vec![draft("A", "B", None, "a@ipn.mx")])).await;

        assert!(repo.set_available(id, true).await.unwrap());
        let m = repo.find(id).await.unwrap().unwrap();
        assert_eq!(m.state(), ReviewState::new(true, false));

        assert!(repo.set_reviewed(id, true).await.unwrap());
        assert!(repo.set_available(id, false).await.unwrap());
        let m = repo.find(id).await.unwrap().unwrap();
        assert_eq!(m.state(), ReviewState::new(false, true));

        assert!(!repo.set_available(404, true).await.unwrap());
    }

    #[tokio::test]
    async fn update_replaces_relations_and_file_state() {
        let db = db().await;
        let repo = db.materials();
        let t1 = tag(&db, "uno").await;
        let t2 = tag(&db, "dos").await;
        let mut seed = new_material("A", FileKind::Pdf, vec![draft("A", "B", None, "a@ipn.mx")]);
        seed.tag_ids = vec![t1];
        let id = material(&db, seed).await;
        let other = db
            .authors()
            .create(draft("C", "D", None, "c@ipn.mx"))
            .await
            .unwrap();

        let changes = MaterialChanges {
            name: Some("A v2".into()),
            file: Some(FileReplacement {
                url: "new.zip".into(),
                file_type: FileKind::Zip,
                state: ReviewState::PENDING,
            }),
            author_ids: Some(vec![other.id]),
            tag_ids: Some(vec![t2]),
        };
        assert!(repo.update(id, changes).await.unwrap());

        let m = repo.find(id).await.unwrap().unwrap();
        assert_eq!(m.name, "A v2");
        assert_eq!(m.url, "new.zip");
        assert_eq!(m.state(), ReviewState::PENDING);
        assert_eq!(repo.authors_of(id).await.unwrap()[0].id, other.id);
        assert_eq!(repo.tags_of(id).await.unwrap()[0].id, t2);

        let clear = MaterialChanges {
            tag_ids: Some(vec![]),
            ..Default::default()
        };
        assert!(repo.update(id, clear).await.unwrap());
        assert!(repo.tags_of(id).await.unwrap().is_empty());
        assert_eq!(repo.authors_of(id).await.unwrap().len(), 1);

        assert!(!repo.update(404, MaterialChanges::default()).await.unwrap());
    }

    #[tokio::test]
    async fn delete_cascades_every_association() {
        let db = db().await;
        let repo = db.materials();
        let t = tag(&db, "uno").await;
        let mut seed = new_material("A", FileKind::Pdf, vec![draft("A", "B", None, "a@ipn.mx")]);
        seed.tag_ids = vec![t];
        let id = material(&db, seed).await;
        db.favorites().add(7, id, Utc::now()).await.unwrap();
        db.history().record(7, id, Utc::now()).await.unwrap();

        assert!(repo.delete(id).await.unwrap());
        assert!(repo.find(id).await.unwrap().is_none());
        assert!(repo.authors_of(id).await.unwrap().is_empty());
        assert!(repo.tags_of(id).await.unwrap().is_empty());
        assert_eq!(db.favorites().count(id).await.unwrap(), 0);
        assert!(db.history().list(7, false).await.unwrap().is_empty());
        // The author itself survives.
        assert_eq!(db.authors().list().await.unwrap().len(), 1);

        assert!(!repo.delete(id).await.unwrap());
    }
}
