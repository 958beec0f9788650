use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    Author, AuthorDraft, AuthorId, AuthorPatch, AuthorRepository, DomainError, Result, UserId,
};
use sqlx::{SqliteConnection, SqlitePool};

use super::{begin_write, db_error, fold};
use super::rows::{AuthorRow, AUTHOR_COLUMNS};

pub struct SqliteAuthorRepository {
    pool: SqlitePool,
}

impl SqliteAuthorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn fetch_author(conn: &mut SqliteConnection, id: AuthorId) -> Result<Option<Author>> {
    let sql = format!("SELECT {AUTHOR_COLUMNS} FROM authors a WHERE a.id = ?");
    let row = sqlx::query_as::<_, AuthorRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(db_error)?;
    Ok(row.map(Author::from))
}

/// Id of the author with this exact email, inserting the draft when absent.
/// Runs on the caller's connection so it joins the caller's transaction.
pub(crate) async fn find_or_insert(
    conn: &mut SqliteConnection,
    draft: &AuthorDraft,
    now: DateTime<Utc>,
) -> Result<AuthorId> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM authors WHERE email = ?")
        .bind(&draft.email)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error)?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let id = insert_author(conn, draft, now).await?;
    tracing::debug!(author_id = id, email = %draft.email, "author created");
    Ok(id)
}

async fn insert_author(
    conn: &mut SqliteConnection,
    draft: &AuthorDraft,
    now: DateTime<Utc>,
) -> Result<AuthorId> {
    sqlx::query_scalar(
        "INSERT INTO authors (first_name, paternal_surname, maternal_surname, \
         first_name_folded, paternal_surname_folded, maternal_surname_folded, email, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&draft.first_name)
    .bind(&draft.paternal_surname)
    .bind(&draft.maternal_surname)
    .bind(fold(&draft.first_name))
    .bind(fold(&draft.paternal_surname))
    .bind(draft.maternal_surname.as_deref().map(fold))
    .bind(&draft.email)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await
    .map_err(db_error)
}

#[async_trait]
impl AuthorRepository for SqliteAuthorRepository {
    async fn list(&self) -> Result<Vec<Author>> {
        let sql = format!("SELECT {AUTHOR_COLUMNS} FROM authors a ORDER BY a.id");
        let rows = sqlx::query_as::<_, AuthorRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Author::from).collect())
    }

    async fn find(&self, id: AuthorId) -> Result<Option<Author>> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        fetch_author(&mut conn, id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Author>> {
        let sql = format!("SELECT {AUTHOR_COLUMNS} FROM authors a WHERE a.email = ?");
        let row = sqlx::query_as::<_, AuthorRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Author::from))
    }

    async fn create(&self, draft: AuthorDraft) -> Result<Author> {
        let mut tx = begin_write(&self.pool).await?;
        let id = insert_author(&mut tx, &draft, Utc::now()).await?;
        let author = fetch_author(&mut tx, id)
            .await?
            .ok_or_else(|| DomainError::internal("inserted author could not be read back"))?;
        tx.commit().await.map_err(db_error)?;
        Ok(author)
    }

    async fn find_or_create(&self, draft: AuthorDraft) -> Result<Author> {
        let mut tx = begin_write(&self.pool).await?;
        let id = find_or_insert(&mut tx, &draft, Utc::now()).await?;
        let author = fetch_author(&mut tx, id)
            .await?
            .ok_or_else(|| DomainError::internal("inserted author could not be read back"))?;
        tx.commit().await.map_err(db_error)?;
        Ok(author)
    }

    async fn update(&self, id: AuthorId, patch: AuthorPatch) -> Result<Option<Author>> {
        let mut tx = begin_write(&self.pool).await?;
        let Some(current) = fetch_author(&mut tx, id).await? else {
            return Ok(None);
        };

        let maternal = match patch.maternal_surname {
            Some(m) if m.is_empty() => None,
            Some(m) => Some(m),
            None => current.maternal_surname,
        };
        let first_name = patch.first_name.unwrap_or(current.first_name);
        let paternal_surname = patch.paternal_surname.unwrap_or(current.paternal_surname);
        sqlx::query(
            "UPDATE authors SET first_name = ?, paternal_surname = ?, maternal_surname = ?, \
             first_name_folded = ?, paternal_surname_folded = ?, maternal_surname_folded = ?, \
             email = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&first_name)
        .bind(&paternal_surname)
        .bind(&maternal)
        .bind(fold(&first_name))
        .bind(fold(&paternal_surname))
        .bind(maternal.as_deref().map(fold))
        .bind(patch.email.unwrap_or(current.email))
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        let updated = fetch_author(&mut tx, id).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(updated)
    }

    async fn delete(&self, id: AuthorId) -> Result<bool> {
        let mut tx = begin_write(&self.pool).await?;
        for table in ["author_materials", "user_authors"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE author_id = ?"))
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }
        let deleted = sqlx::query("DELETE FROM authors WHERE id = ?")
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

    async fn author_of_user(&self, user_id: UserId) -> Result<Option<AuthorId>> {
        sqlx::query_scalar("SELECT author_id FROM user_authors WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    /// Both sides are checked inside the inserting transaction; the UNIQUE
    /// constraints catch anything that slips between concurrent writers.
    async fn link_user(&self, user_id: UserId, author_id: AuthorId) -> Result<()> {
        let mut tx = begin_write(&self.pool).await?;

        let user_taken: Option<i64> =
            sqlx::query_scalar("SELECT author_id FROM user_authors WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;
        if user_taken.is_some() {
            return Err(DomainError::conflict(format!(
                "user {user_id} is already linked to an author"
            )));
        }

        let author_taken: Option<i64> =
            sqlx::query_scalar("SELECT user_id FROM user_authors WHERE author_id = ?")
                .bind(author_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;
        if author_taken.is_some() {
            return Err(DomainError::conflict(format!(
                "author {author_id} is already linked to a user"
            )));
        }

        sqlx::query("INSERT INTO user_authors (user_id, author_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(author_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn unlink_user(&self, user_id: UserId, author_id: AuthorId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_authors WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::fixtures::{db, draft};
    use crate::sqlite::SqliteDatabase;

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let db = db().await;
        let repo = db.authors();
        repo.create(draft("Ana", "Lopez", Some("Diaz"), "ana@ipn.mx"))
            .await
            .unwrap();
        let err = repo
            .create(draft("Otra", "Ana", None, "ana@ipn.mx"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn find_or_create_is_idempotent_by_email() {
        let db = db().await;
        let repo = db.authors();
        let first = repo
            .find_or_create(draft("Ana", "Lopez", None, "ana@ipn.mx"))
            .await
            .unwrap();
        let again = repo
            .find_or_create(draft("Anita", "L.", None, "ana@ipn.mx"))
            .await
            .unwrap();
        assert_eq!(first, again);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn patch_keeps_unset_fields_and_clears_blank_maternal() {
        let db = db().await;
        let repo = db.authors();
        let a = repo
            .create(draft("Ana", "Lopez", Some("Diaz"), "ana@ipn.mx"))
            .await
            .unwrap();
        let patch = AuthorPatch {
            first_name: Some("Ana Maria".into()),
            maternal_surname: Some(String::new()),
            ..Default::default()
        };
        let updated = repo.update(a.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.first_name, "Ana Maria");
        assert_eq!(updated.paternal_surname, "Lopez");
        assert_eq!(updated.maternal_surname, None);
        assert!(repo.update(404, AuthorPatch::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn user_author_relation_is_one_to_one() {
        let db = db().await;
        let repo = db.authors();
        let a = repo.create(draft("A", "A", None, "a@ipn.mx")).await.unwrap();
        let b = repo.create(draft("B", "B", None, "b@ipn.mx")).await.unwrap();

        repo.link_user(1, a.id).await.unwrap();
        assert!(matches!(repo.link_user(1, b.id).await, Err(DomainError::Conflict(_))));
        assert!(matches!(repo.link_user(2, a.id).await, Err(DomainError::Conflict(_))));
        assert_eq!(repo.author_of_user(1).await.unwrap(), Some(a.id));

        assert!(!repo.unlink_user(1, b.id).await.unwrap());
        assert!(repo.unlink_user(1, a.id).await.unwrap());
        repo.link_user(2, a.id).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_links_lose_with_a_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("race.db").display());
        let db = SqliteDatabase::connect(&url, 8).await.unwrap();
        db.migrate().await.unwrap();

        for round in 0..20_i64 {
            let a = db
                .authors()
                .create(draft("A", "A", None, &format!("a{round}@ipn.mx")))
                .await
                .unwrap();
            let b = db
                .authors()
                .create(draft("B", "B", None, &format!("b{round}@ipn.mx")))
                .await
                .unwrap();
            let user = 100 + round;

            let first = tokio::spawn({
                let repo = db.authors();
                async move { repo.link_user(user, a.id).await }
            });
            let second = tokio::spawn({
                let repo = db.authors();
                async move { repo.link_user(user, b.id).await }
            });
            let outcomes = [first.await.unwrap(), second.await.unwrap()];

            assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1, "round {round}");
            assert!(
                outcomes
                    .iter()
                    .any(|r| matches!(r, Err(DomainError::Conflict(_)))),
                "round {round}: {outcomes:?}"
            );
        }
    }

    #[tokio::test]
    async fn deleting_an_author_drops_its_relation() {
        let db = db().await;
        let repo = db.authors();
        let a = repo.create(draft("A", "A", None, "a@ipn.mx")).await.unwrap();
        repo.link_user(1, a.id).await.unwrap();

        assert!(repo.delete(a.id).await.unwrap());
        assert_eq!(repo.author_of_user(1).await.unwrap(), None);
        assert!(!repo.delete(a.id).await.unwrap());
    }
}
