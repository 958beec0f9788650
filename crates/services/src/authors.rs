//! # Author Directory
//!
//! CRUD over authors plus the one-to-one relation between a platform user
//! and the author record that represents them.

use std::sync::Arc;

use domains::validation::{is_well_formed_email, required_text};
use domains::{
    Author, AuthorDraft, AuthorId, AuthorPatch, AuthorRepository, DomainError, Result, UserId,
};

use crate::Ports;

#[derive(Clone)]
pub struct AuthorDirectory {
    authors: Arc<dyn AuthorRepository>,
}

fn check_email(email: &str) -> Result<String> {
    let email = email.trim();
    if is_well_formed_email(email) {
        Ok(email.to_string())
    } else {
        Err(DomainError::validation(format!("email '{email}' is not valid")))
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn check_draft(draft: AuthorDraft) -> Result<AuthorDraft> {
    Ok(AuthorDraft {
        first_name: required_text("firstName", &draft.first_name)?,
        paternal_surname: required_text("paternalSurname", &draft.paternal_surname)?,
        maternal_surname: optional_text(draft.maternal_surname),
        email: check_email(&draft.email)?,
    })
}

impl AuthorDirectory {
    pub fn new(ports: &Ports) -> Self {
        Self {
            authors: ports.authors.clone(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Author>> {
        self.authors.list().await
    }

    pub async fn get(&self, id: AuthorId) -> Result<Author> {
        self.authors
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("author", id))
    }

    #[tracing::instrument(skip(self, draft), fields(email = %draft.email))]
    pub async fn create(&self, draft: AuthorDraft) -> Result<Author> {
        let draft = check_draft(draft)?;
        if self.authors.find_by_email(&draft.email).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "an author with email '{}' already exists",
                draft.email
            )));
        }
        let author = self.authors.create(draft).await?;
        tracing::info!(author_id = author.id, "author created");
        Ok(author)
    }

    pub async fn find_or_create(&self, draft: AuthorDraft) -> Result<Author> {
        self.authors.find_or_create(check_draft(draft)?).await
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update(&self, id: AuthorId, patch: AuthorPatch) -> Result<Author> {
        let patch = AuthorPatch {
            first_name: patch
                .first_name
                .map(|v| required_text("firstName", &v))
                .transpose()?,
            paternal_surname: patch
                .paternal_surname
                .map(|v| required_text("paternalSurname", &v))
                .transpose()?,
            maternal_surname: patch.maternal_surname.map(|v| v.trim().to_string()),
            email: patch.email.map(|v| check_email(&v)).transpose()?,
        };
        if let Some(email) = &patch.email {
            if let Some(other) = self.authors.find_by_email(email).await? {
                if other.id != id {
                    return Err(DomainError::conflict(format!(
                        "an author with email '{email}' already exists"
                    )));
                }
            }
        }
        self.authors
            .update(id, patch)
            .await?
            .ok_or_else(|| DomainError::not_found("author", id))
    }

    pub async fn delete(&self, id: AuthorId) -> Result<()> {
        if self.authors.delete(id).await? {
            tracing::info!(author_id = id, "author deleted");
            Ok(())
        } else {
            Err(DomainError::not_found("author", id))
        }
    }

    /// The author record linked to `user_id`.
    pub async fn author_of_user(&self, user_id: UserId) -> Result<Author> {
        let author_id = self
            .authors
            .author_of_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("author relation for user", user_id))?;
        self.get(author_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn link_user(&self, user_id: UserId, author_id: AuthorId) -> Result<()> {
        self.get(author_id).await?;
        self.authors.link_user(user_id, author_id).await?;
        tracing::info!(user_id, author_id, "user linked to author");
        Ok(())
    }

    pub async fn unlink_user(&self, user_id: UserId, author_id: AuthorId) -> Result<()> {
        if self.authors.unlink_user(user_id, author_id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found(
                "author relation",
                format!("{user_id}/{author_id}"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{author, PortMocks};
    use mockall::predicate::eq;

    fn draft(email: &str) -> AuthorDraft {
        AuthorDraft {
            first_name: " Ana ".into(),
            paternal_surname: "Lopez".into(),
            maternal_surname: Some("  ".into()),
            email: email.into(),
        }
    }

    #[tokio::test]
    async fn create_trims_and_rejects_duplicate_email() {
        let mut mocks = PortMocks::default();
        mocks
            .authors
            .expect_find_by_email()
            .with(eq("ana@ipn.mx"))
            .returning(|_| Ok(Some(author(3))));
        mocks.authors.expect_create().never();

        let err = mocks
            .author_directory()
            .create(draft(" ana@ipn.mx "))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn create_normalizes_blank_maternal_surname() {
        let mut mocks = PortMocks::default();
        mocks.authors.expect_find_by_email().returning(|_| Ok(None));
        mocks
            .authors
            .expect_create()
            .withf(|d| d.first_name == "Ana" && d.maternal_surname.is_none())
            .returning(|_| Ok(author(4)));

        let created = mocks
            .author_directory()
            .create(draft("ana@ipn.mx"))
            .await
            .unwrap();
        assert_eq!(created.id, 4);
    }

    #[tokio::test]
    async fn malformed_email_is_rejected() {
        let err = PortMocks::default()
            .author_directory()
            .create(draft("not-an-email"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn linking_to_unknown_author_is_not_found() {
        let mut mocks = PortMocks::default();
        mocks.authors.expect_find().returning(|_| Ok(None));
        mocks.authors.expect_link_user().never();

        let err = mocks.author_directory().link_user(1, 2).await.unwrap_err();
        assert_eq!(err, DomainError::not_found("author", 2));
    }

    #[tokio::test]
    async fn user_without_relation_is_not_found() {
        let mut mocks = PortMocks::default();
        mocks.authors.expect_author_of_user().returning(|_| Ok(None));
        let err = mocks.author_directory().author_of_user(1).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
