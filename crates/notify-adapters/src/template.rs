use askama::Template;
use domains::{DomainError, Result};

/// Body of the "ZIP waiting for review" email.
#[derive(Template)]
#[template(path = "pending_review.html")]
pub struct PendingReviewEmail<'a> {
    pub material_name: &'a str,
    pub author_names: &'a str,
}

impl PendingReviewEmail<'_> {
    pub fn subject(&self) -> String {
        format!("Material pendiente de revisión: {}", self.material_name)
    }

    pub fn to_html(&self) -> Result<String> {
        self.render()
            .map_err(|e| DomainError::internal(format!("failed to render email: {e}")))
    }
}
