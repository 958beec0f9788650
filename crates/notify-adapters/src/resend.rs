use std::time::Duration;

use async_trait::async_trait;
use domains::{DomainError, Result, ReviewNotifier};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::template::PendingReviewEmail;

const DEFAULT_ENDPOINT: &str = "https://api.resend.com/emails";

/// Sends the pending-review email through Resend's HTTP API.
pub struct ResendNotifier {
    client: reqwest::Client,
    api_key: SecretString,
    from: String,
    recipients: Vec<String>,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    from: &'a str,
    to: &'a [String],
    subject: String,
    html: String,
}

impl ResendNotifier {
    /// `from` is a full sender, e.g. `"Repositorio <no-reply@example.org>"`.
    /// `timeout` bounds the whole request, connect included.
    pub fn new(
        api_key: SecretString,
        from: String,
        recipients: Vec<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            from,
            recipients,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn message(&self, material_name: &str, author_names: &str) -> Result<Message<'_>> {
        let email = PendingReviewEmail {
            material_name,
            author_names,
        };
        Ok(Message {
            from: &self.from,
            to: &self.recipients,
            subject: email.subject(),
            html: email.to_html()?,
        })
    }
}

#[async_trait]
impl ReviewNotifier for ResendNotifier {
    async fn notify_pending_review(&self, material_name: &str, author_names: &str) -> Result<()> {
        if self.recipients.is_empty() {
            tracing::warn!(material_name, "no review recipients configured; email skipped");
            return Ok(());
        }
        let message = self.message(material_name, author_names)?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&message)
            .send()
            .await
            .map_err(|e| DomainError::internal(format!("email request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body, "email provider rejected the message");
            return Err(DomainError::internal(format!(
                "email provider returned {status}"
            )));
        }
        tracing::info!(material_name, recipients = self.recipients.len(), "review email sent");
        Ok(())
    }
}
