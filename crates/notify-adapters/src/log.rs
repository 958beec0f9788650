use async_trait::async_trait;
use domains::{Result, ReviewNotifier};

/// Records pending-review events in the log instead of sending mail.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier {
    recipients: Vec<String>,
}

impl LogNotifier {
    pub fn new(recipients: Vec<String>) -> Self {
        Self { recipients }
    }
}

#[async_trait]
impl ReviewNotifier for LogNotifier {
    async fn notify_pending_review(&self, material_name: &str, author_names: &str) -> Result<()> {
        tracing::info!(
            material_name,
            author_names,
            recipients = ?self.recipients,
            "material pending review"
        );
        Ok(())
    }
}
