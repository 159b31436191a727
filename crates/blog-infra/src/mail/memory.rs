//! In-memory outbox - used when no SMTP relay is configured, and in tests.

use async_trait::async_trait;
use tokio::sync::RwLock;

use blog_core::ports::{MailError, Mailer, OutgoingEmail};

use super::mask_email;

/// Keeps every email it is asked to send and logs it.
///
/// Note: Data is lost on process restart.
pub struct InMemoryMailer {
    outbox: RwLock<Vec<OutgoingEmail>>,
    fail_with: Option<String>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self {
            outbox: RwLock::new(Vec::new()),
            fail_with: None,
        }
    }

    /// A mailer whose every delivery fails with a transport error.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outbox: RwLock::new(Vec::new()),
            fail_with: Some(reason.into()),
        }
    }

    /// Emails delivered so far, oldest first.
    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox.read().await.clone()
    }
}

impl Default for InMemoryMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        if let Some(reason) = &self.fail_with {
            return Err(MailError::Transport(reason.clone()));
        }

        let recipients: Vec<String> = email.to.iter().map(|to| mask_email(to)).collect();
        tracing::info!(
            to = ?recipients,
            subject = %email.subject,
            "Email stored in in-memory outbox"
        );

        self.outbox.write().await.push(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keeps_sent_emails_in_order() {
        let mailer = InMemoryMailer::new();
        mailer
            .send(OutgoingEmail::new("a@example.com", "First", "1"))
            .await
            .unwrap();
        mailer
            .send(OutgoingEmail::new("b@example.com", "Second", "2"))
            .await
            .unwrap();

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].subject, "First");
        assert_eq!(sent[1].to, vec!["b@example.com".to_string()]);
    }

    #[tokio::test]
    async fn failing_mailer_reports_transport_error() {
        let mailer = InMemoryMailer::failing("relay down");

        let err = mailer
            .send(OutgoingEmail::new("a@example.com", "Subject", "Body"))
            .await
            .unwrap_err();

        assert!(matches!(err, MailError::Transport(reason) if reason == "relay down"));
        assert!(mailer.sent().await.is_empty());
    }
}
