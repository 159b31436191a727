//! SMTP delivery via lettre.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use blog_core::ports::{MailError, Mailer, OutgoingEmail};

use super::{SmtpConfig, mask_email};

/// Sends plain-text email through an SMTP relay.
#[derive(Clone)]
pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidAddress(format!("{}: {e}", config.from)))?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(config.port);
        if let Some((user, password)) = config.credentials() {
            builder = builder.credentials(Credentials::new(user.to_owned(), password.to_owned()));
        }

        tracing::info!(host = %config.host, port = config.port, "SMTP mailer configured");

        Ok(Self {
            from,
            transport: builder.build(),
        })
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<Message, MailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN);

        for to in &email.to {
            let mailbox = to
                .parse::<Mailbox>()
                .map_err(|e| MailError::InvalidAddress(format!("{}: {e}", mask_email(to))))?;
            builder = builder.to(mailbox);
        }

        builder
            .body(email.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[tracing::instrument(skip_all, fields(recipients = email.to.len()))]
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let message = self.build_message(&email)?;

        self.transport.send(message).await.map_err(|e| {
            tracing::error!(error = %e, "SMTP delivery failed");
            MailError::Transport(e.to_string())
        })?;

        tracing::info!(subject = %email.subject, "Email sent");
        Ok(())
    }
}
