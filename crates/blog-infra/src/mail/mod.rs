//! Mail backends: SMTP delivery and an in-memory outbox.

mod memory;
#[cfg(feature = "smtp")]
mod smtp;

pub use memory::InMemoryMailer;
#[cfg(feature = "smtp")]
pub use smtp::SmtpMailer;

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Sender address used for every outgoing email.
    pub from: String,
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 1025,
            user: None,
            password: None,
            from: "webmaster@localhost".to_string(),
        }
    }

    /// Credentials are only used when both parts are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Some((user, password)),
            _ => None,
        }
    }
}

/// Mask an address for logging: `jane@example.com` -> `j***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{first}***"),
                _ => "***".to_string(),
            };
            format!("{masked_local}{domain}")
        }
        None => "***".to_string(),
    }
}
