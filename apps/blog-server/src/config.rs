//! Application configuration loaded from environment variables.

use std::env;

use blog_core::search::DEFAULT_SEARCH_LANGUAGE;
use blog_infra::{DatabaseConfig, SmtpConfig};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the server on the in-memory store.
    pub database: Option<DatabaseConfig>,
    /// Text search configuration passed to PostgreSQL, e.g. `portuguese`.
    pub search_language: String,
    /// `None` keeps outgoing email in an in-memory outbox.
    pub smtp: Option<SmtpConfig>,
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = non_empty("DATABASE_URL").map(|url| {
            let mut db = DatabaseConfig::new(url);
            db.max_connections = parsed("DB_MAX_CONNECTIONS").unwrap_or(db.max_connections);
            db.min_connections = parsed("DB_MIN_CONNECTIONS").unwrap_or(db.min_connections);
            db
        });

        let smtp = non_empty("SMTP_HOST").map(|host| {
            let mut smtp = SmtpConfig::new(host);
            smtp.port = parsed("SMTP_PORT").unwrap_or(smtp.port);
            smtp.user = non_empty("SMTP_USER");
            smtp.password = non_empty("SMTP_PASSWORD");
            if let Some(from) = non_empty("SMTP_FROM") {
                smtp.from = from;
            }
            smtp
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parsed("PORT").unwrap_or(8080),
            database,
            search_language: non_empty("SEARCH_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_SEARCH_LANGUAGE.to_string()),
            smtp,
        }
    }
}
