//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::ports::{CommentRepository, Mailer, PostRepository, TagRepository};
use blog_infra::{DatabaseConnections, InMemoryBlogStore, InMemoryMailer};

#[cfg(feature = "postgres")]
use blog_infra::{PostgresCommentRepository, PostgresPostRepository, PostgresTagRepository};
#[cfg(feature = "smtp")]
use blog_infra::SmtpMailer;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub search_language: String,
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let mailer = Self::mailer(config);

        #[cfg(feature = "postgres")]
        if let Some(db_config) = &config.database {
            match DatabaseConnections::init(db_config).await {
                Ok(connections) => {
                    let conn = Arc::new(connections);
                    tracing::info!("Application state initialized (postgres)");
                    return Self {
                        posts: Arc::new(PostgresPostRepository::shared(conn.main.clone())),
                        tags: Arc::new(PostgresTagRepository::shared(conn.main.clone())),
                        comments: Arc::new(PostgresCommentRepository::shared(conn.main.clone())),
                        mailer,
                        search_language: config.search_language.clone(),
                        db: Some(conn),
                    };
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                }
            }
        }

        if config.database.is_none() {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }

        tracing::info!("Application state initialized (in-memory)");
        Self::in_memory(
            Arc::new(InMemoryBlogStore::new()),
            mailer,
            config.search_language.clone(),
        )
    }

    /// State backed entirely by one in-memory store.
    pub fn in_memory(
        store: Arc<InMemoryBlogStore>,
        mailer: Arc<dyn Mailer>,
        search_language: String,
    ) -> Self {
        Self {
            posts: store.clone(),
            tags: store.clone(),
            comments: store,
            mailer,
            search_language,
            db: None,
        }
    }

    /// `"postgres"` or `"memory"`.
    pub fn storage(&self) -> &'static str {
        if self.db.is_some() { "postgres" } else { "memory" }
    }

    fn mailer(config: &AppConfig) -> Arc<dyn Mailer> {
        #[cfg(feature = "smtp")]
        if let Some(smtp) = &config.smtp {
            match SmtpMailer::new(smtp) {
                Ok(mailer) => return Arc::new(mailer),
                Err(e) => {
                    tracing::error!("Invalid SMTP configuration: {}. Using in-memory outbox.", e)
                }
            }
        }

        if config.smtp.is_none() {
            tracing::warn!("SMTP_HOST not set. Outgoing email is kept in memory and logged.");
        }
        Arc::new(InMemoryMailer::new())
    }
}
