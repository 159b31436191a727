//! # Blog Infrastructure
//!
//! Concrete implementations of the ports defined in `blog-core`.
//! This crate contains the database repositories, the in-memory fallback
//! store and the mail backends.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `smtp` - SMTP mail delivery via lettre

pub mod database;
pub mod mail;
pub mod memory;

// Re-exports - In-Memory
pub use database::{DatabaseConfig, DatabaseConnections};
pub use mail::{InMemoryMailer, SmtpConfig};
pub use memory::InMemoryBlogStore;

// Re-exports - External
#[cfg(feature = "postgres")]
pub use database::{
    PostgresAuthorRepository, PostgresCommentRepository, PostgresPostRepository,
    PostgresTagRepository,
};
#[cfg(feature = "smtp")]
pub use mail::SmtpMailer;
