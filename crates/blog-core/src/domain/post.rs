use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slug::slugify;

/// Publishing state of a post. Only `Published` posts are publicly visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    /// Two-letter code stored in the `status` column.
    pub fn code(&self) -> &'static str {
        match self {
            PostStatus::Draft => "DF",
            PostStatus::Published => "PB",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PostStatus::Draft => "Draft",
            PostStatus::Published => "Published",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "DF" => Some(PostStatus::Draft),
            "PB" => Some(PostStatus::Published),
            _ => None,
        }
    }
}

/// Post entity - a blog article written by an author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    /// Unique among posts published on the same date.
    pub slug: String,
    pub body: String,
    pub publish: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: PostStatus,
}

impl Post {
    /// Create a new draft post. The slug is derived from the title and the
    /// publish time defaults to now.
    pub fn new(author_id: Uuid, title: String, body: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            slug: slugify(&title),
            title,
            body,
            publish: now,
            created_at: now,
            updated_at: now,
            status: PostStatus::Draft,
        }
    }

    pub fn published_at(mut self, publish: DateTime<Utc>) -> Self {
        self.publish = publish;
        self.status = PostStatus::Published;
        self
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Calendar date (UTC) the slug must be unique for.
    pub fn publish_date(&self) -> NaiveDate {
        self.publish.date_naive()
    }

    /// Canonical detail path: `/blog/{year}/{month}/{day}/{slug}/`.
    pub fn absolute_path(&self) -> String {
        format!(
            "/blog/{}/{}/{}/{}/",
            self.publish.year(),
            self.publish.month(),
            self.publish.day(),
            self.slug
        )
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}
