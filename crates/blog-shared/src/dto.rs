//! Data Transfer Objects - response bodies of the blog API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::response::FieldErrors;

/// A tag as shown next to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagResponse {
    pub name: String,
    pub slug: String,
}

/// A published post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub publish: DateTime<Utc>,
    /// Canonical detail path, e.g. `/blog/2024/1/5/notes/`.
    pub url: String,
    pub tags: Vec<TagResponse>,
}

/// A reader comment. The commenter's email is never exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub name: String,
    pub body: String,
    pub created: DateTime<Utc>,
}

/// Position within a paginated list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_page_number: Option<u64>,
}

/// GET /blog/ and GET /blog/tag/{tag_slug}/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub page: PageResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<TagResponse>,
}

/// Blank comment form rendered with a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentFormResponse {
    pub name: String,
    pub email: String,
    pub body: String,
}

/// GET /blog/{year}/{month}/{day}/{slug}/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
    pub comment_form: CommentFormResponse,
    pub similar_posts: Vec<PostResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub post: PostResponse,
    pub rank: f32,
}

/// GET /blog/search/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The cleaned query, absent when no search was submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub results: Vec<SearchResultItem>,
    /// Set when a blank query was submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

/// GET and POST /blog/{post_id}/share/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareResponse {
    pub post: PostResponse,
    pub sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

/// POST /blog/{post_id}/comment/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentCreatedResponse {
    pub post: PostResponse,
    pub comment: CommentResponse,
}
