use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Author, Comment, Post, Tag};
use crate::error::RepoError;
use crate::search::{SearchHit, SearchQuery};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Author repository.
#[async_trait]
pub trait AuthorRepository: BaseRepository<Author, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<Author>, RepoError>;
}

/// Post repository.
///
/// Every `*_published` method sees only posts whose status is `Published`,
/// newest publish time first. Public views must go through these.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Number of published posts, optionally only those tagged `tag_id`.
    async fn count_published(&self, tag_id: Option<Uuid>) -> Result<u64, RepoError>;

    /// A slice of published posts, optionally only those tagged `tag_id`.
    async fn list_published(
        &self,
        tag_id: Option<Uuid>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError>;

    async fn find_published_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    async fn find_published_by_date_slug(
        &self,
        date: NaiveDate,
        slug: &str,
    ) -> Result<Option<Post>, RepoError>;

    /// Other published posts sharing tags with `post_id`, most shared tags
    /// first, then newest first.
    async fn similar_published(&self, post_id: Uuid, limit: u64) -> Result<Vec<Post>, RepoError>;

    /// Published posts ranked against `query`, best first, rank >= `query.min_rank`.
    async fn search_published(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, RepoError>;
}

/// Tag repository.
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError>;

    /// Fetch the tag called `name`, creating it if needed.
    async fn get_or_create(&self, name: &str) -> Result<Tag, RepoError>;

    /// Attach a tag to a post. Attaching twice is a no-op.
    async fn tag_post(&self, post_id: Uuid, tag_id: Uuid) -> Result<(), RepoError>;

    async fn tags_for_post(&self, post_id: Uuid) -> Result<Vec<Tag>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Active comments on a post, oldest first.
    async fn active_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;
}
