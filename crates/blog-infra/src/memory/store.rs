//! In-memory blog store implementing every repository port.
//!
//! Mirrors the relational schema: foreign keys are checked on insert,
//! deletes cascade, and the (publish date, slug) pair is unique.
//! Note: Data is lost on process restart.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use blog_core::domain::{Author, Comment, Post, Tag};
use blog_core::error::RepoError;
use blog_core::ports::{
    AuthorRepository, BaseRepository, CommentRepository, PostRepository, TagRepository,
};
use blog_core::search::{self, SearchHit, SearchQuery};

#[derive(Default)]
struct Tables {
    authors: HashMap<Uuid, Author>,
    posts: HashMap<Uuid, Post>,
    tags: HashMap<Uuid, Tag>,
    /// (post_id, tag_id)
    post_tags: HashSet<(Uuid, Uuid)>,
    comments: HashMap<Uuid, Comment>,
}

impl Tables {
    fn tag_ids_of(&self, post_id: Uuid) -> HashSet<Uuid> {
        self.post_tags
            .iter()
            .filter(|(p, _)| *p == post_id)
            .map(|(_, t)| *t)
            .collect()
    }

    /// Published posts, newest first.
    fn published(&self) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self.posts.values().filter(|p| p.is_published()).collect();
        posts.sort_by_key(|p| Reverse(p.publish));
        posts
    }

    fn published_tagged(&self, tag_id: Option<Uuid>) -> Vec<&Post> {
        self.published()
            .into_iter()
            .filter(|p| tag_id.is_none_or(|t| self.post_tags.contains(&(p.id, t))))
            .collect()
    }

    fn remove_post(&mut self, post_id: Uuid) -> bool {
        if self.posts.remove(&post_id).is_none() {
            return false;
        }
        self.post_tags.retain(|(p, _)| *p != post_id);
        self.comments.retain(|_, c| c.post_id != post_id);
        true
    }
}

/// Blog data held in process memory behind an async `RwLock`.
pub struct InMemoryBlogStore {
    tables: RwLock<Tables>,
}

impl InMemoryBlogStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for InMemoryBlogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<Author, Uuid> for InMemoryBlogStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Author>, RepoError> {
        Ok(self.tables.read().await.authors.get(&id).cloned())
    }

    async fn insert(&self, author: Author) -> Result<Author, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.authors.contains_key(&author.id)
            || tables.authors.values().any(|a| a.username == author.username)
        {
            return Err(RepoError::Constraint("authors_username_key".to_string()));
        }
        tables.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.authors.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        let owned: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            tables.remove_post(post_id);
        }
        Ok(())
    }
}

#[async_trait]
impl AuthorRepository for InMemoryBlogStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Author>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .authors
            .values()
            .find(|a| a.username == username)
            .cloned())
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryBlogStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.authors.contains_key(&post.author_id) {
            return Err(RepoError::Constraint("posts_author_id_fkey".to_string()));
        }
        let clash = tables.posts.values().any(|p| {
            p.id == post.id || (p.slug == post.slug && p.publish_date() == post.publish_date())
        });
        if clash {
            return Err(RepoError::Constraint(
                "posts_publish_date_slug_key".to_string(),
            ));
        }
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        if self.tables.write().await.remove_post(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryBlogStore {
    async fn count_published(&self, tag_id: Option<Uuid>) -> Result<u64, RepoError> {
        Ok(self.tables.read().await.published_tagged(tag_id).len() as u64)
    }

    async fn list_published(
        &self,
        tag_id: Option<Uuid>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .published_tagged(tag_id)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_published_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).filter(|p| p.is_published()).cloned())
    }

    async fn find_published_by_date_slug(
        &self,
        date: NaiveDate,
        slug: &str,
    ) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .published()
            .into_iter()
            .find(|p| p.slug == slug && p.publish_date() == date)
            .cloned())
    }

    async fn similar_published(&self, post_id: Uuid, limit: u64) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        let source_tags = tables.tag_ids_of(post_id);
        if source_tags.is_empty() {
            return Ok(Vec::new());
        }

        let mut ranked: Vec<(usize, &Post)> = tables
            .published()
            .into_iter()
            .filter(|p| p.id != post_id)
            .map(|p| (tables.tag_ids_of(p.id).intersection(&source_tags).count(), p))
            .filter(|(shared, _)| *shared > 0)
            .collect();
        ranked.sort_by_key(|(shared, p)| (Reverse(*shared), Reverse(p.publish)));

        Ok(ranked
            .into_iter()
            .take(limit as usize)
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn search_published(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, RepoError> {
        let tables = self.tables.read().await;
        let mut hits: Vec<SearchHit> = tables
            .published()
            .into_iter()
            .map(|p| SearchHit {
                rank: search::rank(&p.title, &p.body, &query.text),
                post: p.clone(),
            })
            .filter(|hit| hit.rank >= query.min_rank)
            .collect();
        hits.sort_by(|a, b| {
            b.rank
                .total_cmp(&a.rank)
                .then_with(|| b.post.publish.cmp(&a.post.publish))
        });
        Ok(hits)
    }
}

#[async_trait]
impl TagRepository for InMemoryBlogStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.tags.values().find(|t| t.slug == slug).cloned())
    }

    async fn get_or_create(&self, name: &str) -> Result<Tag, RepoError> {
        let mut tables = self.tables.write().await;
        if let Some(tag) = tables.tags.values().find(|t| t.name == name) {
            return Ok(tag.clone());
        }
        let tag = Tag::new(name);
        if tables.tags.values().any(|t| t.slug == tag.slug) {
            return Err(RepoError::Constraint("tags_slug_key".to_string()));
        }
        tables.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn tag_post(&self, post_id: Uuid, tag_id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) || !tables.tags.contains_key(&tag_id) {
            return Err(RepoError::Constraint("post_tags_fkey".to_string()));
        }
        tables.post_tags.insert((post_id, tag_id));
        Ok(())
    }

    async fn tags_for_post(&self, post_id: Uuid) -> Result<Vec<Tag>, RepoError> {
        let tables = self.tables.read().await;
        let mut tags: Vec<Tag> = tables
            .tag_ids_of(post_id)
            .iter()
            .filter_map(|id| tables.tags.get(id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryBlogStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Constraint("comments_post_id_fkey".to_string()));
        }
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.tables.write().await.comments.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl CommentRepository for InMemoryBlogStore {
    async fn active_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id && c.active)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    async fn author(store: &InMemoryBlogStore) -> Author {
        let authors: &dyn AuthorRepository = store;
        authors
            .insert(Author::new("editor".into(), "editor@example.com".into()))
            .await
            .unwrap()
    }

    async fn post(
        store: &InMemoryBlogStore,
        author: &Author,
        title: &str,
        body: &str,
        days_ago: i64,
    ) -> Post {
        let publish = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap() - Duration::days(days_ago);
        let posts: &dyn PostRepository = store;
        posts
            .insert(Post::new(author.id, title.into(), body.into()).published_at(publish))
            .await
            .unwrap()
    }

    async fn tag(store: &InMemoryBlogStore, post: &Post, names: &[&str]) {
        for name in names {
            let tag = store.get_or_create(name).await.unwrap();
            store.tag_post(post.id, tag.id).await.unwrap();
        }
    }

    #[tokio::test]
    async fn drafts_never_appear_in_public_queries() {
        let store = InMemoryBlogStore::new();
        let author = author(&store).await;
        let visible = post(&store, &author, "Django basics", "django", 1).await;
        let posts: &dyn PostRepository = &store;
        let draft = posts
            .insert(Post::new(author.id, "Django secrets".into(), "django".into()))
            .await
            .unwrap();

        assert_eq!(posts.count_published(None).await.unwrap(), 1);
        let listed = posts.list_published(None, 0, 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, visible.id);
        assert!(posts.find_published_by_id(draft.id).await.unwrap().is_none());
        assert!(
            posts
                .find_published_by_date_slug(draft.publish_date(), &draft.slug)
                .await
                .unwrap()
                .is_none()
        );
        let hits = posts
            .search_published(&SearchQuery::new("django", "english"))
            .await
            .unwrap();
        assert!(hits.iter().all(|h| h.post.id != draft.id));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_filters_by_tag() {
        let store = InMemoryBlogStore::new();
        let author = author(&store).await;
        let older = post(&store, &author, "Older", "", 3).await;
        let newer = post(&store, &author, "Newer", "", 1).await;
        tag(&store, &older, &["rust"]).await;

        let posts: &dyn PostRepository = &store;
        let all = posts.list_published(None, 0, 10).await.unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![newer.id, older.id]);

        let rust = store.find_by_slug("rust").await.unwrap().unwrap();
        assert_eq!(posts.count_published(Some(rust.id)).await.unwrap(), 1);
        let tagged = posts.list_published(Some(rust.id), 0, 10).await.unwrap();
        assert_eq!(tagged[0].id, older.id);
    }

    #[tokio::test]
    async fn similar_posts_rank_by_shared_tags_then_recency() {
        let store = InMemoryBlogStore::new();
        let author = author(&store).await;
        let source = post(&store, &author, "Source", "", 0).await;
        let three = post(&store, &author, "Three shared", "", 10).await;
        let one_old = post(&store, &author, "One shared old", "", 5).await;
        let one_new = post(&store, &author, "One shared new", "", 2).await;
        let none = post(&store, &author, "Unrelated", "", 1).await;

        tag(&store, &source, &["a", "b", "c"]).await;
        tag(&store, &three, &["a", "b", "c", "d"]).await;
        tag(&store, &one_old, &["a"]).await;
        tag(&store, &one_new, &["c", "z"]).await;
        tag(&store, &none, &["z"]).await;

        let posts: &dyn PostRepository = &store;
        let similar = posts.similar_published(source.id, 4).await.unwrap();

        assert_eq!(
            similar.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![three.id, one_new.id, one_old.id]
        );
    }

    #[tokio::test]
    async fn similar_posts_are_capped() {
        let store = InMemoryBlogStore::new();
        let author = author(&store).await;
        let source = post(&store, &author, "Source", "", 0).await;
        tag(&store, &source, &["shared"]).await;
        for i in 1..=6 {
            let p = post(&store, &author, &format!("Post {i}"), "", i).await;
            tag(&store, &p, &["shared"]).await;
        }

        let posts: &dyn PostRepository = &store;
        assert_eq!(posts.similar_published(source.id, 4).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn search_keeps_ranks_above_threshold_best_first() {
        let store = InMemoryBlogStore::new();
        let author = author(&store).await;
        let title = post(&store, &author, "Django in depth", "Views and models", 3).await;
        let body_twice = post(&store, &author, "Frameworks", "django and django again", 2).await;
        post(&store, &author, "Web", "A note on django", 1).await;
        post(&store, &author, "Rust", "Ownership", 0).await;

        let posts: &dyn PostRepository = &store;
        let hits = posts
            .search_published(&SearchQuery::new("django", "english"))
            .await
            .unwrap();

        assert_eq!(
            hits.iter().map(|h| h.post.id).collect::<Vec<_>>(),
            vec![title.id, body_twice.id]
        );
        assert!(hits.iter().all(|h| h.rank >= 0.3));
        assert!(hits[0].rank > hits[1].rank);
    }

    #[tokio::test]
    async fn slug_is_unique_per_publish_date() {
        let store = InMemoryBlogStore::new();
        let author = author(&store).await;
        let first = post(&store, &author, "Same title", "", 0).await;

        let posts: &dyn PostRepository = &store;
        let same_day = Post::new(author.id, "Same title".into(), "".into())
            .published_at(first.publish + Duration::minutes(5));
        let err = posts.insert(same_day).await.unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));

        let next_day = Post::new(author.id, "Same title".into(), "".into())
            .published_at(first.publish + Duration::days(1));
        assert!(posts.insert(next_day).await.is_ok());
    }

    #[tokio::test]
    async fn comments_are_active_oldest_first_and_cascade() {
        let store = InMemoryBlogStore::new();
        let author = author(&store).await;
        let target = post(&store, &author, "Commented", "", 0).await;

        let comments: &dyn CommentRepository = &store;
        let mut first = Comment::new(target.id, "A".into(), "a@example.com".into(), "1".into());
        first.created_at -= Duration::minutes(1);
        let mut hidden = Comment::new(target.id, "B".into(), "b@example.com".into(), "2".into());
        hidden.active = false;
        let last = Comment::new(target.id, "C".into(), "c@example.com".into(), "3".into());
        for c in [last.clone(), hidden, first.clone()] {
            comments.insert(c).await.unwrap();
        }

        let active = comments.active_for_post(target.id).await.unwrap();
        assert_eq!(
            active.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![first.id, last.id]
        );

        let orphan = Comment::new(Uuid::new_v4(), "D".into(), "d@example.com".into(), "4".into());
        assert!(matches!(
            comments.insert(orphan).await,
            Err(RepoError::Constraint(_))
        ));

        let authors: &dyn AuthorRepository = &store;
        authors.delete(author.id).await.unwrap();
        assert!(comments.active_for_post(target.id).await.unwrap().is_empty());
    }
}
