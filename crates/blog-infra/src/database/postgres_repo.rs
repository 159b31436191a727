//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime};
use sea_orm::prelude::{DateTimeWithTimeZone, Uuid};
use sea_orm::sea_query::{Expr, OnConflict, Query};
use sea_orm::{
    ColumnTrait, DbBackend, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select, Set, Statement, Value,
};

use blog_core::domain::{Author, Comment, Post, PostStatus, Tag};
use blog_core::error::RepoError;
use blog_core::ports::{AuthorRepository, CommentRepository, PostRepository, TagRepository};
use blog_core::search::{SearchHit, SearchQuery};

use super::entity::author::{self, Entity as AuthorEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_tag::{self, Entity as PostTagEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::postgres_base::{PostgresBaseRepository, repo_error};

/// PostgreSQL author repository.
pub type PostgresAuthorRepository = PostgresBaseRepository<AuthorEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL tag repository.
pub type PostgresTagRepository = PostgresBaseRepository<TagEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// Published posts, newest first.
pub(crate) fn published() -> Select<PostEntity> {
    PostEntity::find()
        .filter(post::Column::Status.eq(post::Status::Published))
        .order_by_desc(post::Column::Publish)
}

/// Published posts, restricted to those carrying `tag_id` when given.
pub(crate) fn published_tagged(tag_id: Option<Uuid>) -> Select<PostEntity> {
    match tag_id {
        Some(tag_id) => published().filter(
            post::Column::Id.in_subquery(
                Query::select()
                    .column(post_tag::Column::PostId)
                    .from(post_tag::Entity)
                    .and_where(post_tag::Column::TagId.eq(tag_id))
                    .to_owned(),
            ),
        ),
        None => published(),
    }
}

/// Published posts other than `post_id` carrying any of `tag_ids`, ranked by
/// how many of those tags they carry, then by publish time.
pub(crate) fn similar(post_id: Uuid, tag_ids: Vec<Uuid>, limit: u64) -> Select<PostEntity> {
    PostEntity::find()
        .join(JoinType::InnerJoin, post::Relation::PostTag.def())
        .filter(post_tag::Column::TagId.is_in(tag_ids))
        .filter(post::Column::Id.ne(post_id))
        .filter(post::Column::Status.eq(post::Status::Published))
        .group_by(post::Column::Id)
        .order_by_desc(Expr::col((post_tag::Entity, post_tag::Column::TagId)).count())
        .order_by_desc(post::Column::Publish)
        .limit(limit)
}

const SEARCH_SQL: &str = r#"SELECT * FROM (
    SELECT p.id, p.author_id, p.title, p.slug, p.body, p.publish,
           p.created_at, p.updated_at, p.status,
           ts_rank(
               setweight(to_tsvector($1::regconfig, coalesce(p.title, '')), 'A')
                   || setweight(to_tsvector($1::regconfig, coalesce(p.body, '')), 'B'),
               plainto_tsquery($1::regconfig, $2)
           ) AS rank
    FROM posts p
    WHERE p.status = $3
) ranked
WHERE ranked.rank >= $4
ORDER BY ranked.rank DESC, ranked.publish DESC"#;

/// Weighted full-text search: title is weight A, body weight B.
pub(crate) fn search_statement(query: &SearchQuery) -> Statement {
    Statement::from_sql_and_values(
        DbBackend::Postgres,
        SEARCH_SQL,
        [
            Value::from(query.language.clone()),
            Value::from(query.text.clone()),
            Value::from(PostStatus::Published.code()),
            Value::from(query.min_rank),
        ],
    )
}

#[derive(Debug, FromQueryResult)]
struct RankedPost {
    id: Uuid,
    author_id: Uuid,
    title: String,
    slug: String,
    body: String,
    publish: DateTimeWithTimeZone,
    created_at: DateTimeWithTimeZone,
    updated_at: DateTimeWithTimeZone,
    status: post::Status,
    rank: f32,
}

impl From<RankedPost> for SearchHit {
    fn from(row: RankedPost) -> Self {
        let model = post::Model {
            id: row.id,
            author_id: row.author_id,
            title: row.title,
            slug: row.slug,
            body: row.body,
            publish: row.publish,
            created_at: row.created_at,
            updated_at: row.updated_at,
            status: row.status,
        };
        SearchHit {
            post: model.into(),
            rank: row.rank,
        }
    }
}

#[async_trait]
impl AuthorRepository for PostgresAuthorRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Author>, RepoError> {
        tracing::debug!(username, "Finding author by username");

        let result = AuthorEntity::find()
            .filter(author::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn count_published(&self, tag_id: Option<Uuid>) -> Result<u64, RepoError> {
        published_tagged(tag_id)
            .count(self.db.as_ref())
            .await
            .map_err(repo_error)
    }

    async fn list_published(
        &self,
        tag_id: Option<Uuid>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let result = published_tagged(tag_id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_published_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let result = published()
            .filter(post::Column::Id.eq(id))
            .one(self.db.as_ref())
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }

    async fn find_published_by_date_slug(
        &self,
        date: NaiveDate,
        slug: &str,
    ) -> Result<Option<Post>, RepoError> {
        let day_start = date.and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);

        let result = published()
            .filter(post::Column::Slug.eq(slug))
            .filter(post::Column::Publish.gte(day_start))
            .filter(post::Column::Publish.lt(day_end))
            .one(self.db.as_ref())
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }

    async fn similar_published(&self, post_id: Uuid, limit: u64) -> Result<Vec<Post>, RepoError> {
        let tag_ids: Vec<Uuid> = PostTagEntity::find()
            .select_only()
            .column(post_tag::Column::TagId)
            .filter(post_tag::Column::PostId.eq(post_id))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(repo_error)?;

        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = similar(post_id, tag_ids, limit)
            .all(self.db.as_ref())
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn search_published(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, RepoError> {
        tracing::debug!(query = %query.text, language = %query.language, "Searching posts");

        let rows = RankedPost::find_by_statement(search_statement(query))
            .all(self.db.as_ref())
            .await
            .map_err(repo_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        let result = TagEntity::find()
            .filter(tag::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }

    async fn get_or_create(&self, name: &str) -> Result<Tag, RepoError> {
        let existing = TagEntity::find()
            .filter(tag::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(repo_error)?;

        if let Some(model) = existing {
            return Ok(model.into());
        }

        let active_model: tag::ActiveModel = Tag::new(name).into();
        let model = TagEntity::insert(active_model)
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(repo_error)?;

        Ok(model.into())
    }

    async fn tag_post(&self, post_id: Uuid, tag_id: Uuid) -> Result<(), RepoError> {
        let link = post_tag::ActiveModel {
            post_id: Set(post_id),
            tag_id: Set(tag_id),
        };

        PostTagEntity::insert(link)
            .on_conflict(
                OnConflict::columns([post_tag::Column::PostId, post_tag::Column::TagId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(repo_error)?;

        Ok(())
    }

    async fn tags_for_post(&self, post_id: Uuid) -> Result<Vec<Tag>, RepoError> {
        let result = TagEntity::find()
            .join(JoinType::InnerJoin, tag::Relation::PostTag.def())
            .filter(post_tag::Column::PostId.eq(post_id))
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn active_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::Active.eq(true))
            .order_by_asc(comment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}
