//! Public post views: list, tag list, detail and search.

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;

use blog_core::DomainError;
use blog_core::domain::Tag;
use blog_core::forms::{Form, SearchForm};
use blog_core::pagination::{POSTS_PER_PAGE, Paginator};
use blog_core::search::SearchQuery;
use blog_shared::dto::{
    CommentFormResponse, PostDetailResponse, PostListResponse, SearchResponse, SearchResultItem,
};

use super::render;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Similar posts shown under a post.
const SIMILAR_POSTS: u64 = 4;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Raw page number; anything unparsable falls back to a valid page.
    pub page: Option<String>,
}

/// GET /blog/
pub async fn post_list(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    list(&state, None, query.page.as_deref()).await
}

/// GET /blog/tag/{tag_slug}/
pub async fn post_list_by_tag(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let tag = state
        .tags
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| DomainError::not_found("Tag", &slug))?;

    list(&state, Some(tag), query.page.as_deref()).await
}

async fn list(state: &AppState, tag: Option<Tag>, page: Option<&str>) -> AppResult<HttpResponse> {
    let tag_id = tag.as_ref().map(|t| t.id);
    let count = state.posts.count_published(tag_id).await?;
    let window = Paginator::new(count, POSTS_PER_PAGE).page(page);

    let posts = state
        .posts
        .list_published(tag_id, window.offset(), window.limit())
        .await?;

    tracing::debug!(
        tag = tag.as_ref().map(|t| t.slug.as_str()),
        page = window.number,
        count,
        "Listing published posts"
    );

    Ok(HttpResponse::Ok().json(PostListResponse {
        posts: render::posts(state, posts).await?,
        page: render::page(&window),
        tag: tag.as_ref().map(render::tag),
    }))
}

/// GET /blog/{year}/{month}/{day}/{slug}/
pub async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<(i32, u32, u32, String)>,
) -> AppResult<HttpResponse> {
    let (year, month, day, slug) = path.into_inner();
    let not_found = || DomainError::not_found("Post", format!("{year}/{month}/{day}/{slug}"));

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(not_found)?;
    let post = state
        .posts
        .find_published_by_date_slug(date, &slug)
        .await?
        .ok_or_else(not_found)?;

    let comments = state.comments.active_for_post(post.id).await?;
    let similar = state.posts.similar_published(post.id, SIMILAR_POSTS).await?;

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post: render::post(&state, post).await?,
        comments: comments.iter().map(render::comment).collect(),
        comment_form: CommentFormResponse::default(),
        similar_posts: render::posts(&state, similar).await?,
    }))
}

/// GET /blog/search/?query=
///
/// Without a (non-blank) query nothing is searched and the result list is empty.
pub async fn post_search(
    state: web::Data<AppState>,
    form: web::Query<SearchForm>,
) -> AppResult<HttpResponse> {
    let Some(text) = form.cleaned_query() else {
        let errors = if form.is_submitted() {
            form.validate().err()
        } else {
            None
        };
        return Ok(HttpResponse::Ok().json(SearchResponse {
            query: None,
            results: Vec::new(),
            errors,
        }));
    };

    let query = SearchQuery::new(text, state.search_language.as_str());
    let hits = state.posts.search_published(&query).await?;
    tracing::debug!(query = %query.text, hits = hits.len(), "Search completed");

    let mut results = Vec::with_capacity(hits.len());
    for hit in hits {
        results.push(SearchResultItem {
            rank: hit.rank,
            post: render::post(&state, hit.post).await?,
        });
    }

    Ok(HttpResponse::Ok().json(SearchResponse {
        query: Some(query.text),
        results,
        errors: None,
    }))
}
