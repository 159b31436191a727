//! Domain -> wire conversions.

use blog_core::domain::{Comment, Post, Tag};
use blog_core::pagination::PageWindow;
use blog_shared::dto::{CommentResponse, PageResponse, PostResponse, TagResponse};

use crate::middleware::error::AppResult;
use crate::state::AppState;

pub fn tag(tag: &Tag) -> TagResponse {
    TagResponse {
        name: tag.name.clone(),
        slug: tag.slug.clone(),
    }
}

pub fn comment(comment: &Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        name: comment.name.clone(),
        body: comment.body.clone(),
        created: comment.created_at,
    }
}

pub fn page(window: &PageWindow) -> PageResponse {
    PageResponse {
        number: window.number,
        num_pages: window.num_pages,
        count: window.count,
        has_next: window.has_next(),
        has_previous: window.has_previous(),
        next_page_number: window.next_page_number(),
        previous_page_number: window.previous_page_number(),
    }
}

/// A post together with its tags.
pub async fn post(state: &AppState, post: Post) -> AppResult<PostResponse> {
    let tags = state.tags.tags_for_post(post.id).await?;
    Ok(PostResponse {
        id: post.id,
        author_id: post.author_id,
        url: post.absolute_path(),
        title: post.title,
        slug: post.slug,
        body: post.body,
        publish: post.publish,
        tags: tags.iter().map(tag).collect(),
    })
}

pub async fn posts(state: &AppState, posts: Vec<Post>) -> AppResult<Vec<PostResponse>> {
    let mut rendered = Vec::with_capacity(posts.len());
    for p in posts {
        rendered.push(post(state, p).await?);
    }
    Ok(rendered)
}
