//! Reader comments.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blog_core::DomainError;
use blog_core::forms::{CommentForm, Form};
use blog_shared::dto::CommentCreatedResponse;

use super::{render, submitted};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /blog/{post_id}/comment/
pub async fn post_comment(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    form: Option<web::Form<CommentForm>>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let post = state
        .posts
        .find_published_by_id(post_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", post_id))?;

    let form = submitted(form);
    form.validate().map_err(DomainError::Validation)?;

    let comment = state.comments.insert(form.into_comment(post.id)).await?;
    tracing::info!(post_id = %post.id, comment_id = %comment.id, "Comment added");

    Ok(HttpResponse::Created().json(CommentCreatedResponse {
        comment: render::comment(&comment),
        post: render::post(&state, post).await?,
    }))
}
