//! Recommend a post by email.

use actix_web::{HttpRequest, HttpResponse, web};
use uuid::Uuid;

use blog_core::DomainError;
use blog_core::domain::Post;
use blog_core::forms::{Form, SharePostForm};
use blog_core::ports::OutgoingEmail;
use blog_infra::mail::mask_email;
use blog_shared::dto::ShareResponse;

use super::{render, submitted};
use crate::middleware::error::AppResult;
use crate::state::AppState;

async fn published_post(state: &AppState, post_id: Uuid) -> AppResult<Post> {
    let post = state
        .posts
        .find_published_by_id(post_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", post_id))?;
    Ok(post)
}

/// Scheme and host of the current request joined to `path`.
fn absolute_url(req: &HttpRequest, path: &str) -> String {
    let info = req.connection_info();
    format!("{}://{}{}", info.scheme(), info.host(), path)
}

/// GET /blog/{post_id}/share/
pub async fn share_form(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = published_post(&state, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ShareResponse {
        post: render::post(&state, post).await?,
        sent: false,
        errors: None,
    }))
}

/// POST /blog/{post_id}/share/
pub async fn share_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    form: Option<web::Form<SharePostForm>>,
) -> AppResult<HttpResponse> {
    let post = published_post(&state, path.into_inner()).await?;
    let form = submitted(form);

    if let Err(errors) = form.validate() {
        return Ok(HttpResponse::UnprocessableEntity().json(ShareResponse {
            post: render::post(&state, post).await?,
            sent: false,
            errors: Some(errors),
        }));
    }

    let post_url = absolute_url(&req, &post.absolute_path());
    let message = form.compose(&post, &post_url);
    state
        .mailer
        .send(OutgoingEmail::new(form.recipient(), message.subject, message.body))
        .await?;

    tracing::info!(
        post_id = %post.id,
        to = %mask_email(form.recipient()),
        "Post shared by email"
    );

    Ok(HttpResponse::Ok().json(ShareResponse {
        post: render::post(&state, post).await?,
        sent: true,
        errors: None,
    }))
}
