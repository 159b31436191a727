//! HTTP handlers and route configuration.

mod comments;
mod health;
mod posts;
mod render;
mod share;

#[cfg(test)]
mod tests;

use actix_web::{HttpResponse, web};
use blog_shared::ErrorResponse;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api").route("/health", web::get().to(health::health_check)))
        .service(
            web::scope("/blog")
                .route("/", web::get().to(posts::post_list))
                .route("/search/", web::get().to(posts::post_search))
                .route("/tag/{tag_slug}/", web::get().to(posts::post_list_by_tag))
                .route(
                    "/{year}/{month}/{day}/{slug}/",
                    web::get().to(posts::post_detail),
                )
                .service(
                    web::resource("/{post_id}/share/")
                        .route(web::get().to(share::share_form))
                        .route(web::post().to(share::share_post)),
                )
                .service(
                    web::resource("/{post_id}/comment/")
                        .route(web::post().to(comments::post_comment))
                        .default_service(web::to(method_not_allowed)),
                ),
        );
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(ErrorResponse::method_not_allowed())
}

/// An unreadable body is treated as an empty submission.
fn submitted<T: Default>(form: Option<web::Form<T>>) -> T {
    match form {
        Some(form) => form.into_inner(),
        None => {
            tracing::debug!("Form body missing or unreadable, validating an empty form");
            T::default()
        }
    }
}
