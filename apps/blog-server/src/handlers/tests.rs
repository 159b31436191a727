use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web};
use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;

use blog_core::domain::{Author, Comment, Post};
use blog_core::ports::{AuthorRepository, CommentRepository, Mailer, PostRepository, TagRepository};
use blog_infra::{InMemoryBlogStore, InMemoryMailer};

use super::configure_routes;
use crate::state::AppState;

struct Fixture {
    store: Arc<InMemoryBlogStore>,
    mailer: Arc<InMemoryMailer>,
    author: Author,
}

impl Fixture {
    async fn new() -> Self {
        Self::with_mailer(InMemoryMailer::new()).await
    }

    async fn with_mailer(mailer: InMemoryMailer) -> Self {
        let store = Arc::new(InMemoryBlogStore::new());
        let authors: &dyn AuthorRepository = store.as_ref();
        let author = authors
            .insert(Author::new("admin".into(), "admin@example.com".into()))
            .await
            .unwrap();
        Self {
            store,
            mailer: Arc::new(mailer),
            author,
        }
    }

    fn state(&self) -> AppState {
        let mailer: Arc<dyn Mailer> = self.mailer.clone();
        AppState::in_memory(self.store.clone(), mailer, "english".to_string())
    }

    /// A published post `days_ago` days before 2024-06-30 12:00 UTC.
    async fn publish(&self, title: &str, body: &str, days_ago: i64) -> Post {
        let publish =
            Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap() - Duration::days(days_ago);
        let posts: &dyn PostRepository = self.store.as_ref();
        posts
            .insert(Post::new(self.author.id, title.into(), body.into()).published_at(publish))
            .await
            .unwrap()
    }

    async fn draft(&self, title: &str, body: &str) -> Post {
        let posts: &dyn PostRepository = self.store.as_ref();
        posts
            .insert(Post::new(self.author.id, title.into(), body.into()))
            .await
            .unwrap()
    }

    async fn tag(&self, post: &Post, names: &[&str]) {
        for name in names {
            let tag = self.store.get_or_create(name).await.unwrap();
            self.store.tag_post(post.id, tag.id).await.unwrap();
        }
    }
}

macro_rules! app {
    ($fixture:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($fixture.state()))
                .configure(configure_routes),
        )
        .await
    };
}

fn titles(body: &Value, key: &str) -> Vec<String> {
    body[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect()
}

#[actix_web::test]
async fn health_reports_in_memory_storage() {
    let fixture = Fixture::new().await;
    let app = app!(fixture);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[actix_web::test]
async fn list_shows_three_published_posts_per_page() {
    let fixture = Fixture::new().await;
    for (i, title) in ["One", "Two", "Three", "Four"].iter().enumerate() {
        fixture.publish(title, "", 4 - i as i64).await;
    }
    fixture.draft("Hidden", "").await;
    let app = app!(fixture);

    let req = test::TestRequest::get().uri("/blog/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&body, "posts"), vec!["Four", "Three", "Two"]);
    assert_eq!(body["page"]["number"], 1);
    assert_eq!(body["page"]["num_pages"], 2);
    assert_eq!(body["page"]["count"], 4);
    assert_eq!(body["page"]["next_page_number"], 2);

    let req = test::TestRequest::get().uri("/blog/?page=2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&body, "posts"), vec!["One"]);
    assert_eq!(body["page"]["has_next"], false);
}

#[actix_web::test]
async fn list_normalizes_bad_page_numbers() {
    let fixture = Fixture::new().await;
    for i in 0..5 {
        fixture.publish(&format!("Post {i}"), "", i).await;
    }
    let app = app!(fixture);

    let req = test::TestRequest::get().uri("/blog/?page=abc").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page"]["number"], 1);

    let req = test::TestRequest::get().uri("/blog/?page=999").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page"]["number"], 2);
    assert_eq!(body["posts"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn empty_blog_has_one_empty_page() {
    let fixture = Fixture::new().await;
    let app = app!(fixture);

    let req = test::TestRequest::get().uri("/blog/?page=3").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["page"]["number"], 1);
    assert_eq!(body["page"]["num_pages"], 1);
    assert!(body["posts"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn tag_list_filters_and_unknown_tag_is_404() {
    let fixture = Fixture::new().await;
    let tagged = fixture.publish("Tagged", "", 2).await;
    fixture.publish("Untagged", "", 1).await;
    fixture.tag(&tagged, &["music"]).await;
    let app = app!(fixture);

    let req = test::TestRequest::get().uri("/blog/tag/music/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(titles(&body, "posts"), vec!["Tagged"]);
    assert_eq!(body["tag"]["slug"], "music");
    assert_eq!(body["posts"][0]["tags"][0]["name"], "music");

    let req = test::TestRequest::get().uri("/blog/tag/nope/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["title"], "Not Found");
}

#[actix_web::test]
async fn detail_shows_active_comments_and_similar_posts() {
    let fixture = Fixture::new().await;
    let post = fixture.publish("Who was Django Reinhardt", "Jazz", 0).await;
    let close = fixture.publish("Gypsy jazz", "", 3).await;
    let far = fixture.publish("Guitars", "", 1).await;
    fixture.tag(&post, &["jazz", "music", "guitar"]).await;
    fixture.tag(&close, &["jazz", "music", "guitar"]).await;
    fixture.tag(&far, &["guitar"]).await;

    let comments: &dyn CommentRepository = fixture.store.as_ref();
    comments
        .insert(Comment::new(post.id, "Ana".into(), "ana@example.com".into(), "Great".into()))
        .await
        .unwrap();
    let mut hidden = Comment::new(post.id, "Spam".into(), "spam@example.com".into(), "Buy".into());
    hidden.active = false;
    comments.insert(hidden).await.unwrap();
    let app = app!(fixture);

    let req = test::TestRequest::get().uri(&post.absolute_path()).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["post"]["title"], "Who was Django Reinhardt");
    assert_eq!(body["post"]["url"], "/blog/2024/6/30/who-was-django-reinhardt/");
    let names: Vec<&str> = body["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ana"]);
    assert!(body["comments"][0].get("email").is_none());
    assert_eq!(body["comment_form"]["name"], "");
    assert_eq!(titles(&body, "similar_posts"), vec!["Gypsy jazz", "Guitars"]);
}

#[actix_web::test]
async fn detail_hides_drafts_and_bad_dates() {
    let fixture = Fixture::new().await;
    let draft = fixture.draft("Unfinished", "").await;
    let app = app!(fixture);

    let req = test::TestRequest::get().uri(&draft.absolute_path()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/blog/2024/13/40/unfinished/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn search_ranks_matches_above_threshold() {
    let fixture = Fixture::new().await;
    fixture.publish("Django tips", "Views", 3).await;
    fixture.publish("Frameworks", "django then django", 2).await;
    fixture.publish("Passing mention", "a word on django", 1).await;
    fixture.draft("Django draft", "django").await;
    let app = app!(fixture);

    let req = test::TestRequest::get()
        .uri("/blog/search/?query=django")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["query"], "django");
    let results = body["results"].as_array().unwrap();
    let found: Vec<&str> = results
        .iter()
        .map(|r| r["post"]["title"].as_str().unwrap())
        .collect();
    assert_eq!(found, vec!["Django tips", "Frameworks"]);

    let ranks: Vec<f64> = results.iter().map(|r| r["rank"].as_f64().unwrap()).collect();
    assert!(ranks.iter().all(|r| *r >= 0.3));
    assert!(ranks[0] >= ranks[1]);
}

#[actix_web::test]
async fn blank_search_returns_nothing() {
    let fixture = Fixture::new().await;
    fixture.publish("Django tips", "", 0).await;
    let app = app!(fixture);

    let req = test::TestRequest::get().uri("/blog/search/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body.get("query").is_none());
    assert!(body.get("errors").is_none());
    assert!(body["results"].as_array().unwrap().is_empty());

    let req = test::TestRequest::get()
        .uri("/blog/search/?query=%20%20")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["results"].as_array().unwrap().is_empty());
    assert!(body["errors"]["query"].is_array());
}

#[actix_web::test]
async fn share_form_reports_unsent() {
    let fixture = Fixture::new().await;
    let post = fixture.publish("Notes", "", 0).await;
    let app = app!(fixture);

    let req = test::TestRequest::get()
        .uri(&format!("/blog/{}/share/", post.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["sent"], false);
    assert_eq!(body["post"]["title"], "Notes");
}

#[actix_web::test]
async fn share_sends_one_email_with_absolute_link() {
    let fixture = Fixture::new().await;
    let post = fixture.publish("Notes", "", 0).await;
    let app = app!(fixture);

    let req = test::TestRequest::post()
        .uri(&format!("/blog/{}/share/", post.id))
        .insert_header(("host", "blog.example.com"))
        .set_form([
            ("name", "Ana"),
            ("email", "ana@example.com"),
            ("to", "bob@example.com"),
            ("comments", "Worth it"),
        ])
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["sent"], true);

    let sent = fixture.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["bob@example.com".to_string()]);
    assert_eq!(
        sent[0].subject,
        "Ana (ana@example.com) recommends you read Notes"
    );
    assert_eq!(
        sent[0].body,
        "Read Notes at http://blog.example.com/blog/2024/6/30/notes/\n\nAna's comments: Worth it"
    );
}

#[actix_web::test]
async fn invalid_share_reports_errors_and_sends_nothing() {
    let fixture = Fixture::new().await;
    let post = fixture.publish("Notes", "", 0).await;
    let app = app!(fixture);

    let req = test::TestRequest::post()
        .uri(&format!("/blog/{}/share/", post.id))
        .set_form([("name", "Ana"), ("email", "ana@example.com"), ("to", "bob")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["sent"], false);
    assert!(body["errors"]["to"].is_array());
    assert!(body["errors"].get("name").is_none());
    assert!(fixture.mailer.sent().await.is_empty());
}

#[actix_web::test]
async fn share_without_body_reports_every_field() {
    let fixture = Fixture::new().await;
    let post = fixture.publish("Notes", "", 0).await;
    let app = app!(fixture);

    let req = test::TestRequest::post()
        .uri(&format!("/blog/{}/share/", post.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["sent"], false);
    for field in ["name", "email", "to"] {
        assert!(body["errors"][field].is_array(), "missing errors for {field}");
    }
    assert!(fixture.mailer.sent().await.is_empty());
}

#[actix_web::test]
async fn share_of_draft_is_404() {
    let fixture = Fixture::new().await;
    let draft = fixture.draft("Unfinished", "").await;
    let app = app!(fixture);

    let req = test::TestRequest::get()
        .uri(&format!("/blog/{}/share/", draft.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn mail_failure_is_an_internal_error() {
    let fixture = Fixture::with_mailer(InMemoryMailer::failing("relay down")).await;
    let post = fixture.publish("Notes", "", 0).await;
    let app = app!(fixture);

    let req = test::TestRequest::post()
        .uri(&format!("/blog/{}/share/", post.id))
        .set_form([
            ("name", "Ana"),
            ("email", "ana@example.com"),
            ("to", "bob@example.com"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Internal Server Error");
}

#[actix_web::test]
async fn comment_is_stored_active_on_its_post() {
    let fixture = Fixture::new().await;
    let post = fixture.publish("Notes", "", 0).await;
    let app = app!(fixture);

    let req = test::TestRequest::post()
        .uri(&format!("/blog/{}/comment/", post.id))
        .set_form([
            ("name", "Ana"),
            ("email", "ana@example.com"),
            ("body", "Nice read"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["comment"]["body"], "Nice read");
    assert_eq!(body["post"]["id"], post.id.to_string());

    let comments: &dyn CommentRepository = fixture.store.as_ref();
    let stored = comments.active_for_post(post.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].active);
    assert_eq!(stored[0].post_id, post.id);
    assert_eq!(stored[0].email, "ana@example.com");
}

#[actix_web::test]
async fn invalid_comment_is_rejected_and_not_stored() {
    let fixture = Fixture::new().await;
    let post = fixture.publish("Notes", "", 0).await;
    let app = app!(fixture);

    let long_name = "x".repeat(81);
    let req = test::TestRequest::post()
        .uri(&format!("/blog/{}/comment/", post.id))
        .set_form([
            ("name", long_name.as_str()),
            ("email", "not-an-email"),
            ("body", ""),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    for field in ["name", "email", "body"] {
        assert!(body["errors"][field].is_array(), "missing errors for {field}");
    }

    let comments: &dyn CommentRepository = fixture.store.as_ref();
    assert!(comments.active_for_post(post.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn comment_with_unreadable_body_reports_every_field() {
    let fixture = Fixture::new().await;
    let post = fixture.publish("Notes", "", 0).await;
    let app = app!(fixture);

    let req = test::TestRequest::post()
        .uri(&format!("/blog/{}/comment/", post.id))
        .insert_header(("content-type", "text/plain"))
        .set_payload("name=Ana")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    for field in ["name", "email", "body"] {
        assert!(body["errors"][field].is_array(), "missing errors for {field}");
    }

    let comments: &dyn CommentRepository = fixture.store.as_ref();
    assert!(comments.active_for_post(post.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn comment_endpoint_accepts_post_only() {
    let fixture = Fixture::new().await;
    let post = fixture.publish("Notes", "", 0).await;
    let app = app!(fixture);

    let req = test::TestRequest::get()
        .uri(&format!("/blog/{}/comment/", post.id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}
