//! Seed CLI: one author, a few tags and a mix of published and draft posts.
//!
//! Re-running is a no-op once the seed author exists.

use anyhow::Context;
use chrono::{Duration, Utc};

use blog_core::domain::{Author, Post};
use blog_core::ports::{AuthorRepository, PostRepository, TagRepository};
use blog_infra::{
    DatabaseConfig, DatabaseConnections, PostgresAuthorRepository, PostgresPostRepository,
    PostgresTagRepository,
};

const SEED_AUTHOR: &str = "admin";

struct SeedPost {
    title: &'static str,
    body: &'static str,
    tags: &'static [&'static str],
    days_ago: Option<i64>,
}

const POSTS: &[SeedPost] = &[
    SeedPost {
        title: "Who was Django Reinhardt?",
        body: "The Belgian-born guitarist who built gypsy jazz around two fingers.",
        tags: &["music", "jazz"],
        days_ago: Some(30),
    },
    SeedPost {
        title: "Another post",
        body: "Django Reinhardt recorded with Stéphane Grappelli in Paris.",
        tags: &["music", "jazz", "guitar"],
        days_ago: Some(20),
    },
    SeedPost {
        title: "Notes on the Django framework",
        body: "Views, models and templates. A web framework named after a guitarist.",
        tags: &["django", "python"],
        days_ago: Some(10),
    },
    SeedPost {
        title: "Guitar setups",
        body: "String height, intonation and a bit of patience.",
        tags: &["guitar"],
        days_ago: Some(2),
    },
    SeedPost {
        title: "Unfinished thoughts on swing",
        body: "Draft: La pompe and the rhythm section.",
        tags: &["jazz"],
        days_ago: None,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter("info").init();

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set to seed")?;
    let connections = DatabaseConnections::init(&DatabaseConfig::new(url))
        .await
        .context("connecting to the database")?;

    let authors = PostgresAuthorRepository::shared(connections.main.clone());
    let posts = PostgresPostRepository::shared(connections.main.clone());
    let tags = PostgresTagRepository::shared(connections.main.clone());
    let (authors, posts, tags): (&dyn AuthorRepository, &dyn PostRepository, &dyn TagRepository) =
        (&authors, &posts, &tags);

    if authors
        .find_by_username(SEED_AUTHOR)
        .await
        .context("looking up the seed author")?
        .is_some()
    {
        tracing::info!("Seed author already present, nothing to do");
        return Ok(());
    }

    let author = authors
        .insert(Author::new(SEED_AUTHOR.into(), "admin@example.com".into()))
        .await
        .context("creating the seed author")?;

    let now = Utc::now();
    for seed in POSTS {
        let mut post = Post::new(author.id, seed.title.into(), seed.body.into());
        if let Some(days) = seed.days_ago {
            post = post.published_at(now - Duration::days(days));
        }

        let post = posts
            .insert(post)
            .await
            .with_context(|| format!("creating post {:?}", seed.title))?;

        for name in seed.tags {
            let tag = tags
                .get_or_create(name)
                .await
                .with_context(|| format!("creating tag {name:?}"))?;
            tags.tag_post(post.id, tag.id)
                .await
                .with_context(|| format!("tagging {:?} with {name:?}", seed.title))?;
        }

        tracing::info!(title = seed.title, status = post.status.label(), "Seeded post");
    }

    Ok(())
}
