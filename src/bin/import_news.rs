//! CLI tool to load news items into the database.
//!
//! Usage: `cargo run --bin import-news -- news.json` (or `-` for stdin)
//!
//! The file holds a JSON array of `{"title": ..., "text": ..., "date": "YYYY-MM-DD"}`
//! objects; `date` may be omitted and defaults to today. The database is
//! the one configured in `config.yml` / `NOTENEWS_*`.

use anyhow::{bail, Context, Result};
use std::io::Read;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notenews::{
    config::Config,
    db::{self, repositories::{SqlxCommentRepository, SqlxNewsRepository}},
    models::CreateNewsInput,
    policy::ModerationFilter,
    services::{NewsService, NewsServiceError},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notenews=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(source) = std::env::args().nth(1) else {
        bail!("usage: import-news <file.json | ->");
    };
    let raw = read_source(&source)?;
    let items: Vec<CreateNewsInput> =
        serde_json::from_str(&raw).with_context(|| format!("Invalid news JSON in {}", source))?;

    let config = Config::load_with_env(&Config::path_from_env())?;
    let pool = db::create_pool(&config.database).await?;
    db::migrations::run_migrations(&pool).await?;

    let service = NewsService::new(
        SqlxNewsRepository::boxed(pool.clone()),
        SqlxCommentRepository::boxed(pool.clone()),
        ModerationFilter::from_config(&config.moderation),
        config.news.home_page_count,
    );

    let mut imported = 0usize;
    for (index, item) in items.iter().enumerate() {
        match service.create_news(item).await {
            Ok(_) => imported += 1,
            Err(NewsServiceError::Validation(errors)) => {
                for error in errors {
                    tracing::warn!(index, title = %item.title, %error, "Skipping news item");
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("Imported {} of {} news items", imported, items.len());
    Ok(())
}

fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))
    }
}
