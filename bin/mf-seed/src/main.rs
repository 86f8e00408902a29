//! # mf-seed
//!
//! Creates the forums listed in a TOML file. Forums whose slug (or, when no
//! slug is given, whose name) already exists are skipped, so the tool can be
//! re-run safely.
//!
//! Usage: `mf-seed [FILE]`, default `config/forums.toml`:
//!
//! ```toml
//! [[forums]]
//! name = "General"
//! slug = "general"
//! description = "Anything goes"
//! ```

use anyhow::Context;
use config::{Config, File, FileFormat};
use mf_config::Settings;
use mf_core::error::AppError;
use mf_core::models::NewForum;
use mf_core::traits::ForumRepo;
use mf_db_sqlite::SqliteForumRepo;
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_SEED_FILE: &str = "config/forums.toml";

#[derive(Debug, Default, Deserialize)]
struct SeedFile {
    #[serde(default)]
    forums: Vec<NewForum>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct SeedReport {
    created: usize,
    skipped: usize,
}

fn parse_seed_file(builder: config::ConfigBuilder<config::builder::DefaultState>) -> anyhow::Result<SeedFile> {
    Ok(builder.build()?.try_deserialize()?)
}

fn load_seed_file(path: &str) -> anyhow::Result<SeedFile> {
    parse_seed_file(Config::builder().add_source(File::new(path, FileFormat::Toml)))
        .with_context(|| format!("reading seed file {path}"))
}

/// Blank optional fields are treated as absent.
fn normalize(forum: NewForum) -> NewForum {
    let non_blank = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    NewForum {
        name: forum.name.trim().to_string(),
        slug: non_blank(forum.slug),
        description: non_blank(forum.description),
    }
}

async fn seed(repo: &dyn ForumRepo, forums: Vec<NewForum>) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();
    let mut existing_names: Vec<String> = repo
        .list_forums()
        .await?
        .into_iter()
        .map(|forum| forum.name)
        .collect();

    for forum in forums.into_iter().map(normalize) {
        if forum.name.is_empty() {
            anyhow::bail!("every seeded forum needs a name");
        }

        let exists = match &forum.slug {
            Some(slug) => repo.get_forum_by_slug(slug).await?.is_some(),
            None => existing_names.contains(&forum.name),
        };
        if exists {
            info!(name = %forum.name, slug = ?forum.slug, "forum already exists, skipping");
            report.skipped += 1;
            continue;
        }

        match repo.create_forum(forum).await {
            Ok(created) => {
                info!(id = created.id, name = %created.name, "forum created");
                existing_names.push(created.name);
                report.created += 1;
            }
            Err(err) => match err.downcast_ref::<AppError>() {
                Some(AppError::Conflict(msg)) => {
                    warn!(reason = %msg, "forum already exists, skipping");
                    report.skipped += 1;
                }
                _ => return Err(err),
            },
        }
    }

    Ok(report)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter)),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SEED_FILE.to_string());
    let seed_file = load_seed_file(&path)?;

    let repo = SqliteForumRepo::connect(&settings.database.url, settings.database.max_connections)
        .await
        .with_context(|| format!("opening database {}", settings.database.url))?;

    let report = seed(&repo, seed_file.forums).await?;
    info!(created = report.created, skipped = report.skipped, "seeding finished");
    Ok(())
}
