use anyhow::{Context, Result};
use blockcms::config::{self, Config};
use blockcms::db;
use blockcms::model;
use blockcms::preview::{MemoryStore, PreviewManager, PreviewState, SqliteSessionStore};
use blockcms::preview::route::PreviewParams;
use clap::{Parser, Subcommand};
use reqwest::Url;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print an example configuration
    ExampleConfig,
    /// Print the draft preview link for a slug
    PreviewUrl { slug: String },
    /// Check whether a preview link carries an accepted secret
    CheckLink { url: String },
    /// Suggest a slug for a title
    Slugify { title: String },
    /// Show the stored preview state of a session
    PreviewStatus {
        #[arg(long)]
        session: String,
    },
    /// Leave preview mode for a session
    ExitPreview {
        #[arg(long)]
        session: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    match args.command {
        Command::ExampleConfig => {
            print!("{}", config::example());
            Ok(())
        }
        Command::Slugify { title } => {
            println!("{}", model::slugify(&title));
            Ok(())
        }
        Command::PreviewUrl { slug } => {
            let cfg = config::load(Some(&args.config))?;
            let preview = PreviewManager::from_config(MemoryStore::new(), &cfg)?;
            let url = preview
                .preview_url_for_slug(&slug)
                .context("cannot build a preview link for an empty slug")?;
            println!("{}", url);
            Ok(())
        }
        Command::CheckLink { url } => {
            let cfg = config::load(Some(&args.config))?;
            let preview = PreviewManager::from_config(MemoryStore::new(), &cfg)?;
            let url = Url::parse(&url).context("invalid preview link")?;
            let params = PreviewParams::from_url(&url);
            let ok = preview.validate_preview_request(params.secret.as_deref(), params.slug.as_deref());
            println!("{}", if ok { "valid" } else { "invalid" });
            Ok(())
        }
        Command::PreviewStatus { session } => {
            let cfg = config::load(Some(&args.config))?;
            let preview = session_preview(&cfg, &session).await?;
            match preview.state().await {
                PreviewState::Inactive => println!("inactive"),
                PreviewState::PreviewActive { article_id: Some(id) } => println!("preview {}", id),
                PreviewState::PreviewActive { article_id: None } => println!("preview"),
            }
            Ok(())
        }
        Command::ExitPreview { session } => {
            let cfg = config::load(Some(&args.config))?;
            let preview = session_preview(&cfg, &session).await?;
            preview
                .exit_preview_mode()
                .await
                .context("failed to exit preview mode")?;
            info!(session = %preview.store().session_id(), "preview mode cleared");
            Ok(())
        }
    }
}

async fn session_preview(cfg: &Config, session: &str) -> Result<PreviewManager<SqliteSessionStore>> {
    cfg.ensure_dirs()?;
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| cfg.session_database_url());
    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;
    let store = SqliteSessionStore::new(pool, session);
    Ok(PreviewManager::from_config(store, cfg)?)
}
