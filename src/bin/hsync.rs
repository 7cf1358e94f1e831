use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use heritage_sync::catalog::CatalogClient;
use heritage_sync::database_ops::db::Db;
use heritage_sync::ingest::{run_catalog_ingest, IngestConfig};
use heritage_sync::invalid::InvalidDataLog;
use heritage_sync::media::dimensions::run_dimension_backfill;
use heritage_sync::media::optimize::run_optimize_backfill;
use heritage_sync::media::storage::StorageClient;
use heritage_sync::util::env as env_util;

#[derive(Parser, Debug)]
#[command(name = "hsync", version, about = "Heritage catalog sync CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Scan the catalog source and insert records not yet present
    Ingest,
    /// Backfill original pixel dimensions for thumbnails missing them
    ThumbDimensions,
    /// Generate optimized WebP derivatives for thumbnails missing them
    ThumbOptimize,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let db_url = env_util::db_url()?;
    let db = Db::connect(&db_url, env_util::env_parse("DB_MAX_CONNS", 8u32)).await?;

    match cli.command {
        Commands::Ingest => {
            let catalog = CatalogClient::from_env()?;
            let invalid = InvalidDataLog::from_env()?;
            let cfg = IngestConfig::from_env();
            let summary = run_catalog_ingest(&db, &catalog, &invalid, &cfg).await?;
            info!(
                pages = summary.pages,
                seen = summary.seen,
                inserted = summary.inserted,
                already_present = summary.already_present,
                failed = summary.failed,
                "catalog ingest complete"
            );
        }
        Commands::ThumbDimensions => {
            let http = media_http()?;
            let updated = run_dimension_backfill(&db, &http).await?;
            info!(updated, "thumbnail dimension backfill complete");
        }
        Commands::ThumbOptimize => {
            let http = media_http()?;
            let storage = StorageClient::from_env()?;
            let updated = run_optimize_backfill(&db, &http, &storage).await?;
            info!(updated, "thumbnail optimization complete");
        }
    }

    Ok(())
}

fn media_http() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("heritage-sync/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
