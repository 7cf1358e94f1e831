//! Optimization backfill: for every thumbnail without an optimized
//! derivative, fetch the original, resize/re-encode it, upload the result
//! under a key derived from the row id and record the optimized triplet.
//! Any stage failing leaves the row untouched for the next scheduled run.

use anyhow::Result;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::database_ops::db::Db;
use crate::database_ops::thumbnails::{self, ThumbnailRow, SCAN_PAGE_SIZE};
use crate::media::fetch::fetch_image;
use crate::media::limiter::for_each_bounded;
use crate::media::probe::image_dimensions;
use crate::media::storage::StorageClient;
use crate::media::transform::{optimize_image, MAX_WIDTH};

pub const CONCURRENCY: usize = 30;
// Larger than the dimension scan's budget: this flow also re-downloads for
// re-encoding.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

pub async fn run_optimize_backfill(db: &Db, http: &Client, storage: &StorageClient) -> Result<u64> {
    let mut offset: i64 = 0;
    let mut total_seen: u64 = 0;
    let mut total_updated: u64 = 0;

    loop {
        let rows = thumbnails::select_missing_optimized(db, offset, SCAN_PAGE_SIZE).await?;
        if rows.is_empty() {
            if offset == 0 {
                info!("no thumbnails need optimization");
            }
            break;
        }
        info!(offset, count = rows.len(), "processing thumbnail window");
        total_seen += rows.len() as u64;

        let updated = {
            let db = db.clone();
            let http = http.clone();
            let storage = storage.clone();
            for_each_bounded(rows, CONCURRENCY, move |row| {
                let db = db.clone();
                let http = http.clone();
                let storage = storage.clone();
                async move { process_row(&db, &http, &storage, row).await }
            })
            .await
        };
        total_updated += updated as u64;
        info!(offset, updated, total_seen, "completed thumbnail window");

        offset += SCAN_PAGE_SIZE;
    }

    info!(total_seen, total_updated, "optimization backfill complete");
    Ok(total_updated)
}

async fn process_row(db: &Db, http: &Client, storage: &StorageClient, row: ThumbnailRow) -> bool {
    info!(id = row.id, url = %row.url, "processing thumbnail");

    let Some(bytes) = fetch_image(http, &row.url, FETCH_TIMEOUT).await else {
        warn!(id = row.id, stage = "fetch", "skipping thumbnail");
        return false;
    };
    let Some((orig_width, orig_height)) = image_dimensions(&bytes) else {
        warn!(id = row.id, stage = "probe", "skipping thumbnail");
        return false;
    };
    debug!(id = row.id, orig_width, orig_height, "fetched original image");

    let Some(optimized) = optimize_image(&bytes, MAX_WIDTH) else {
        warn!(id = row.id, stage = "transform", "skipping thumbnail");
        return false;
    };

    let key = format!("{}.webp", row.id);
    let optimized_url = match storage.upload_object(&key, &optimized, "image/webp").await {
        Ok(url) => url,
        Err(e) => {
            warn!(id = row.id, stage = "upload", error = %e, "skipping thumbnail");
            return false;
        }
    };

    // Trust the encoder's output, not the resize arithmetic.
    let Some((width, height)) = image_dimensions(&optimized) else {
        warn!(id = row.id, stage = "probe_optimized", "skipping thumbnail");
        return false;
    };

    if let Err(e) =
        thumbnails::update_optimized(db, row.id, &optimized_url, width as i32, height as i32).await
    {
        error!(id = row.id, error = %e, "optimized update failed");
        return false;
    }
    info!(id = row.id, optimized_url = %optimized_url, width, height, "updated thumbnail with optimized image");
    true
}
