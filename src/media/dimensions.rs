//! Dimension backfill: page through thumbnails missing width/height, fetch
//! each original, probe its pixel size and write it back. Pages are strictly
//! sequential; assets within a page run under the permit gate.

use anyhow::Result;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::database_ops::db::Db;
use crate::database_ops::thumbnails::{self, ThumbnailRow, SCAN_PAGE_SIZE};
use crate::media::fetch::fetch_image;
use crate::media::limiter::for_each_bounded;
use crate::media::probe::image_dimensions;

pub const CONCURRENCY: usize = 10;
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn run_dimension_backfill(db: &Db, http: &Client) -> Result<u64> {
    let mut offset: i64 = 0;
    let mut total_seen: u64 = 0;
    let mut total_updated: u64 = 0;

    loop {
        let rows = thumbnails::select_missing_dimensions(db, offset, SCAN_PAGE_SIZE).await?;
        if rows.is_empty() {
            if offset == 0 {
                info!("no thumbnails need dimension backfill");
            }
            break;
        }
        info!(offset, count = rows.len(), "processing thumbnail window");
        total_seen += rows.len() as u64;

        let updated = {
            let db = db.clone();
            let http = http.clone();
            for_each_bounded(rows, CONCURRENCY, move |row| {
                let db = db.clone();
                let http = http.clone();
                async move { process_row(&db, &http, row).await }
            })
            .await
        };
        total_updated += updated as u64;
        info!(offset, updated, total_seen, "completed thumbnail window");

        offset += SCAN_PAGE_SIZE;
    }

    info!(total_seen, total_updated, "dimension backfill complete");
    Ok(total_updated)
}

async fn process_row(db: &Db, http: &Client, row: ThumbnailRow) -> bool {
    info!(id = row.id, url = %row.url, "processing thumbnail");

    let Some(bytes) = fetch_image(http, &row.url, FETCH_TIMEOUT).await else {
        warn!(id = row.id, stage = "fetch", "skipping thumbnail");
        return false;
    };
    let Some((width, height)) = image_dimensions(&bytes) else {
        warn!(id = row.id, stage = "probe", "skipping thumbnail");
        return false;
    };

    if let Err(e) = thumbnails::update_dimensions(db, row.id, width as i32, height as i32).await {
        error!(id = row.id, error = %e, "dimension update failed");
        return false;
    }
    info!(id = row.id, width, height, "updated thumbnail dimensions");
    true
}
