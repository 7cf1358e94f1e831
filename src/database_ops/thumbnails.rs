//! Backfill scans and writes for the `thumbnail` table. Both scans page in
//! fixed offset windows and both updates are idempotent by id, so either
//! pipeline can be interrupted and re-run safely.

use anyhow::Result;

use crate::database_ops::db::Db;

/// Window size for both backfill scans.
pub const SCAN_PAGE_SIZE: i64 = 50;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ThumbnailRow {
    pub id: i64,
    pub url: String,
}

/// Rows still missing original dimensions.
pub async fn select_missing_dimensions(
    db: &Db,
    offset: i64,
    limit: i64,
) -> Result<Vec<ThumbnailRow>> {
    let rows = sqlx::query_as::<_, ThumbnailRow>(
        "SELECT id, url FROM thumbnail
         WHERE width IS NULL AND height IS NULL
         ORDER BY id
         LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&db.pool)
    .await?;
    Ok(rows)
}

/// Rows still missing an optimized derivative.
pub async fn select_missing_optimized(
    db: &Db,
    offset: i64,
    limit: i64,
) -> Result<Vec<ThumbnailRow>> {
    let rows = sqlx::query_as::<_, ThumbnailRow>(
        "SELECT id, url FROM thumbnail
         WHERE optimized_url IS NULL
         ORDER BY id
         LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&db.pool)
    .await?;
    Ok(rows)
}

pub async fn update_dimensions(db: &Db, id: i64, width: i32, height: i32) -> Result<()> {
    sqlx::query("UPDATE thumbnail SET width = $2, height = $3 WHERE id = $1")
        .bind(id)
        .bind(width)
        .bind(height)
        .execute(&db.pool)
        .await?;
    Ok(())
}

pub async fn update_optimized(
    db: &Db,
    id: i64,
    optimized_url: &str,
    width: i32,
    height: i32,
) -> Result<()> {
    sqlx::query(
        "UPDATE thumbnail
         SET optimized_url = $2, optimized_width = $3, optimized_height = $4
         WHERE id = $1",
    )
    .bind(id)
    .bind(optimized_url)
    .bind(width)
    .bind(height)
    .execute(&db.pool)
    .await?;
    Ok(())
}
