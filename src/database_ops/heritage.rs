//! Writes for the catalog ingestion: dedup existence check and the
//! transactional insert of one record plus its child rows.

use anyhow::Result;
use tracing::error;

use crate::database_ops::db::Db;
use crate::normalization::NewHeritageRecord;

/// Existence check by external uid. A check failure is logged and treated as
/// "not present": double-processing is preferred over silently skipping, and
/// the unique constraint on `heritage_items.uid` stops any duplicate insert.
pub async fn heritage_exists(db: &Db, uid: &str) -> bool {
    let query = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM heritage_items WHERE uid = $1)",
    )
    .bind(uid)
    .fetch_one(&db.pool)
    .await;
    match query {
        Ok(exists) => exists,
        Err(e) => {
            error!(uid, error = %e, "existence check failed; assuming not present");
            false
        }
    }
}

/// Atomic insert of one normalized record with its thumbnail, image and video
/// children. Either everything commits or nothing does; callers treat a
/// failure as a recoverable per-item event.
pub async fn insert_with_relations(db: &Db, rec: &NewHeritageRecord) -> Result<()> {
    let mut tx = db.pool.begin().await?;

    let item_id: i64 = sqlx::query_scalar(
        "INSERT INTO heritage_items (
            uid, name, name_hanja, city_code, district_code, heritage_type_code,
            canceled, last_modified, management_number, linkage_number,
            longitude, latitude, type, quantity, registered_date,
            location_description, era, owner, manager, thumbnail, content,
            category1_name, category2_name, category3_name, category4_name
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
            $16, $17, $18, $19, $20, $21, $22, $23, $24, $25
        ) RETURNING id",
    )
    .bind(&rec.uid)
    .bind(&rec.name)
    .bind(&rec.name_hanja)
    .bind(&rec.city_code)
    .bind(&rec.district_code)
    .bind(&rec.heritage_type_code)
    .bind(rec.canceled)
    .bind(&rec.last_modified)
    .bind(&rec.management_number)
    .bind(&rec.linkage_number)
    .bind(rec.longitude)
    .bind(rec.latitude)
    .bind(&rec.type_name)
    .bind(&rec.quantity)
    .bind(&rec.registered_date)
    .bind(&rec.location_description)
    .bind(&rec.era)
    .bind(&rec.owner)
    .bind(&rec.manager)
    .bind(&rec.thumbnail)
    .bind(&rec.content)
    .bind(&rec.category1_name)
    .bind(&rec.category2_name)
    .bind(&rec.category3_name)
    .bind(&rec.category4_name)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(thumb) = rec.thumbnail.as_deref().filter(|t| !t.trim().is_empty()) {
        sqlx::query("INSERT INTO thumbnail (heritage_item_id, url) VALUES ($1, $2)")
            .bind(item_id)
            .bind(thumb)
            .execute(&mut *tx)
            .await?;
    }

    if let Some(images) = &rec.images {
        let licences: Vec<Option<&str>> = images.iter().map(|i| i.licence.as_deref()).collect();
        let urls: Vec<&str> = images.iter().map(|i| i.image_url.as_str()).collect();
        let descriptions: Vec<Option<&str>> =
            images.iter().map(|i| i.description.as_deref()).collect();
        sqlx::query(
            "INSERT INTO heritage_images (heritage_item_id, licence, image_url, description)
             SELECT $1, t.licence, t.image_url, t.description
             FROM UNNEST($2::text[], $3::text[], $4::text[]) AS t(licence, image_url, description)",
        )
        .bind(item_id)
        .bind(&licences)
        .bind(&urls)
        .bind(&descriptions)
        .execute(&mut *tx)
        .await?;
    }

    if let Some(videos) = &rec.videos {
        sqlx::query(
            "INSERT INTO heritage_videos (heritage_item_id, video_url)
             SELECT $1, t.video_url FROM UNNEST($2::text[]) AS t(video_url)",
        )
        .bind(item_id)
        .bind(videos)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
