//! Pure mapping from a raw detail record to the canonical insert payload.
//! All data-quality policy lives here: district-code derivation, category
//! nulling, zero-coordinate handling, date formats and media filtering.

use chrono::DateTime;
use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::models::{HeritageDetail, ImageItem, RawDate};

#[derive(Debug, Clone, PartialEq)]
pub struct NewImage {
    pub licence: Option<String>,
    pub image_url: String,
    pub description: Option<String>,
}

/// The normalized insert shape. `images`/`videos` are `None` (not empty)
/// when nothing survives filtering, so the sink can tell "no media" from
/// "unknown".
#[derive(Debug, Clone)]
pub struct NewHeritageRecord {
    pub uid: String,
    pub name: Option<String>,
    pub name_hanja: Option<String>,
    pub city_code: Option<String>,
    pub district_code: Option<String>,
    pub heritage_type_code: Option<String>,
    pub canceled: bool,
    pub last_modified: Option<String>,
    pub management_number: Option<String>,
    pub linkage_number: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub type_name: Option<String>,
    pub quantity: Option<String>,
    pub registered_date: Option<String>,
    pub location_description: Option<String>,
    pub era: Option<String>,
    pub owner: Option<String>,
    pub manager: Option<String>,
    pub thumbnail: Option<String>,
    pub content: Option<String>,
    pub category1_name: Option<String>,
    pub category2_name: Option<String>,
    pub category3_name: Option<String>,
    pub category4_name: Option<String>,
    pub images: Option<Vec<NewImage>>,
    pub videos: Option<Vec<String>>,
}

pub fn normalize(
    detail: &HeritageDetail,
    images: &[ImageItem],
    videos: &[String],
) -> NewHeritageRecord {
    let uid = detail.uid.clone();

    let district_code = district_code(detail.linkage_number.as_deref());
    if district_code.is_none() {
        warn!(
            uid,
            "district code could not be derived from linkage number; setting to NULL"
        );
    }

    let categories = [
        clean_category(detail.category1.as_deref()),
        clean_category(detail.category2.as_deref()),
        clean_category(detail.category3.as_deref()),
        clean_category(detail.category4.as_deref()),
    ];
    if categories.iter().all(Option::is_none) {
        warn!(uid, "all category names missing or empty; setting to NULL");
    }
    let [category1_name, category2_name, category3_name, category4_name] = categories;

    let longitude = coordinate(detail.longitude.as_ref());
    if longitude.is_none() {
        debug!(uid, "longitude is 0 or missing; setting to NULL");
    }
    let latitude = coordinate(detail.latitude.as_ref());
    if latitude.is_none() {
        debug!(uid, "latitude is 0 or missing; setting to NULL");
    }

    NewHeritageRecord {
        uid,
        name: detail.name.clone(),
        name_hanja: detail.name_hanja.clone(),
        city_code: detail.city_code.clone(),
        district_code,
        heritage_type_code: detail.heritage_type_code.clone(),
        canceled: detail.canceled,
        last_modified: format_date(detail.last_modified.as_ref()),
        management_number: detail.management_number.clone(),
        linkage_number: detail.linkage_number.clone(),
        longitude,
        latitude,
        type_name: detail.type_name.clone(),
        quantity: detail.quantity.clone(),
        registered_date: format_date(detail.registered_date.as_ref()),
        location_description: detail.location_description.clone(),
        era: detail.era.clone(),
        owner: detail.owner.clone(),
        manager: detail.manager.clone(),
        thumbnail: detail.thumbnail.clone(),
        content: detail.content.clone(),
        category1_name,
        category2_name,
        category3_name,
        category4_name,
        images: filter_images(images),
        videos: filter_videos(videos),
    }
}

/// First two characters of the linkage number, trimmed. A missing or
/// too-short linkage number yields None.
pub fn district_code(linkage_number: Option<&str>) -> Option<String> {
    let linkage = linkage_number?;
    if linkage.chars().count() < 2 {
        return None;
    }
    let code: String = linkage.chars().take(2).collect();
    let code = code.trim().to_string();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

fn clean_category(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Coordinates arrive as numbers or numeric strings. Exactly zero means
/// "unset" in this domain and maps to None.
pub fn coordinate(raw: Option<&Value>) -> Option<f64> {
    let value = match raw? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if value == 0.0 {
        None
    } else {
        Some(value)
    }
}

/// Pre-formatted date strings pass through unchanged; epoch seconds are
/// rendered as `YYYY-MM-DD`; anything else is None.
pub fn format_date(raw: Option<&RawDate>) -> Option<String> {
    match raw? {
        RawDate::Text(s) => Some(s.clone()),
        RawDate::Epoch(secs) => {
            DateTime::from_timestamp(*secs, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
        }
        RawDate::Other(_) => None,
    }
}

fn filter_images(images: &[ImageItem]) -> Option<Vec<NewImage>> {
    let kept: Vec<NewImage> = images
        .iter()
        .filter_map(|img| {
            let url = img.image_url.as_deref()?;
            if url.trim().is_empty() {
                return None;
            }
            Some(NewImage {
                licence: img.licence.clone(),
                image_url: url.to_string(),
                description: img.description.clone(),
            })
        })
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept)
    }
}

fn filter_videos(videos: &[String]) -> Option<Vec<String>> {
    let kept: Vec<String> = videos
        .iter()
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bare_detail() -> HeritageDetail {
        serde_json::from_value(json!({ "uid": "H-1" })).unwrap()
    }

    #[test]
    fn district_code_needs_two_chars() {
        assert_eq!(district_code(Some("L238")), Some("L2".to_string()));
        assert_eq!(district_code(Some("1")), None);
        assert_eq!(district_code(Some("")), None);
        assert_eq!(district_code(None), None);
    }

    #[test]
    fn zero_coordinates_become_null() {
        assert_eq!(coordinate(Some(&json!(0))), None);
        assert_eq!(coordinate(Some(&json!(0.0))), None);
        assert_eq!(coordinate(Some(&json!("0"))), None);
        assert_eq!(coordinate(Some(&json!(127.001))), Some(127.001));
        assert_eq!(coordinate(Some(&json!("37.57"))), Some(37.57));
        assert_eq!(coordinate(Some(&json!("not a number"))), None);
        assert_eq!(coordinate(None), None);
    }

    #[test]
    fn dates_pass_through_or_reformat() {
        assert_eq!(
            format_date(Some(&RawDate::Text("2014-03-05".into()))),
            Some("2014-03-05".to_string())
        );
        // 2021-06-01T00:00:00Z
        assert_eq!(
            format_date(Some(&RawDate::Epoch(1622505600))),
            Some("2021-06-01".to_string())
        );
        assert_eq!(format_date(Some(&RawDate::Other(json!(true)))), None);
        assert_eq!(format_date(None), None);
    }

    #[test]
    fn all_blank_categories_yield_four_nulls() {
        let mut detail = bare_detail();
        detail.category1 = Some("  ".into());
        detail.category2 = Some(String::new());
        let rec = normalize(&detail, &[], &[]);
        assert_eq!(rec.category1_name, None);
        assert_eq!(rec.category2_name, None);
        assert_eq!(rec.category3_name, None);
        assert_eq!(rec.category4_name, None);
    }

    #[test]
    fn partial_categories_keep_known_ones_trimmed() {
        let mut detail = bare_detail();
        detail.category2 = Some(" Buildings ".into());
        let rec = normalize(&detail, &[], &[]);
        assert_eq!(rec.category1_name, None);
        assert_eq!(rec.category2_name, Some("Buildings".to_string()));
        assert_eq!(rec.category3_name, None);
        assert_eq!(rec.category4_name, None);
    }

    #[test]
    fn blank_url_media_filters_to_null_not_empty() {
        let detail = bare_detail();
        let images = vec![
            ImageItem {
                licence: Some("cc".into()),
                image_url: Some("   ".into()),
                description: None,
            },
            ImageItem {
                licence: None,
                image_url: None,
                description: Some("lost".into()),
            },
        ];
        let videos = vec!["".to_string(), "  ".to_string()];
        let rec = normalize(&detail, &images, &videos);
        assert_eq!(rec.images, None);
        assert_eq!(rec.videos, None);
    }

    #[test]
    fn surviving_media_keeps_fields() {
        let detail = bare_detail();
        let images = vec![
            ImageItem {
                licence: Some("cc-by".into()),
                image_url: Some("https://cdn.example.com/a.jpg".into()),
                description: Some("front".into()),
            },
            ImageItem {
                licence: None,
                image_url: Some(String::new()),
                description: None,
            },
        ];
        let videos = vec![
            "https://cdn.example.com/a.mp4".to_string(),
            " ".to_string(),
        ];
        let rec = normalize(&detail, &images, &videos);
        let images = rec.images.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].image_url, "https://cdn.example.com/a.jpg");
        assert_eq!(images[0].licence.as_deref(), Some("cc-by"));
        assert_eq!(rec.videos.unwrap(), vec!["https://cdn.example.com/a.mp4"]);
    }
}
