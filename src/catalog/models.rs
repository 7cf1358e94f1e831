//! Raw catalog API shapes. These mirror the provider's payloads as-is; all
//! cleanup happens in `normalization`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One window of search results. `hits` is the provider's total result count
/// and arrives as text; the ingest loop parses it (a bad value there is a
/// fatal configuration error, not a per-item one).
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    pub hits: String,
    #[serde(default)]
    pub items: Vec<RecordStub>,
}

/// Search result stub. Detail/image/video lookups are addressed by the
/// (type code, management number, city code) triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordStub {
    pub uid: String,
    #[serde(default)]
    pub name: Option<String>,
    pub heritage_type_code: String,
    pub management_number: String,
    pub city_code: String,
}

/// A date as the provider sends it: sometimes pre-formatted text, sometimes
/// epoch seconds, occasionally junk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    Text(String),
    Epoch(i64),
    Other(Value),
}

/// Full detail record. Numeric-looking fields are kept loosely typed
/// (`Value`) because the provider mixes numbers and numeric strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeritageDetail {
    pub uid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_hanja: Option<String>,
    #[serde(default)]
    pub city_code: Option<String>,
    #[serde(default)]
    pub linkage_number: Option<String>,
    #[serde(default)]
    pub heritage_type_code: Option<String>,
    #[serde(default)]
    pub canceled: bool,
    #[serde(default)]
    pub last_modified: Option<RawDate>,
    #[serde(default)]
    pub management_number: Option<String>,
    #[serde(default)]
    pub longitude: Option<Value>,
    #[serde(default)]
    pub latitude: Option<Value>,
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub registered_date: Option<RawDate>,
    #[serde(default)]
    pub location_description: Option<String>,
    #[serde(default)]
    pub era: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub manager: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category1: Option<String>,
    #[serde(default)]
    pub category2: Option<String>,
    #[serde(default)]
    pub category3: Option<String>,
    #[serde(default)]
    pub category4: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageItem {
    #[serde(default)]
    pub licence: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}
