use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::util::env as env_util;

use super::models::{HeritageDetail, ImageItem, RecordStub, SearchPage};

const USER_AGENT: &str = concat!("heritage-sync/", env!("CARGO_PKG_VERSION"));

/// Client for the paginated catalog source. One instance per run, passed in
/// wherever catalog access is needed.
pub struct CatalogClient {
    http: Client,
    base: Url,
}

impl CatalogClient {
    pub fn new(mut base: Url) -> Result<Self> {
        // Url::join drops the last path segment unless the base ends with '/'.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, base })
    }

    pub fn from_env() -> Result<Self> {
        let base = env_util::env_req("CATALOG_API_BASE")?;
        let base = Url::parse(&base).with_context(|| format!("invalid CATALOG_API_BASE: {base}"))?;
        Self::new(base)
    }

    /// One page of the catalog scan. Pages are 1-indexed.
    pub async fn search(&self, page_size: u32, page_index: u32) -> Result<SearchPage> {
        let url = self.base.join("records")?;
        let page = self
            .http
            .get(url)
            .query(&[("pageSize", page_size), ("pageIndex", page_index)])
            .send()
            .await?
            .error_for_status()?
            .json::<SearchPage>()
            .await
            .with_context(|| format!("decode search page {page_index}"))?;
        Ok(page)
    }

    pub async fn detail(&self, stub: &RecordStub) -> Result<HeritageDetail> {
        let url = self.record_url(stub, None)?;
        let detail = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<HeritageDetail>()
            .await
            .with_context(|| format!("decode detail for uid {}", stub.uid))?;
        Ok(detail)
    }

    pub async fn images(&self, stub: &RecordStub) -> Result<Vec<ImageItem>> {
        let url = self.record_url(stub, Some("images"))?;
        let images = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<ImageItem>>()
            .await
            .with_context(|| format!("decode images for uid {}", stub.uid))?;
        Ok(images)
    }

    pub async fn videos(&self, stub: &RecordStub) -> Result<Vec<String>> {
        let url = self.record_url(stub, Some("videos"))?;
        let videos = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<String>>()
            .await
            .with_context(|| format!("decode videos for uid {}", stub.uid))?;
        Ok(videos)
    }

    // Detail endpoints are keyed by the provider's addressing triple.
    fn record_url(&self, stub: &RecordStub, suffix: Option<&str>) -> Result<Url> {
        let mut path = format!(
            "records/{}/{}/{}",
            stub.heritage_type_code, stub.management_number, stub.city_code
        );
        if let Some(s) = suffix {
            path.push('/');
            path.push_str(s);
        }
        Ok(self.base.join(&path)?)
    }
}
