//! Blob-storage client (Supabase Storage REST). Uploads go through a staged
//! temp file; the staging artifact is removed on every exit path because the
//! `NamedTempFile` guard lives only for the duration of the call.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;
use url::Url;

use crate::util::env as env_util;

const USER_AGENT: &str = concat!("heritage-sync/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct StorageClient {
    http: Client,
    base: String,
    bucket: String,
    service_key: String,
    staging_dir: PathBuf,
}

impl StorageClient {
    pub fn new(
        base: String,
        service_key: String,
        bucket: String,
        staging_dir: PathBuf,
    ) -> Result<Self> {
        Url::parse(&base).with_context(|| format!("invalid storage base URL: {base}"))?;
        std::fs::create_dir_all(&staging_dir)
            .with_context(|| format!("create staging dir {}", staging_dir.display()))?;
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            bucket,
            service_key,
            staging_dir,
        })
    }

    pub fn from_env() -> Result<Self> {
        let base = env_util::env_req("SUPABASE_URL")?;
        let service_key = env_util::env_req("SUPABASE_SERVICE_ROLE_KEY")?;
        let bucket =
            env_util::env_opt("SUPABASE_STORAGE_BUCKET").unwrap_or_else(|| "thumbnail".into());
        let staging_dir = env_util::env_opt("MEDIA_STAGING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        Self::new(base, service_key, bucket, staging_dir)
    }

    /// Deterministic public URL for an object; no round trip to the API.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base, self.bucket, key
        )
    }

    /// Stage `bytes` locally, upload them under `key` (upserting), and return
    /// the object's public URL. The staged artifact is gone when this returns,
    /// whatever the outcome.
    pub async fn upload_object(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String> {
        let staged = self.stage(bytes)?;
        let body = tokio::fs::read(staged.path())
            .await
            .context("read staged artifact")?;

        let url = format!("{}/storage/v1/object/{}/{}", self.base, self.bucket, key);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .with_context(|| format!("upload object {key}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            bail!("storage upload failed for {key}: {status} {detail}");
        }

        Ok(self.public_url(key))
    }

    fn stage(&self, bytes: &[u8]) -> Result<NamedTempFile> {
        let mut staged = tempfile::Builder::new()
            .prefix("hsync-")
            .suffix(".webp")
            .tempfile_in(&self.staging_dir)
            .with_context(|| {
                format!("create staging file in {}", self.staging_dir.display())
            })?;
        staged.write_all(bytes).context("write staging file")?;
        staged.flush().context("flush staging file")?;
        Ok(staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(staging: PathBuf) -> StorageClient {
        // Nothing listens on port 9; uploads fail fast.
        StorageClient::new(
            "http://127.0.0.1:9/".into(),
            "test-key".into(),
            "thumbnail".into(),
            staging,
        )
        .unwrap()
    }

    #[test]
    fn public_url_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let client = test_client(dir.path().to_path_buf());
        assert_eq!(
            client.public_url("42.webp"),
            "http://127.0.0.1:9/storage/v1/object/public/thumbnail/42.webp"
        );
    }

    #[tokio::test]
    async fn staging_artifact_removed_when_upload_fails() {
        let dir = tempfile::tempdir().unwrap();
        let client = test_client(dir.path().to_path_buf());
        let out = client
            .upload_object("1.webp", b"payload", "image/webp")
            .await;
        assert!(out.is_err());
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }
}
