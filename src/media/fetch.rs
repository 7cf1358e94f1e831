use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::warn;

/// GET the raw bytes of a remote image with a bounded timeout. Any failure
/// (transport, timeout, non-200 status) is logged and yields None — the
/// caller skips the asset and a future scheduled run retries it naturally.
pub async fn fetch_image(http: &Client, url: &str, timeout: Duration) -> Option<Bytes> {
    let resp = match http.get(url).timeout(timeout).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!(url, error = %e, "image fetch failed");
            return None;
        }
    };
    if resp.status() != StatusCode::OK {
        warn!(url, status = %resp.status(), "image fetch returned non-200 status");
        return None;
    }
    match resp.bytes().await {
        Ok(b) => Some(b),
        Err(e) => {
            warn!(url, error = %e, "image body read failed");
            None
        }
    }
}
