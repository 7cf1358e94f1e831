//! Sequential paginated scan of the catalog source: dedup gate, detail
//! retrieval, normalization, transactional insert. Item failures are
//! isolated; only retry exhaustion on the page fetch and an unparsable hit
//! count abort the run.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::catalog::{CatalogClient, RecordStub};
use crate::database_ops::db::Db;
use crate::database_ops::heritage;
use crate::invalid::InvalidDataLog;
use crate::normalization::normalize;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::util::env as env_util;

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub page_size: u32,
    pub retry: RetryPolicy,
}

impl IngestConfig {
    pub fn from_env() -> Self {
        Self {
            page_size: env_util::env_parse("CATALOG_PAGE_SIZE", 100u32).max(1),
            retry: RetryPolicy {
                max_attempts: env_util::env_parse("CATALOG_MAX_RETRIES", 5u32).max(1),
                ..RetryPolicy::default()
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct IngestSummary {
    pub pages: u32,
    pub seen: u64,
    pub inserted: u64,
    pub already_present: u64,
    pub failed: u64,
}

/// Per-item result, explicit so skip reasons stay inspectable.
#[derive(Debug)]
enum ItemOutcome {
    Inserted,
    AlreadyPresent,
    Failed(String),
}

/// ceil(hits / page_size). Computed once, from the first successful page.
pub fn total_pages(total_hits: u64, page_size: u32) -> u32 {
    total_hits.div_ceil(page_size as u64) as u32
}

pub async fn run_catalog_ingest(
    db: &Db,
    catalog: &CatalogClient,
    invalid: &InvalidDataLog,
    cfg: &IngestConfig,
) -> Result<IngestSummary> {
    let mut summary = IngestSummary::default();
    let mut page_index: u32 = 1;
    let mut total: Option<u32> = None;

    loop {
        info!(page = page_index, "starting page");
        let page = retry_with_backoff(cfg.retry, "catalog_search", || {
            catalog.search(cfg.page_size, page_index)
        })
        .await
        .map_err(|e| {
            error!(fatal = true, page = page_index, error = %e, "page fetch failed after retries; aborting run");
            e
        })
        .with_context(|| format!("fetch catalog page {page_index}"))?;

        if total.is_none() {
            let hits: u64 = match page.hits.trim().parse() {
                Ok(h) => h,
                Err(_) => {
                    invalid.record(
                        "",
                        "invalid total hit count",
                        &serde_json::json!({ "hits": page.hits }),
                    );
                    error!(fatal = true, hits = %page.hits, "total hit count is not numeric; aborting run");
                    bail!("invalid total hit count: {:?}", page.hits);
                }
            };
            let pages = total_pages(hits, cfg.page_size);
            info!(total_items = hits, total_pages = pages, "discovered catalog size");
            total = Some(pages);
        }

        if page.items.is_empty() {
            info!(page = page_index, "no items on page; ending pagination");
            break;
        }

        for stub in &page.items {
            summary.seen += 1;
            match process_item(db, catalog, invalid, stub).await {
                ItemOutcome::Inserted => summary.inserted += 1,
                ItemOutcome::AlreadyPresent => summary.already_present += 1,
                ItemOutcome::Failed(reason) => {
                    summary.failed += 1;
                    warn!(uid = %stub.uid, reason = %reason, "item failed; logged and continuing");
                }
            }
        }

        summary.pages += 1;
        info!(page = page_index, "completed page");
        page_index += 1;
        // The declared page count is advisory; the empty-page check above is
        // the other way out.
        if page_index > total.unwrap_or(0) {
            info!("all pages processed");
            break;
        }
    }

    Ok(summary)
}

async fn process_item(
    db: &Db,
    catalog: &CatalogClient,
    invalid: &InvalidDataLog,
    stub: &RecordStub,
) -> ItemOutcome {
    if heritage::heritage_exists(db, &stub.uid).await {
        info!(uid = %stub.uid, "already exists; skipping");
        return ItemOutcome::AlreadyPresent;
    }

    let detail = match catalog.detail(stub).await {
        Ok(d) => d,
        Err(e) => return fail_item(invalid, stub, format!("detail retrieval failed: {e}")),
    };
    let images = match catalog.images(stub).await {
        Ok(i) => i,
        Err(e) => return fail_item(invalid, stub, format!("image retrieval failed: {e}")),
    };
    let videos = match catalog.videos(stub).await {
        Ok(v) => v,
        Err(e) => return fail_item(invalid, stub, format!("video retrieval failed: {e}")),
    };

    let rec = normalize(&detail, &images, &videos);
    if let Err(e) = heritage::insert_with_relations(db, &rec).await {
        // Full raw detail record, for offline forensic replay.
        let payload = serde_json::to_value(&detail).unwrap_or(Value::Null);
        invalid.record(&stub.uid, "insert failed", &payload);
        return ItemOutcome::Failed(format!("insert failed: {e}"));
    }

    info!(uid = %stub.uid, "inserted heritage item");
    ItemOutcome::Inserted
}

fn fail_item(invalid: &InvalidDataLog, stub: &RecordStub, reason: String) -> ItemOutcome {
    let payload = serde_json::to_value(stub).unwrap_or(Value::Null);
    invalid.record(&stub.uid, &reason, &payload);
    ItemOutcome::Failed(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_is_ceiling_division() {
        assert_eq!(total_pages(250, 100), 3);
        assert_eq!(total_pages(300, 100), 3);
        assert_eq!(total_pages(301, 100), 4);
        assert_eq!(total_pages(1, 100), 1);
        assert_eq!(total_pages(0, 100), 0);
    }
}
