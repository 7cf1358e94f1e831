//! Invalid-data side channel: every record or item that fails normalization
//! or persistence is dumped here with its full raw payload, keyed by uid, so
//! bad records can be found and replayed offline.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::error;

use crate::util::env as env_util;

pub const DEFAULT_PATH: &str = "invalid_data.ndjson";

/// Append-only NDJSON log. One JSON object per line: {ts, uid, reason, payload}.
pub struct InvalidDataLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl InvalidDataLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open invalid-data log {}", path.display()))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn from_env() -> Result<Self> {
        let path = env_util::env_opt("INVALID_DATA_PATH").unwrap_or_else(|| DEFAULT_PATH.into());
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one failed item. Logging must never take the run down, so write
    /// errors are reported on the operational stream and swallowed.
    pub fn record(&self, uid: &str, reason: &str, payload: &Value) {
        let line = serde_json::json!({
            "ts": chrono::Utc::now(),
            "uid": uid,
            "reason": reason,
            "payload": payload,
        });
        let mut file = match self.file.lock() {
            Ok(f) => f,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{line}") {
            error!(uid, error = %e, "failed to append to invalid-data log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_appended_as_ndjson() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.ndjson");
        let log = InvalidDataLog::open(&path).unwrap();
        log.record("A-1", "insert failed", &serde_json::json!({"uid": "A-1"}));
        log.record("A-2", "detail fetch failed", &serde_json::json!({"uid": "A-2"}));

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["uid"], "A-1");
        assert_eq!(first["reason"], "insert failed");
        assert_eq!(first["payload"]["uid"], "A-1");
    }
}
