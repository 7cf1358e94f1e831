//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::str::FromStr;
use std::sync::Once;

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        let _ = dotenv::dotenv();
    });
}

/// Get required env var; error if missing.
pub fn env_req(key: &str) -> anyhow::Result<String> {
    init_env();
    std::env::var(key).map_err(|_| anyhow::anyhow!("missing env var {key}"))
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Clone,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Boolean flag; accepts 1/true/on/yes (case-insensitive) as true.
pub fn env_flag(key: &str, default: bool) -> bool {
    init_env();
    match std::env::var(key) {
        Ok(raw) => {
            let v = raw.trim().to_ascii_lowercase();
            matches!(v.as_str(), "1" | "true" | "on" | "yes")
        }
        Err(_) => default,
    }
}

/// Database URL resolution: explicit Supabase DSN first, then the generic
/// fallbacks. Returns the first one set.
pub fn db_url() -> anyhow::Result<String> {
    init_env();
    for k in ["SUPABASE_DB_URL", "DATABASE_URL", "DB_URL"] {
        if let Some(v) = env_opt(k) {
            return Ok(prefer_session_mode(&v));
        }
    }
    Err(anyhow::anyhow!("no database URL env vars set"))
}

/// If the URL looks like Supabase's transaction pooler (port 6543),
/// prefer the session pooler (5432) automatically to avoid prepare/timeout issues.
pub fn prefer_session_mode(url: &str) -> String {
    if url.contains("pooler.supabase.com:6543") {
        tracing::warn!(
            "detected Supabase transaction pooler (:6543); switching to :5432 (session)"
        );
        url.replace("pooler.supabase.com:6543", "pooler.supabase.com:5432")
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_swap_rewrites_transaction_pooler_port() {
        let url = "postgresql://u:p@aws-0-x.pooler.supabase.com:6543/postgres";
        assert_eq!(
            prefer_session_mode(url),
            "postgresql://u:p@aws-0-x.pooler.supabase.com:5432/postgres"
        );
    }

    #[test]
    fn session_swap_leaves_direct_urls_alone() {
        let url = "postgresql://u:p@db.example.com:5432/postgres";
        assert_eq!(prefer_session_mode(url), url);
    }
}
