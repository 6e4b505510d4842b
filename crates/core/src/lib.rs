pub mod domain;
pub mod error;
pub mod export;
pub mod format;
pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod service;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_SALES_GID: &str = "0";
    const DEFAULT_SUMMARY_GID: &str = "281676852";
    const DEFAULT_CACHE_TTL_SECS: u64 = 300;
    const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sheet_id: Option<String>,
        pub sales_gid: String,
        pub summary_gid: String,
        pub cache_ttl: Duration,
        pub http_timeout: Duration,
        pub sentry_dsn: Option<String>,
        pub sheets_base_url: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                sheet_id: None,
                sales_gid: DEFAULT_SALES_GID.to_string(),
                summary_gid: DEFAULT_SUMMARY_GID.to_string(),
                cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
                http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
                sentry_dsn: None,
                sheets_base_url: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sheet_id: std::env::var("SHEET_ID")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                sales_gid: std::env::var("SALES_GID")
                    .unwrap_or_else(|_| DEFAULT_SALES_GID.to_string()),
                summary_gid: std::env::var("SUMMARY_GID")
                    .unwrap_or_else(|_| DEFAULT_SUMMARY_GID.to_string()),
                cache_ttl: Duration::from_secs(env_u64("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)),
                http_timeout: Duration::from_secs(env_u64(
                    "HTTP_TIMEOUT_SECS",
                    DEFAULT_HTTP_TIMEOUT_SECS,
                )),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                sheets_base_url: std::env::var("SHEETS_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
            })
        }

        pub fn require_sheet_id(&self) -> anyhow::Result<&str> {
            self.sheet_id.as_deref().context("SHEET_ID is required")
        }
    }

    fn env_u64(key: &str, default: u64) -> u64 {
        std::env::var(key)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(default)
    }
}
