use crate::config::Settings;
use crate::error::DashboardError;
use crate::ingest::types::{RawTable, SheetKey};
use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::future::Future;

const DEFAULT_BASE_URL: &str = "https://docs.google.com";

#[async_trait::async_trait]
pub trait SheetSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_table(&self, key: &SheetKey) -> Result<RawTable>;
}

/// Reads public Google Sheets tabs through their CSV export endpoints.
#[derive(Debug, Clone)]
pub struct GoogleSheetsSource {
    http: reqwest::Client,
    base_url: String,
}

impl GoogleSheetsSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .sheets_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let http = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .build()
            .context("failed to build sheets http client")?;

        Ok(Self { http, base_url })
    }

    pub fn export_url(&self, key: &SheetKey) -> String {
        format!(
            "{}/spreadsheets/d/{}/export?format=csv&gid={}",
            self.base_url.trim_end_matches('/'),
            key.sheet_id,
            key.gid
        )
    }

    pub fn gviz_url(&self, key: &SheetKey) -> String {
        format!(
            "{}/spreadsheets/d/{}/gviz/tq?tqx=out:csv&gid={}",
            self.base_url.trim_end_matches('/'),
            key.sheet_id,
            key.gid
        )
    }

    async fn fetch_csv(&self, url: String) -> Result<RawTable> {
        let res = self
            .http
            .get(url)
            .send()
            .await
            .context("sheet export request failed")?;

        let status = res.status();
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = res
            .bytes()
            .await
            .context("failed to read sheet export body")?;

        check_export(status, content_type.as_deref(), &bytes)
    }
}

/// Accepts a response only when it is a 2xx CSV body. Unshared sheets answer 200 with
/// the sign-in page.
fn check_export(status: StatusCode, content_type: Option<&str>, body: &[u8]) -> Result<RawTable> {
    if !status.is_success() {
        anyhow::bail!("sheet export HTTP {status}");
    }

    let text = decode_body(body);
    let is_html = content_type.is_some_and(|v| v.contains("text/html"));
    if is_html || text.trim_start().starts_with('<') {
        anyhow::bail!("sheet export returned HTML instead of CSV");
    }

    RawTable::from_csv(&text)
}

#[async_trait::async_trait]
impl SheetSource for GoogleSheetsSource {
    fn source_name(&self) -> &'static str {
        "google_sheets_csv"
    }

    async fn fetch_table(&self, key: &SheetKey) -> Result<RawTable> {
        let primary = self.export_url(key);
        let fallback = self.gviz_url(key);
        fetch_with_fallback(key, primary, fallback, |url| self.fetch_csv(url)).await
    }
}

/// Tries `primary`, then `fallback` once. Both failing is a [`DashboardError::Fetch`].
pub(crate) async fn fetch_with_fallback<F, Fut>(
    key: &SheetKey,
    primary: String,
    fallback: String,
    fetch: F,
) -> Result<RawTable>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<RawTable>>,
{
    let primary_err = match fetch(primary.clone()).await {
        Ok(table) => return Ok(table),
        Err(err) => err,
    };

    tracing::warn!(
        sheet = %key,
        url = %primary,
        error = %primary_err,
        "primary sheet export failed; trying fallback endpoint"
    );

    match fetch(fallback.clone()).await {
        Ok(table) => Ok(table),
        Err(fallback_err) => {
            tracing::error!(sheet = %key, url = %fallback, error = %fallback_err, "fallback sheet export failed");
            Err(DashboardError::Fetch {
                sheet: key.to_string(),
                primary: format!("{primary_err:#}"),
                fallback: format!("{fallback_err:#}"),
            }
            .into())
        }
    }
}

fn decode_body(bytes: &[u8]) -> String {
    let (text, encoding, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if had_errors {
        tracing::warn!(encoding = encoding.name(), "sheet export contained invalid byte sequences");
    }
    text.into_owned()
}
