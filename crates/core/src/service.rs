use crate::config::Settings;
use crate::ingest::{SheetCache, SheetKey, SheetSource};
use crate::pipeline::Dataset;
use anyhow::Context;

/// Owns the sheet cache and turns the two cached exports into a fresh [`Dataset`] per
/// refresh.
pub struct Dashboard<S> {
    cache: SheetCache<S>,
    sales_key: SheetKey,
    summary_key: SheetKey,
}

impl<S: SheetSource> Dashboard<S> {
    pub fn from_settings(source: S, settings: &Settings) -> anyhow::Result<Self> {
        let sheet_id = settings.require_sheet_id()?;
        Ok(Self::new(
            source,
            SheetKey::new(sheet_id, &settings.sales_gid),
            SheetKey::new(sheet_id, &settings.summary_gid),
            settings.cache_ttl,
        ))
    }

    pub fn new(
        source: S,
        sales_key: SheetKey,
        summary_key: SheetKey,
        ttl: std::time::Duration,
    ) -> Self {
        Self {
            cache: SheetCache::new(source, ttl),
            sales_key,
            summary_key,
        }
    }

    /// One fetch-and-normalize pass. Any failure aborts the whole pass.
    pub async fn load(&self) -> anyhow::Result<Dataset> {
        let sales = self
            .cache
            .get_or_fetch(&self.sales_key)
            .await
            .context("failed to load sales sheet")?;
        let summary = self
            .cache
            .get_or_fetch(&self.summary_key)
            .await
            .context("failed to load daily summary sheet")?;

        let dataset = Dataset::from_raw(&sales, &summary)?;
        tracing::info!(
            snapshot_id = %dataset.snapshot_id,
            sales_rows = dataset.sales.rows.len(),
            summary_rows = dataset.summary.rows.len(),
            "dataset ready"
        );
        Ok(dataset)
    }

    pub async fn refresh(&self) {
        self.cache.invalidate().await;
    }
}
