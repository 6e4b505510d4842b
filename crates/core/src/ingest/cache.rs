use crate::ingest::sheets::SheetSource;
use crate::ingest::types::{RawTable, SheetKey};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Keyed store of fetched sheet tables that expire after `ttl`.
///
/// The lock is held across a fetch; concurrent callers wait for the in-flight request.
pub struct SheetCache<S> {
    source: S,
    ttl: Duration,
    entries: tokio::sync::Mutex<HashMap<SheetKey, CachedTable>>,
}

#[derive(Debug, Clone)]
struct CachedTable {
    table: Arc<RawTable>,
    fetched_at: Instant,
}

impl<S: SheetSource> SheetCache<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entries: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn get_or_fetch(&self, key: &SheetKey) -> Result<Arc<RawTable>> {
        let mut guard = self.entries.lock().await;
        if let Some(cached) = guard.get(key) {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(cached.table.clone());
            }
        }

        let fetched_at = Instant::now();
        let table = Arc::new(self.source.fetch_table(key).await?);
        tracing::info!(
            sheet = %key,
            source = self.source.source_name(),
            rows = table.len(),
            columns = table.headers.len(),
            "fetched sheet export"
        );

        guard.insert(
            key.clone(),
            CachedTable {
                table: table.clone(),
                fetched_at,
            },
        );
        Ok(table)
    }

    pub async fn invalidate(&self) {
        let mut guard = self.entries.lock().await;
        let dropped = guard.len();
        guard.clear();
        tracing::info!(dropped, "sheet cache invalidated");
    }
}
