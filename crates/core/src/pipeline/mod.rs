pub mod aggregate;
pub mod daily;
pub mod filter;
pub mod kpi;
pub mod normalize;
pub mod schema;
pub mod tables;

use crate::ingest::RawTable;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use filter::{DateRange, Filters};
pub use tables::{NetSalesSource, SalesTable, SummaryTable};

/// Immutable result of one refresh: both sheets normalized, tagged with an id.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub snapshot_id: Uuid,
    pub loaded_at: DateTime<Utc>,
    pub sales: SalesTable,
    pub summary: SummaryTable,
}

impl Dataset {
    pub fn from_raw(sales: &RawTable, summary: &RawTable) -> anyhow::Result<Self> {
        Ok(Self {
            snapshot_id: Uuid::new_v4(),
            loaded_at: Utc::now(),
            sales: SalesTable::from_raw(sales)?,
            summary: SummaryTable::from_raw(summary),
        })
    }
}
