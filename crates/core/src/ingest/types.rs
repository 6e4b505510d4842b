use crate::error::DashboardError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetKey {
    pub sheet_id: String,
    pub gid: String,
}

impl SheetKey {
    pub fn new(sheet_id: impl Into<String>, gid: impl Into<String>) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            gid: gid.into(),
        }
    }
}

impl fmt::Display for SheetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#gid={}", self.sheet_id, self.gid)
    }
}

/// A CSV export exactly as received: header row plus string cells.
/// Short rows are padded with empty cells so every row matches the header width.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn from_csv(text: &str) -> anyhow::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .context("failed to read CSV header row")?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(DashboardError::InvalidCsv("missing header row".to_string()).into());
        }

        let width = headers.len();
        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("malformed CSV record {}", idx + 1))?;
            let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
