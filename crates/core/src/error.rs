use thiserror::Error;

/// Failures that abort a refresh pass. Per-cell parse problems never show up here;
/// they become missing values instead.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(
        "could not read sheet {sheet} (primary: {primary}; fallback: {fallback}). \
         Check the sheet sharing settings: anyone with the link must be a Viewer"
    )]
    Fetch {
        sheet: String,
        primary: String,
        fallback: String,
    },

    #[error("{table}: required column `{column}` is missing")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("{table}: no rows with a valid `{column}`")]
    EmptyDataset {
        table: &'static str,
        column: &'static str,
    },

    #[error("invalid CSV export: {0}")]
    InvalidCsv(String),
}

impl DashboardError {
    /// Whether the failure came from the remote source rather than from its contents.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}
