use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of the `resumen_diario` sheet, pre-aggregated upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub net_sales: Option<f64>,
    pub avg_ticket: Option<f64>,
    pub cancel_pct: Option<f64>,
    pub avg_delivery_days: Option<f64>,
    pub avg_rating: Option<f64>,
    pub top_channel: Option<String>,
    pub top_category: Option<String>,
    pub observation: Option<String>,
}

impl DailySummary {
    pub fn dated(date: NaiveDate) -> Self {
        Self {
            date,
            net_sales: None,
            avg_ticket: None,
            cancel_pct: None,
            avg_delivery_days: None,
            avg_rating: None,
            top_channel: None,
            top_category: None,
            observation: None,
        }
    }

    /// The observation text when it flags something; "OK" and blanks do not.
    pub fn alert(&self) -> Option<&str> {
        let text = self.observation.as_deref()?.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("OK") {
            return None;
        }
        Some(text)
    }
}
