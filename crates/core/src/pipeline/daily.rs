//! Views over the daily summary sheet, and the live/pre-aggregated trend switch.

use crate::domain::{DailySummary, Transaction};
use crate::pipeline::aggregate::{daily_sales, DailyPoint};
use crate::pipeline::filter::DateRange;
use crate::pipeline::schema::SummaryColumn;
use crate::pipeline::tables::SummaryTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendSource {
    Live,
    #[default]
    Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    /// The source actually used; a summary request falls back to live when the sheet
    /// lacks the date or net sales column.
    pub source: TrendSource,
    pub points: Vec<DailyPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub date: NaiveDate,
    pub observation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Per-day quality series from the summary sheet; a series is `None` when its column
/// is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyQuality {
    pub avg_ticket: Option<Vec<SeriesPoint>>,
    pub cancel_pct: Option<Vec<SeriesPoint>>,
    pub avg_delivery_days: Option<Vec<SeriesPoint>>,
}

fn in_range<'a>(
    summary: &'a SummaryTable,
    range: DateRange,
) -> impl Iterator<Item = &'a DailySummary> + 'a {
    summary.rows.iter().filter(move |r| range.contains(r.date))
}

pub fn trend(
    requested: TrendSource,
    summary: &SummaryTable,
    filtered: &[&Transaction],
    range: DateRange,
) -> Trend {
    let summary_usable = summary.schema.has(SummaryColumn::Date)
        && summary.schema.has(SummaryColumn::NetSales);

    if requested == TrendSource::Summary && summary_usable {
        let points = in_range(summary, range)
            .filter_map(|r| {
                r.net_sales.map(|net_sales| DailyPoint {
                    date: r.date,
                    net_sales,
                })
            })
            .collect();
        return Trend {
            source: TrendSource::Summary,
            points,
        };
    }

    if requested == TrendSource::Summary {
        tracing::debug!("summary sheet lacks trend columns; using live trend");
    }
    Trend {
        source: TrendSource::Live,
        points: daily_sales(filtered),
    }
}

/// Flagged days in range, newest first. `None` when the sheet has no observations column.
pub fn alerts(summary: &SummaryTable, range: DateRange) -> Option<Vec<Alert>> {
    if !summary.schema.has(SummaryColumn::Observations) {
        return None;
    }
    let mut out: Vec<Alert> = in_range(summary, range)
        .filter_map(|r| {
            r.alert().map(|text| Alert {
                date: r.date,
                observation: text.to_string(),
            })
        })
        .collect();
    out.sort_by(|a, b| b.date.cmp(&a.date));
    Some(out)
}

pub fn daily_quality(summary: &SummaryTable, range: DateRange) -> DailyQuality {
    let series = |col: SummaryColumn, value: fn(&DailySummary) -> Option<f64>| {
        summary.schema.has(col).then(|| {
            in_range(summary, range)
                .map(|r| SeriesPoint {
                    date: r.date,
                    value: value(r),
                })
                .collect::<Vec<_>>()
        })
    };

    DailyQuality {
        avg_ticket: series(SummaryColumn::AvgTicket, |r| r.avg_ticket),
        cancel_pct: series(SummaryColumn::CancelPct, |r| r.cancel_pct),
        avg_delivery_days: series(SummaryColumn::AvgDeliveryDays, |r| r.avg_delivery_days),
    }
}
