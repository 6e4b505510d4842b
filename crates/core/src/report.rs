use crate::domain::{Dimension, Transaction};
use crate::pipeline::aggregate::{
    self, Bucket, GroupTotal, ValueCount, WeekdayTotal, TOP_PRODUCTS,
};
use crate::pipeline::daily::{self, Alert, DailyQuality, Trend, TrendSource};
use crate::pipeline::filter::{self, DateRange, Filters};
use crate::pipeline::kpi::Kpis;
use crate::pipeline::schema::{Column, SalesColumn, SummaryColumn};
use crate::pipeline::{Dataset, NetSalesSource};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardRequest {
    #[serde(flatten)]
    pub filters: Filters,
    #[serde(default)]
    pub trend: TrendSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct Highlights {
    pub last_order_date: Option<NaiveDate>,
    pub leading_channel: Option<String>,
    pub leading_category: Option<String>,
    pub leading_product: Option<String>,
}

/// A section left out because the sheet lacks the column it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Omitted {
    pub section: &'static str,
    pub column: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub snapshot_id: Uuid,
    pub loaded_at: DateTime<Utc>,
    pub range: DateRange,
    pub filters: Filters,
    pub rows: usize,
    pub net_sales_source: NetSalesSource,
    pub kpis: Kpis,
    pub highlights: Highlights,
    pub trend: Trend,
    pub alerts: Option<Vec<Alert>>,
    pub daily_quality: Option<DailyQuality>,
    pub by_channel: Option<Vec<GroupTotal>>,
    pub by_category: Option<Vec<GroupTotal>>,
    pub top_products: Option<Vec<GroupTotal>>,
    pub by_weekday: Vec<WeekdayTotal>,
    pub status_counts: Option<Vec<ValueCount>>,
    pub delivery_days: Option<Vec<Bucket>>,
    pub ratings: Option<Vec<Bucket>>,
    pub customer_notes: Option<Vec<String>>,
    pub omitted: Vec<Omitted>,
}

/// Collects the sections that depend on an optional column, remembering the ones that
/// had to be skipped.
struct Sections {
    omitted: Vec<Omitted>,
}

impl Sections {
    fn sales<T>(
        &mut self,
        dataset: &Dataset,
        section: &'static str,
        column: SalesColumn,
        build: impl FnOnce() -> T,
    ) -> Option<T> {
        self.gate(dataset.sales.schema.has(column), section, column.name(), build)
    }

    fn summary<T>(
        &mut self,
        dataset: &Dataset,
        section: &'static str,
        column: SummaryColumn,
        build: impl FnOnce() -> T,
    ) -> Option<T> {
        self.gate(dataset.summary.schema.has(column), section, column.name(), build)
    }

    fn gate<T>(
        &mut self,
        present: bool,
        section: &'static str,
        column: &'static str,
        build: impl FnOnce() -> T,
    ) -> Option<T> {
        if present {
            return Some(build());
        }
        self.omitted.push(Omitted { section, column });
        None
    }
}

impl DashboardReport {
    pub fn build(dataset: &Dataset, request: &DashboardRequest) -> Self {
        let sales = &dataset.sales;
        let range = request
            .filters
            .date_range(sales)
            .unwrap_or_else(|| empty_range(dataset.loaded_at.date_naive()));
        let rows: Vec<&Transaction> = filter::apply(sales, &request.filters);

        let kpis = Kpis::compute(&rows, &sales.schema);
        let highlights = Highlights {
            last_order_date: kpis.last_order_date,
            leading_channel: aggregate::leading(&rows, Dimension::Channel),
            leading_category: aggregate::leading(&rows, Dimension::Category),
            leading_product: aggregate::leading(&rows, Dimension::Product),
        };

        let mut s = Sections {
            omitted: Vec::new(),
        };

        let trend = daily::trend(request.trend, &dataset.summary, &rows, range);
        let alerts = s.summary(dataset, "alerts", SummaryColumn::Observations, || {
            daily::alerts(&dataset.summary, range).unwrap_or_default()
        });
        let daily_quality = (request.trend == TrendSource::Summary)
            .then(|| {
                s.summary(dataset, "daily_quality", SummaryColumn::Date, || {
                    daily::daily_quality(&dataset.summary, range)
                })
            })
            .flatten();

        let by_channel = s.sales(dataset, "by_channel", SalesColumn::Channel, || {
            aggregate::sales_by(&rows, Dimension::Channel)
        });
        let by_category = s.sales(dataset, "by_category", SalesColumn::Category, || {
            aggregate::sales_by(&rows, Dimension::Category)
        });
        let top_products = s.sales(dataset, "top_products", SalesColumn::Product, || {
            aggregate::top_products(&rows, TOP_PRODUCTS)
        });
        let status_counts = s.sales(dataset, "status_counts", SalesColumn::Status, || {
            aggregate::status_counts(&rows)
        });
        let delivery_days = s.sales(dataset, "delivery_days", SalesColumn::DeliveryDays, || {
            aggregate::delivery_days_buckets(&rows)
        });
        let ratings = s.sales(dataset, "ratings", SalesColumn::Rating, || {
            aggregate::rating_buckets(&rows)
        });
        let customer_notes = s.sales(dataset, "customer_notes", SalesColumn::Notes, || {
            rows.iter()
                .filter_map(|t| t.notes.clone())
                .collect::<Vec<String>>()
        });

        tracing::debug!(
            snapshot_id = %dataset.snapshot_id,
            rows = rows.len(),
            omitted = s.omitted.len(),
            "built dashboard report"
        );

        Self {
            snapshot_id: dataset.snapshot_id,
            loaded_at: dataset.loaded_at,
            range,
            filters: request.filters.clone(),
            rows: rows.len(),
            net_sales_source: sales.net_sales_source,
            kpis,
            highlights,
            trend,
            alerts,
            daily_quality,
            by_channel,
            by_category,
            top_products,
            by_weekday: aggregate::sales_by_weekday(&rows),
            status_counts,
            delivery_days,
            ratings,
            customer_notes,
            omitted: s.omitted,
        }
    }
}

fn empty_range(day: NaiveDate) -> DateRange {
    DateRange {
        start: day,
        end: day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::RawTable;

    fn dataset(sales: &str, summary: &str) -> Dataset {
        Dataset::from_raw(
            &RawTable::from_csv(sales).unwrap(),
            &RawTable::from_csv(summary).unwrap(),
        )
        .unwrap()
    }

    const SALES: &str = "id_pedido,fecha_pedido,canal,categoria,producto,unidades,precio_unitario,descuento_pct,estado_pedido\n\
                         1,03/03/2025,Web,Deco,Florero,3,100,10,Entregado\n\
                         2,04/03/2025,Instagram,Cocina,Taza,1,50,0,Cancelado\n\
                         3,10/03/2025,Web,Cocina,Taza,2,50,0,Entregado\n";

    const SUMMARY: &str = "fecha_analizada,ventas_netas_dia,observaciones\n\
                           03/03/2025,270,OK\n\
                           04/03/2025,50,Revisar cancelaciones\n";

    #[test]
    fn builds_full_report_with_defaults() {
        let ds = dataset(SALES, SUMMARY);
        let r = DashboardReport::build(&ds, &DashboardRequest::default());

        assert_eq!(r.rows, 3);
        assert_eq!(r.kpis.orders, 3);
        assert!((r.kpis.total_net_sales - 420.0).abs() < 1e-9);
        assert_eq!(r.highlights.leading_channel.as_deref(), Some("Web"));
        assert_eq!(r.highlights.leading_product.as_deref(), Some("Florero"));
        assert_eq!(r.trend.source, TrendSource::Summary);
        assert_eq!(r.trend.points.len(), 2);
        assert_eq!(r.alerts.as_ref().unwrap().len(), 1);
        assert!(r.by_weekday.first().is_some_and(|w| w.weekday == "Monday"));
    }

    #[test]
    fn missing_columns_are_reported_as_omitted() {
        let ds = dataset(SALES, SUMMARY);
        let r = DashboardReport::build(&ds, &DashboardRequest::default());

        assert!(r.delivery_days.is_none());
        assert!(r.ratings.is_none());
        assert!(r.customer_notes.is_none());
        assert!(r.omitted.contains(&Omitted {
            section: "ratings",
            column: "resena"
        }));
        assert!(!r.omitted.iter().any(|o| o.section == "by_channel"));
    }

    #[test]
    fn live_trend_and_filters_apply_together() {
        let ds = dataset(SALES, SUMMARY);
        let request = DashboardRequest {
            filters: Filters::default().with_dimension(Dimension::Category, ["Cocina"]),
            trend: TrendSource::Live,
        };
        let r = DashboardReport::build(&ds, &request);

        assert_eq!(r.rows, 2);
        assert_eq!(r.trend.source, TrendSource::Live);
        assert_eq!(r.trend.points.len(), 2);
        assert!(r.daily_quality.is_none());
        assert_eq!(r.kpis.cancellation_rate, 0.5);
    }

    #[test]
    fn deselecting_everything_yields_zero_kpis() {
        let ds = dataset(SALES, SUMMARY);
        let request = DashboardRequest {
            filters: Filters::default().with_dimension(Dimension::Channel, Vec::<String>::new()),
            trend: TrendSource::Live,
        };
        let r = DashboardReport::build(&ds, &request);

        assert_eq!(r.rows, 0);
        assert_eq!(r.kpis.average_ticket, 0.0);
        assert_eq!(r.highlights.leading_channel, None);
        assert!(r.trend.points.is_empty());
    }

    #[test]
    fn default_request_equals_all_options_selected() {
        let ds = dataset(
            "fecha_pedido,canal,importe_total\n01/03/2025,Web,100\n02/03/2025,,900\n",
            "fecha_analizada\n",
        );
        let opts = filter::filter_options(&ds.sales, &Filters::default()).unwrap();
        let all_selected = DashboardRequest {
            filters: Filters::default()
                .with_dimension(Dimension::Channel, opts.dimensions[&Dimension::Channel].clone()),
            trend: TrendSource::Live,
        };
        let default = DashboardRequest {
            trend: TrendSource::Live,
            ..Default::default()
        };

        let a = DashboardReport::build(&ds, &default);
        let b = DashboardReport::build(&ds, &all_selected);
        assert_eq!(a.rows, 1);
        assert_eq!(a.kpis.total_net_sales, 100.0);
        assert_eq!(a.kpis, b.kpis);
    }

    #[test]
    fn request_deserializes_from_flat_json() {
        let req: DashboardRequest = serde_json::from_str(
            r#"{"start":"2025-03-01","dimensions":{"channel":["Web"]},"trend":"live"}"#,
        )
        .unwrap();
        assert_eq!(req.trend, TrendSource::Live);
        assert_eq!(req.filters.start, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert!(req.filters.dimensions[&Dimension::Channel].contains("Web"));
    }
}
