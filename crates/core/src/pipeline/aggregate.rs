use crate::domain::{Dimension, Transaction};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;

pub const TOP_PRODUCTS: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub label: String,
    pub net_sales: f64,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub net_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayTotal {
    pub weekday: String,
    pub net_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub value: i64,
    pub count: usize,
    pub net_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Net sales per value of `dimension`, largest first. Rows without a value are left out.
///
/// Groups start in label order and the sort is stable, so exact ties keep label order.
pub fn sales_by(rows: &[&Transaction], dimension: Dimension) -> Vec<GroupTotal> {
    let mut groups = BTreeMap::<&str, (f64, usize)>::new();
    for t in rows {
        let Some(label) = t.dimension(dimension) else {
            continue;
        };
        let entry = groups.entry(label).or_insert((0.0, 0));
        entry.0 += t.net_sales.unwrap_or(0.0);
        entry.1 += 1;
    }

    let mut out: Vec<GroupTotal> = groups
        .into_iter()
        .map(|(label, (net_sales, rows))| GroupTotal {
            label: label.to_string(),
            net_sales,
            rows,
        })
        .collect();
    out.sort_by(|a, b| {
        b.net_sales
            .partial_cmp(&a.net_sales)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out
}

pub fn leading(rows: &[&Transaction], dimension: Dimension) -> Option<String> {
    sales_by(rows, dimension).into_iter().next().map(|g| g.label)
}

pub fn top_products(rows: &[&Transaction], n: usize) -> Vec<GroupTotal> {
    let mut out = sales_by(rows, Dimension::Product);
    out.truncate(n);
    out
}

pub fn daily_sales(rows: &[&Transaction]) -> Vec<DailyPoint> {
    let mut days = BTreeMap::<NaiveDate, f64>::new();
    for t in rows {
        *days.entry(t.order_date.date()).or_insert(0.0) += t.net_sales.unwrap_or(0.0);
    }
    days.into_iter()
        .map(|(date, net_sales)| DailyPoint { date, net_sales })
        .collect()
}

pub fn sales_by_weekday(rows: &[&Transaction]) -> Vec<WeekdayTotal> {
    let mut days = BTreeMap::<u32, (Weekday, f64)>::new();
    for t in rows {
        let wd = t.order_date.weekday();
        let entry = days.entry(wd.num_days_from_monday()).or_insert((wd, 0.0));
        entry.1 += t.net_sales.unwrap_or(0.0);
    }
    days.into_values()
        .map(|(wd, net_sales)| WeekdayTotal {
            weekday: weekday_name(wd).to_string(),
            net_sales,
        })
        .collect()
}

fn weekday_name(wd: Weekday) -> &'static str {
    match wd {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn delivery_days_buckets(rows: &[&Transaction]) -> Vec<Bucket> {
    buckets(rows, |t| t.delivery_days, |v| v.floor() as i64)
}

pub fn rating_buckets(rows: &[&Transaction]) -> Vec<Bucket> {
    buckets(rows, |t| t.rating, |v| (v.round() as i64).clamp(1, 5))
}

fn buckets(
    rows: &[&Transaction],
    value: impl Fn(&Transaction) -> Option<f64>,
    bucket_of: impl Fn(f64) -> i64,
) -> Vec<Bucket> {
    let mut out = BTreeMap::<i64, (usize, f64)>::new();
    for &t in rows {
        let Some(v) = value(t).filter(|v| *v > 0.0) else {
            continue;
        };
        let entry = out.entry(bucket_of(v)).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += t.net_sales.unwrap_or(0.0);
    }
    out.into_iter()
        .map(|(value, (count, net_sales))| Bucket {
            value,
            count,
            net_sales,
        })
        .collect()
}

pub fn status_counts(rows: &[&Transaction]) -> Vec<ValueCount> {
    let mut counts = BTreeMap::<&str, usize>::new();
    for t in rows {
        if let Some(s) = t.status.as_deref() {
            *counts.entry(s).or_insert(0) += 1;
        }
    }
    let mut out: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// Mean of the strictly positive values; zero and missing values are not counted.
pub fn mean_positive(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, n) = values
        .flatten()
        .filter(|v| *v > 0.0)
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(d: u32, channel: &str, net: f64) -> Transaction {
        let date = NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
        Transaction {
            channel: Some(channel.to_string()),
            net_sales: Some(net),
            ..Transaction::dated(date.and_hms_opt(10, 0, 0).unwrap())
        }
    }

    #[test]
    fn groups_sum_and_sort_descending() {
        let rows = [tx(1, "Web", 10.0), tx(2, "Local", 50.0), tx(3, "Web", 30.0)];
        let refs: Vec<&Transaction> = rows.iter().collect();
        let out = sales_by(&refs, Dimension::Channel);
        assert_eq!(out[0].label, "Local");
        assert_eq!(out[0].net_sales, 50.0);
        assert_eq!(out[1].label, "Web");
        assert_eq!(out[1].net_sales, 40.0);
        assert_eq!(out[1].rows, 2);
    }

    #[test]
    fn leading_is_none_without_rows() {
        assert_eq!(leading(&[], Dimension::Channel), None);
    }

    #[test]
    fn weekday_order_is_calendar_not_value() {
        // 2025-03-01 is a Saturday, 2025-03-03 a Monday, 2025-03-05 a Wednesday.
        let rows = [tx(1, "Web", 500.0), tx(5, "Web", 200.0), tx(3, "Web", 1.0)];
        let refs: Vec<&Transaction> = rows.iter().collect();
        let days: Vec<String> = sales_by_weekday(&refs).into_iter().map(|w| w.weekday).collect();
        assert_eq!(days, vec!["Monday", "Wednesday", "Saturday"]);
    }

    #[test]
    fn daily_sales_sums_per_day_ascending() {
        let rows = [tx(2, "Web", 5.0), tx(1, "Web", 1.0), tx(2, "Local", 5.0)];
        let refs: Vec<&Transaction> = rows.iter().collect();
        let out = daily_sales(&refs);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].net_sales, 10.0);
        assert!(out[0].date < out[1].date);
    }

    #[test]
    fn buckets_skip_non_positive_values() {
        let mut a = tx(1, "Web", 10.0);
        a.rating = Some(4.6);
        let mut b = tx(1, "Web", 20.0);
        b.rating = Some(0.0);
        let mut c = tx(1, "Web", 30.0);
        c.rating = Some(5.0);
        let refs = vec![&a, &b, &c];
        let out = rating_buckets(&refs);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value, 5);
        assert_eq!(out[0].count, 2);
        assert_eq!(out[0].net_sales, 40.0);
    }

    #[test]
    fn mean_ignores_zero_and_missing() {
        let m = mean_positive([Some(2.0), Some(0.0), None, Some(4.0)].into_iter());
        assert_eq!(m, Some(3.0));
        assert_eq!(mean_positive([Some(0.0), None].into_iter()), None);
    }

    #[test]
    fn status_counts_most_frequent_first() {
        let mut rows = vec![tx(1, "Web", 1.0), tx(1, "Web", 1.0), tx(1, "Web", 1.0)];
        rows[0].status = Some("Cancelado".into());
        rows[1].status = Some("Entregado".into());
        rows[2].status = Some("Entregado".into());
        let refs: Vec<&Transaction> = rows.iter().collect();
        let out = status_counts(&refs);
        assert_eq!(out[0].value, "Entregado");
        assert_eq!(out[0].count, 2);
    }
}
