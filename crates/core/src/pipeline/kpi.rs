use crate::domain::Transaction;
use crate::pipeline::aggregate::mean_positive;
use crate::pipeline::schema::{SalesColumn, SalesSchema};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_net_sales: f64,
    pub orders: usize,
    pub average_ticket: f64,
    pub cancellation_rate: f64,
    pub avg_delivery_days: f64,
    pub avg_rating: f64,
    pub last_order_date: Option<NaiveDate>,
}

impl Kpis {
    pub fn compute(rows: &[&Transaction], schema: &SalesSchema) -> Self {
        let total = total_net_sales(rows);
        let orders = order_count(rows, schema);
        Self {
            total_net_sales: total,
            orders,
            average_ticket: average_ticket(total, orders),
            cancellation_rate: cancellation_rate(rows, orders),
            avg_delivery_days: avg_delivery_days(rows),
            avg_rating: avg_rating(rows),
            last_order_date: rows.iter().map(|t| t.order_date.date()).max(),
        }
    }
}

pub fn total_net_sales(rows: &[&Transaction]) -> f64 {
    rows.iter().filter_map(|t| t.net_sales).sum()
}

pub fn order_count(rows: &[&Transaction], schema: &SalesSchema) -> usize {
    if !schema.has(SalesColumn::OrderId) {
        return rows.len();
    }
    rows.iter()
        .filter_map(|t| t.order_id.as_deref())
        .collect::<HashSet<_>>()
        .len()
}

pub fn average_ticket(total: f64, orders: usize) -> f64 {
    if orders == 0 {
        return 0.0;
    }
    total / orders as f64
}

pub fn cancellation_rate(rows: &[&Transaction], orders: usize) -> f64 {
    if orders == 0 {
        return 0.0;
    }
    let cancelled = rows.iter().filter(|t| t.is_cancelled()).count();
    cancelled as f64 / orders as f64
}

pub fn avg_delivery_days(rows: &[&Transaction]) -> f64 {
    mean_positive(rows.iter().map(|t| t.delivery_days)).unwrap_or(0.0)
}

pub fn avg_rating(rows: &[&Transaction]) -> f64 {
    mean_positive(rows.iter().map(|t| t.rating)).unwrap_or(0.0)
}
