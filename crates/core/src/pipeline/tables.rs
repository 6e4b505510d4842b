use crate::domain::{DailySummary, Transaction};
use crate::error::DashboardError;
use crate::ingest::RawTable;
use crate::pipeline::normalize::{coerce_number, parse_day_first};
use crate::pipeline::schema::{Column, SalesColumn, SalesSchema, SummaryColumn, SummarySchema};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

const SALES_TABLE: &str = "ventas_bazar";

/// Where net sales came from. Decided once per table, never per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetSalesSource {
    TotalAmount,
    Computed,
}

#[derive(Debug, Clone)]
pub struct SalesTable {
    pub schema: SalesSchema,
    pub net_sales_source: NetSalesSource,
    pub rows: Vec<Transaction>,
}

#[derive(Debug, Clone)]
pub struct SummaryTable {
    pub schema: SummarySchema,
    /// One record per date, ascending.
    pub rows: Vec<DailySummary>,
}

impl SalesTable {
    /// Normalizes the sales sheet. Rows without a readable order date are dropped; a sheet
    /// without the order date column, or with no datable row at all, is rejected.
    pub fn from_raw(raw: &RawTable) -> anyhow::Result<Self> {
        let schema = SalesSchema::detect(&raw.headers);
        if !schema.has(SalesColumn::OrderDate) {
            return Err(DashboardError::MissingColumn {
                table: SALES_TABLE,
                column: SalesColumn::OrderDate.name(),
            }
            .into());
        }

        let num = |row: &[String], col: SalesColumn| schema.raw(row, col).and_then(coerce_number);

        let net_sales_source = if raw
            .rows
            .iter()
            .any(|row| num(row, SalesColumn::TotalAmount).is_some())
        {
            NetSalesSource::TotalAmount
        } else {
            NetSalesSource::Computed
        };

        let mut rows = Vec::with_capacity(raw.len());
        let mut dropped: usize = 0;
        for row in &raw.rows {
            let Some(order_date) = schema
                .raw(row, SalesColumn::OrderDate)
                .and_then(parse_day_first)
            else {
                dropped += 1;
                continue;
            };

            let mut t = Transaction {
                order_id: schema.text(row, SalesColumn::OrderId),
                channel: schema.text(row, SalesColumn::Channel),
                sku: schema.text(row, SalesColumn::Sku),
                product: schema.text(row, SalesColumn::Product),
                category: schema.text(row, SalesColumn::Category),
                subcategory: schema.text(row, SalesColumn::Subcategory),
                units: num(row, SalesColumn::Units),
                unit_price: num(row, SalesColumn::UnitPrice),
                discount_pct: num(row, SalesColumn::DiscountPct),
                shipping_cost: num(row, SalesColumn::ShippingCost),
                payment_method: schema.text(row, SalesColumn::PaymentMethod),
                province: schema.text(row, SalesColumn::Province),
                city: schema.text(row, SalesColumn::City),
                customer_type: schema.text(row, SalesColumn::CustomerType),
                status: schema.text(row, SalesColumn::Status),
                delivery_days: num(row, SalesColumn::DeliveryDays),
                rating: num(row, SalesColumn::Rating),
                notes: schema.text(row, SalesColumn::Notes),
                total_amount: num(row, SalesColumn::TotalAmount),
                ..Transaction::dated(order_date)
            };
            t.net_sales = match net_sales_source {
                NetSalesSource::TotalAmount => t.total_amount,
                NetSalesSource::Computed => Some(computed_net_sales(&t)),
            };
            rows.push(t);
        }

        if rows.is_empty() {
            return Err(DashboardError::EmptyDataset {
                table: SALES_TABLE,
                column: SalesColumn::OrderDate.name(),
            }
            .into());
        }

        tracing::info!(
            rows = rows.len(),
            dropped,
            ?net_sales_source,
            "normalized sales table"
        );

        Ok(Self {
            schema,
            net_sales_source,
            rows,
        })
    }

    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self.rows.iter().map(|t| t.order_date.date());
        Some((dates.clone().min()?, dates.max()?))
    }
}

/// `units × unit_price × (1 − discount_pct / 100)`, missing inputs read as zero.
pub fn computed_net_sales(t: &Transaction) -> f64 {
    let units = t.units.unwrap_or(0.0);
    let price = t.unit_price.unwrap_or(0.0);
    let discount = t.discount_pct.unwrap_or(0.0);
    units * price * (1.0 - discount / 100.0)
}

impl SummaryTable {
    /// Normalizes the daily summary sheet. Undatable rows are skipped; when a date
    /// repeats, the later row replaces the earlier one.
    pub fn from_raw(raw: &RawTable) -> Self {
        let schema = SummarySchema::detect(&raw.headers);
        let num = |row: &[String], col: SummaryColumn| schema.raw(row, col).and_then(coerce_number);

        let mut by_date = BTreeMap::new();
        let mut duplicates: usize = 0;
        for row in &raw.rows {
            let Some(date) = schema
                .raw(row, SummaryColumn::Date)
                .and_then(parse_day_first)
                .map(|dt| dt.date())
            else {
                continue;
            };

            let record = DailySummary {
                net_sales: num(row, SummaryColumn::NetSales),
                avg_ticket: num(row, SummaryColumn::AvgTicket),
                cancel_pct: num(row, SummaryColumn::CancelPct),
                avg_delivery_days: num(row, SummaryColumn::AvgDeliveryDays),
                avg_rating: num(row, SummaryColumn::AvgRating),
                top_channel: schema.text(row, SummaryColumn::TopChannel),
                top_category: schema.text(row, SummaryColumn::TopCategory),
                observation: schema.text(row, SummaryColumn::Observations),
                ..DailySummary::dated(date)
            };
            if by_date.insert(date, record).is_some() {
                duplicates += 1;
            }
        }

        if duplicates > 0 {
            tracing::warn!(duplicates, "summary sheet repeats dates; keeping the last row per date");
        }

        let rows: Vec<DailySummary> = by_date.into_values().collect();
        tracing::info!(rows = rows.len(), "normalized summary table");
        Self { schema, rows }
    }
}
