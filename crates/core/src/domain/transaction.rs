use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One row of the `ventas_bazar` sheet after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub order_id: Option<String>,
    pub order_date: NaiveDateTime,
    pub channel: Option<String>,
    pub sku: Option<String>,
    pub product: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub units: Option<f64>,
    pub unit_price: Option<f64>,
    pub discount_pct: Option<f64>,
    pub shipping_cost: Option<f64>,
    pub payment_method: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub customer_type: Option<String>,
    pub status: Option<String>,
    pub delivery_days: Option<f64>,
    pub rating: Option<f64>,
    pub notes: Option<String>,
    pub total_amount: Option<f64>,
    pub net_sales: Option<f64>,
}

impl Transaction {
        pub fn dated(order_date: NaiveDateTime) -> Self {
        Self {
            order_id: None,
            order_date,
            channel: None,
            sku: None,
            product: None,
            category: None,
            subcategory: None,
            units: None,
            unit_price: None,
            discount_pct: None,
            shipping_cost: None,
            payment_method: None,
            province: None,
            city: None,
            customer_type: None,
            status: None,
            delivery_days: None,
            rating: None,
            notes: None,
            total_amount: None,
            net_sales: None,
        }
    }

    pub fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Channel => self.channel.as_deref(),
            Dimension::Category => self.category.as_deref(),
            Dimension::Product => self.product.as_deref(),
            Dimension::Province => self.province.as_deref(),
            Dimension::Status => self.status.as_deref(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.to_lowercase() == "cancelado")
    }
}

/// Categorical columns that rows can be grouped or filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Channel,
    Category,
    Product,
    Province,
    Status,
}

impl Dimension {
    /// Dimensions offered as multi-select filters, in display order.
    pub const FILTERABLE: [Dimension; 4] = [
        Dimension::Channel,
        Dimension::Category,
        Dimension::Province,
        Dimension::Status,
    ];
}
