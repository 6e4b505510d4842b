use crate::domain::Dimension;
use crate::pipeline::normalize::{non_empty, normalize_header};
use std::collections::{BTreeMap, HashMap};

pub trait Column: Copy + Ord + 'static {
    const ALL: &'static [Self];

    fn name(self) -> &'static str;

    /// Other headers accepted when the canonical one is absent.
    fn alternates(self) -> &'static [&'static str] {
        &[]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SalesColumn {
    OrderId,
    OrderDate,
    Channel,
    Sku,
    Product,
    Category,
    Subcategory,
    Units,
    UnitPrice,
    DiscountPct,
    ShippingCost,
    PaymentMethod,
    Province,
    City,
    CustomerType,
    Status,
    DeliveryDays,
    Rating,
    Notes,
    TotalAmount,
}

impl Column for SalesColumn {
    const ALL: &'static [Self] = &[
        SalesColumn::OrderId,
        SalesColumn::OrderDate,
        SalesColumn::Channel,
        SalesColumn::Sku,
        SalesColumn::Product,
        SalesColumn::Category,
        SalesColumn::Subcategory,
        SalesColumn::Units,
        SalesColumn::UnitPrice,
        SalesColumn::DiscountPct,
        SalesColumn::ShippingCost,
        SalesColumn::PaymentMethod,
        SalesColumn::Province,
        SalesColumn::City,
        SalesColumn::CustomerType,
        SalesColumn::Status,
        SalesColumn::DeliveryDays,
        SalesColumn::Rating,
        SalesColumn::Notes,
        SalesColumn::TotalAmount,
    ];

    fn name(self) -> &'static str {
        match self {
            SalesColumn::OrderId => "id_pedido",
            SalesColumn::OrderDate => "fecha_pedido",
            SalesColumn::Channel => "canal",
            SalesColumn::Sku => "sku",
            SalesColumn::Product => "producto",
            SalesColumn::Category => "categoria",
            SalesColumn::Subcategory => "subcategoria",
            SalesColumn::Units => "unidades",
            SalesColumn::UnitPrice => "precio_unitario",
            SalesColumn::DiscountPct => "descuento_pct",
            SalesColumn::ShippingCost => "costo_envio",
            SalesColumn::PaymentMethod => "metodo_pago",
            SalesColumn::Province => "provincia_envio",
            SalesColumn::City => "ciudad_envio",
            SalesColumn::CustomerType => "tipo_cliente",
            SalesColumn::Status => "estado_pedido",
            SalesColumn::DeliveryDays => "dias_entrega",
            SalesColumn::Rating => "resena",
            SalesColumn::Notes => "notas_cliente",
            SalesColumn::TotalAmount => "importe_total",
        }
    }

    fn alternates(self) -> &'static [&'static str] {
        match self {
            SalesColumn::Rating => &["reseña"],
            _ => &[],
        }
    }
}

impl From<Dimension> for SalesColumn {
    fn from(d: Dimension) -> Self {
        match d {
            Dimension::Channel => SalesColumn::Channel,
            Dimension::Category => SalesColumn::Category,
            Dimension::Product => SalesColumn::Product,
            Dimension::Province => SalesColumn::Province,
            Dimension::Status => SalesColumn::Status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SummaryColumn {
    Date,
    NetSales,
    AvgTicket,
    CancelPct,
    AvgDeliveryDays,
    AvgRating,
    TopChannel,
    TopCategory,
    Observations,
}

impl Column for SummaryColumn {
    const ALL: &'static [Self] = &[
        SummaryColumn::Date,
        SummaryColumn::NetSales,
        SummaryColumn::AvgTicket,
        SummaryColumn::CancelPct,
        SummaryColumn::AvgDeliveryDays,
        SummaryColumn::AvgRating,
        SummaryColumn::TopChannel,
        SummaryColumn::TopCategory,
        SummaryColumn::Observations,
    ];

    fn name(self) -> &'static str {
        match self {
            SummaryColumn::Date => "fecha_analizada",
            SummaryColumn::NetSales => "ventas_netas_dia",
            SummaryColumn::AvgTicket => "ticket_promedio_dia",
            SummaryColumn::CancelPct => "pct_cancelados_dia",
            SummaryColumn::AvgDeliveryDays => "entrega_promedio_dias",
            SummaryColumn::AvgRating => "rating_promedio",
            SummaryColumn::TopChannel => "canal_top",
            SummaryColumn::TopCategory => "categoria_top",
            SummaryColumn::Observations => "observaciones",
        }
    }

    fn alternates(self) -> &'static [&'static str] {
        match self {
            SummaryColumn::TopChannel => &["canal_superior"],
            SummaryColumn::TopCategory => &["categoria_superior"],
            _ => &[],
        }
    }
}

/// Which known columns a sheet actually has, and where. Built once per fetched table;
/// everything downstream asks it instead of probing headers again.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema<C: Column> {
    index: BTreeMap<C, usize>,
}

pub type SalesSchema = Schema<SalesColumn>;
pub type SummarySchema = Schema<SummaryColumn>;

impl<C: Column> Schema<C> {
    pub fn detect(headers: &[String]) -> Self {
        let mut by_name = HashMap::<String, usize>::new();
        for (idx, header) in headers.iter().enumerate() {
            by_name.entry(normalize_header(header)).or_insert(idx);
        }

        let mut index = BTreeMap::new();
        for &col in C::ALL {
            let found = std::iter::once(col.name())
                .chain(col.alternates().iter().copied())
                .find_map(|name| by_name.get(&normalize_header(name)).copied());
            if let Some(idx) = found {
                index.insert(col, idx);
            }
        }

        Self { index }
    }

    pub fn has(&self, col: C) -> bool {
        self.index.contains_key(&col)
    }

    /// Raw text of `col` in `row`, `None` when the column is absent or the cell empty.
    pub fn text(&self, row: &[String], col: C) -> Option<String> {
        let idx = *self.index.get(&col)?;
        row.get(idx).and_then(|cell| non_empty(cell))
    }

    pub fn raw<'r>(&self, row: &'r [String], col: C) -> Option<&'r str> {
        let idx = *self.index.get(&col)?;
        row.get(idx).map(String::as_str)
    }
}

impl SalesSchema {
    pub fn has_dimension(&self, d: Dimension) -> bool {
        self.has(SalesColumn::from(d))
    }
}
