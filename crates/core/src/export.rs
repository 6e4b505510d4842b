use crate::domain::Transaction;
use crate::pipeline::schema::{Column, SalesColumn, SalesSchema};
use anyhow::Context;
use chrono::Timelike;

pub const EXPORT_FILE_NAME: &str = "casanova_ventas_filtrado.csv";

/// Column order of the download. `ventas_netas` is derived and always present; the rest
/// appear only when the source sheet has them.
const EXPORT_COLUMNS: &[ExportColumn] = &[
    ExportColumn::Source(SalesColumn::OrderId),
    ExportColumn::Source(SalesColumn::OrderDate),
    ExportColumn::Source(SalesColumn::Channel),
    ExportColumn::Source(SalesColumn::Sku),
    ExportColumn::Source(SalesColumn::Product),
    ExportColumn::Source(SalesColumn::Category),
    ExportColumn::Source(SalesColumn::Subcategory),
    ExportColumn::Source(SalesColumn::Units),
    ExportColumn::Source(SalesColumn::UnitPrice),
    ExportColumn::Source(SalesColumn::DiscountPct),
    ExportColumn::NetSales,
    ExportColumn::Source(SalesColumn::ShippingCost),
    ExportColumn::Source(SalesColumn::PaymentMethod),
    ExportColumn::Source(SalesColumn::Province),
    ExportColumn::Source(SalesColumn::City),
    ExportColumn::Source(SalesColumn::CustomerType),
    ExportColumn::Source(SalesColumn::Status),
    ExportColumn::Source(SalesColumn::DeliveryDays),
    ExportColumn::Source(SalesColumn::Rating),
    ExportColumn::Source(SalesColumn::Notes),
];

#[derive(Debug, Clone, Copy)]
enum ExportColumn {
    Source(SalesColumn),
    NetSales,
}

impl ExportColumn {
    fn header(self) -> &'static str {
        match self {
            ExportColumn::Source(c) => c.name(),
            ExportColumn::NetSales => "ventas_netas",
        }
    }

    fn cell(self, t: &Transaction) -> String {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let num = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
        match self {
            ExportColumn::NetSales => num(t.net_sales),
            ExportColumn::Source(c) => match c {
                SalesColumn::OrderId => text(&t.order_id),
                SalesColumn::OrderDate => {
                    if t.order_date.num_seconds_from_midnight() == 0 {
                        t.order_date.format("%Y-%m-%d").to_string()
                    } else {
                        t.order_date.format("%Y-%m-%d %H:%M:%S").to_string()
                    }
                }
                SalesColumn::Channel => text(&t.channel),
                SalesColumn::Sku => text(&t.sku),
                SalesColumn::Product => text(&t.product),
                SalesColumn::Category => text(&t.category),
                SalesColumn::Subcategory => text(&t.subcategory),
                SalesColumn::Units => num(t.units),
                SalesColumn::UnitPrice => num(t.unit_price),
                SalesColumn::DiscountPct => num(t.discount_pct),
                SalesColumn::ShippingCost => num(t.shipping_cost),
                SalesColumn::PaymentMethod => text(&t.payment_method),
                SalesColumn::Province => text(&t.province),
                SalesColumn::City => text(&t.city),
                SalesColumn::CustomerType => text(&t.customer_type),
                SalesColumn::Status => text(&t.status),
                SalesColumn::DeliveryDays => num(t.delivery_days),
                SalesColumn::Rating => num(t.rating),
                SalesColumn::Notes => text(&t.notes),
                SalesColumn::TotalAmount => num(t.total_amount),
            },
        }
    }

    fn present(self, schema: &SalesSchema) -> bool {
        match self {
            ExportColumn::Source(c) => schema.has(c),
            ExportColumn::NetSales => true,
        }
    }
}

pub fn export_csv(rows: &[&Transaction], schema: &SalesSchema) -> anyhow::Result<Vec<u8>> {
    let columns: Vec<ExportColumn> = EXPORT_COLUMNS
        .iter()
        .copied()
        .filter(|c| c.present(schema))
        .collect();

    let mut sorted: Vec<&Transaction> = rows.to_vec();
    sorted.sort_by(|a, b| b.order_date.cmp(&a.order_date));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(columns.iter().map(|c| c.header()))
        .context("failed to write CSV header")?;
    for t in sorted {
        writer
            .write_record(columns.iter().map(|c| c.cell(t)))
            .context("failed to write CSV row")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV export: {}", e.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::RawTable;
    use crate::pipeline::tables::SalesTable;

    #[test]
    fn exports_present_columns_in_fixed_order() {
        let raw = RawTable::from_csv(
            "Notas Cliente,Canal,Fecha Pedido,Unidades,Precio Unitario,Metodo Pago\n\
             \"Llegó rápido, gracias\",Web,01/03/2025,2,\"10,5\",Débito\n\
             ,Local,03/03/2025 18:45,1,100,Efectivo\n",
        )
        .unwrap();
        let table = SalesTable::from_raw(&raw).unwrap();
        let rows: Vec<&Transaction> = table.rows.iter().collect();

        let bytes = export_csv(&rows, &table.schema).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "fecha_pedido,canal,unidades,precio_unitario,ventas_netas,metodo_pago,notas_cliente"
        );
        assert_eq!(lines[1], "2025-03-03 18:45:00,Local,1,100,100,Efectivo,");
        assert_eq!(lines[2], "2025-03-01,Web,2,10.5,21,Débito,\"Llegó rápido, gracias\"");
    }
}
