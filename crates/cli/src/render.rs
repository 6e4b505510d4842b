use bazar_core::format::{money, pct};
use bazar_core::pipeline::aggregate::GroupTotal;
use bazar_core::report::DashboardReport;
use std::fmt::Write;

const LIST_LIMIT: usize = 5;

/// Plain-text summary of a report for the terminal.
pub fn text(report: &DashboardReport) -> String {
    let mut out = String::new();
    let k = &report.kpis;

    let _ = writeln!(
        out,
        "Ventas {} .. {}  ({} filas, snapshot {})",
        report.range.start, report.range.end, report.rows, report.snapshot_id
    );
    let _ = writeln!(out, "  ventas netas     {}", money(Some(k.total_net_sales)));
    let _ = writeln!(out, "  pedidos          {}", k.orders);
    let _ = writeln!(out, "  ticket promedio  {}", money(Some(k.average_ticket)));
    let _ = writeln!(out, "  cancelados       {}", pct(Some(k.cancellation_rate)));
    let _ = writeln!(out, "  entrega (dias)   {:.1}", k.avg_delivery_days);
    let _ = writeln!(out, "  rating           {:.2}", k.avg_rating);

    section(&mut out, "canales", report.by_channel.as_deref());
    section(&mut out, "categorias", report.by_category.as_deref());
    section(&mut out, "productos", report.top_products.as_deref());

    if let Some(alerts) = &report.alerts {
        if !alerts.is_empty() {
            let _ = writeln!(out, "alertas");
            for a in alerts {
                let _ = writeln!(out, "  {}  {}", a.date, a.observation);
            }
        }
    }

    for o in &report.omitted {
        let _ = writeln!(out, "(sin {}: falta la columna {})", o.section, o.column);
    }
    out
}

fn section(out: &mut String, title: &str, groups: Option<&[GroupTotal]>) {
    let Some(groups) = groups.filter(|g| !g.is_empty()) else {
        return;
    };
    let _ = writeln!(out, "{title}");
    for g in groups.iter().take(LIST_LIMIT) {
        let _ = writeln!(out, "  {:<24} {}", g.label, money(Some(g.net_sales)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazar_core::ingest::RawTable;
    use bazar_core::pipeline::Dataset;
    use bazar_core::report::DashboardRequest;

    #[test]
    fn renders_kpis_groups_and_omissions() {
        let dataset = Dataset::from_raw(
            &RawTable::from_csv(
                "fecha_pedido,canal,importe_total\n01/03/2025,Web,1500\n02/03/2025,Local,500\n",
            )
            .unwrap(),
            &RawTable::from_csv("fecha_analizada,observaciones\n02/03/2025,Stock bajo\n").unwrap(),
        )
        .unwrap();
        let report = DashboardReport::build(&dataset, &DashboardRequest::default());
        let text = text(&report);

        assert!(text.contains("ventas netas     $2.000"));
        assert!(text.contains("Web"));
        assert!(text.contains("2025-03-02  Stock bajo"));
        assert!(text.contains("(sin ratings: falta la columna resena)"));
    }
}
