use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bazar_core::domain::Dimension;
use bazar_core::export::export_csv;
use bazar_core::ingest::GoogleSheetsSource;
use bazar_core::pipeline::daily::TrendSource;
use bazar_core::pipeline::{filter, Filters};
use bazar_core::report::{DashboardReport, DashboardRequest};
use bazar_core::service::Dashboard;

mod render;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TrendArg {
    Live,
    Summary,
}

impl From<TrendArg> for TrendSource {
    fn from(arg: TrendArg) -> Self {
        match arg {
            TrendArg::Live => TrendSource::Live,
            TrendArg::Summary => TrendSource::Summary,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "bazar_cli")]
struct Args {
    /// First order day to include (YYYY-MM-DD). Defaults to the earliest order.
    #[arg(long)]
    start: Option<String>,

    /// Last order day to include (YYYY-MM-DD). Defaults to the latest order.
    #[arg(long)]
    end: Option<String>,

    /// Keep only these channels. Repeatable.
    #[arg(long = "channel")]
    channels: Vec<String>,

    #[arg(long = "category")]
    categories: Vec<String>,

    #[arg(long = "province")]
    provinces: Vec<String>,

    #[arg(long = "status")]
    statuses: Vec<String>,

    /// Where the daily trend comes from.
    #[arg(long, value_enum, default_value = "summary")]
    trend: TrendArg,

    /// Print the full report as JSON instead of the text summary.
    #[arg(long)]
    json: bool,

    /// Write the filtered rows as CSV to this path.
    #[arg(long)]
    export: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = bazar_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let request = build_request(&args)?;

    let source = GoogleSheetsSource::from_settings(&settings)?;
    let dashboard = Dashboard::from_settings(source, &settings)?;

    let dataset = match dashboard.load().await {
        Ok(d) => d,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "dashboard refresh failed");
            return Err(err);
        }
    };

    if let Some(path) = &args.export {
        let rows = filter::apply(&dataset.sales, &request.filters);
        let bytes = export_csv(&rows, &dataset.sales.schema)?;
        std::fs::write(path, bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), rows = rows.len(), "wrote csv export");
    }

    let report = DashboardReport::build(&dataset, &request);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::text(&report));
    }

    Ok(())
}

fn build_request(args: &Args) -> anyhow::Result<DashboardRequest> {
    let mut filters = Filters {
        start: args.start.as_deref().map(parse_date).transpose()?,
        end: args.end.as_deref().map(parse_date).transpose()?,
        ..Default::default()
    };
    let lists = [
        (Dimension::Channel, &args.channels),
        (Dimension::Category, &args.categories),
        (Dimension::Province, &args.provinces),
        (Dimension::Status, &args.statuses),
    ];
    for (dimension, values) in lists {
        if !values.is_empty() {
            filters = filters.with_dimension(dimension, values.iter().cloned());
        }
    }

    Ok(DashboardRequest {
        filters,
        trend: args.trend.into(),
    })
}

fn parse_date(s: &str) -> anyhow::Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date `{s}`, expected YYYY-MM-DD"))
}

fn init_sentry(settings: &bazar_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_flags_become_allow_lists() {
        let args = Args::parse_from([
            "bazar_cli",
            "--start",
            "2025-03-01",
            "--channel",
            "Web",
            "--channel",
            "Local",
            "--trend",
            "live",
        ]);
        let req = build_request(&args).unwrap();

        assert_eq!(req.trend, TrendSource::Live);
        assert_eq!(req.filters.start, chrono::NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(req.filters.end, None);
        assert_eq!(req.filters.dimensions[&Dimension::Channel].len(), 2);
        assert!(!req.filters.dimensions.contains_key(&Dimension::Status));
    }

    #[test]
    fn rejects_day_first_dates_on_the_command_line() {
        let args = Args::parse_from(["bazar_cli", "--end", "31/03/2025"]);
        assert!(build_request(&args).is_err());
    }
}
