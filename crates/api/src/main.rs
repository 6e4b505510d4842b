use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bazar_core::error::DashboardError;
use bazar_core::export::{export_csv, EXPORT_FILE_NAME};
use bazar_core::ingest::GoogleSheetsSource;
use bazar_core::pipeline::filter::{self, FilterOptions};
use bazar_core::report::{DashboardReport, DashboardRequest};
use bazar_core::service::Dashboard;

mod query;

use query::{DashboardQuery, OptionsQuery};

type ApiError = (StatusCode, String);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = bazar_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let source = GoogleSheetsSource::from_settings(&settings)?;
    let dashboard = match Dashboard::from_settings(source, &settings) {
        Ok(d) => d,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "cannot start without a sheet to read");
            return Err(e);
        }
    };

    let state = AppState {
        dashboard: Arc::new(dashboard),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/options", get(get_options))
        .route("/dashboard", get(get_dashboard).post(post_dashboard))
        .route("/export.csv", post(post_export))
        .route("/refresh", post(post_refresh))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    dashboard: Arc<Dashboard<GoogleSheetsSource>>,
}

async fn get_options(
    State(state): State<AppState>,
    Query(query): Query<OptionsQuery>,
) -> Result<Json<FilterOptions>, ApiError> {
    let dataset = state.dashboard.load().await.map_err(into_api_error)?;
    let options = filter::filter_options(&dataset.sales, &query.into_filters())
        .ok_or((StatusCode::NOT_FOUND, "no dated sales rows".to_string()))?;
    Ok(Json(options))
}

async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardReport>, ApiError> {
    build_report(&state, &query.into_request()).await
}

async fn post_dashboard(
    State(state): State<AppState>,
    Json(request): Json<DashboardRequest>,
) -> Result<Json<DashboardReport>, ApiError> {
    build_report(&state, &request).await
}

async fn build_report(
    state: &AppState,
    request: &DashboardRequest,
) -> Result<Json<DashboardReport>, ApiError> {
    let dataset = state.dashboard.load().await.map_err(into_api_error)?;
    Ok(Json(DashboardReport::build(&dataset, request)))
}

async fn post_export(
    State(state): State<AppState>,
    Json(request): Json<DashboardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let dataset = state.dashboard.load().await.map_err(into_api_error)?;
    let rows = filter::apply(&dataset.sales, &request.filters);
    let body = export_csv(&rows, &dataset.sales.schema).map_err(into_api_error)?;

    tracing::info!(snapshot_id = %dataset.snapshot_id, rows = rows.len(), "csv export");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        body,
    ))
}

async fn post_refresh(State(state): State<AppState>) -> StatusCode {
    state.dashboard.refresh().await;
    tracing::info!("sheet cache invalidated");
    StatusCode::NO_CONTENT
}

fn into_api_error(e: anyhow::Error) -> ApiError {
    let status = match e.downcast_ref::<DashboardError>() {
        Some(err) if err.is_upstream() => StatusCode::BAD_GATEWAY,
        Some(DashboardError::MissingColumn { .. } | DashboardError::EmptyDataset { .. }) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Some(DashboardError::InvalidCsv(_)) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    sentry_anyhow::capture_anyhow(&e);
    tracing::error!(error = %e, status = status.as_u16(), "dashboard request failed");

    let message = match e.downcast_ref::<DashboardError>() {
        Some(err) => err.to_string(),
        None => format!("{e:#}"),
    };
    (status, message)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
