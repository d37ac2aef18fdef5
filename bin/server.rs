// Climate Views - Web Server
// Serves the derived chart datasets as JSON to the browser charts

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use climate_views::{
    curve_chart, derive_view, heatmap, load_dataset, map_frame, small_multiples, time_series,
    ChartConfig, DataQualityEngine, Dataset, Observation, Scenario, ViewState,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    dataset: Arc<Dataset>,
    observations: Arc<Vec<Observation>>,
}

impl AppState {
    fn new(observations: Vec<Observation>, dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
            observations: Arc::new(observations),
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn not_found(message: String) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        }),
    )
        .into_response()
}

#[derive(Debug, Default, Deserialize)]
struct HeatmapQuery {
    scenario: Option<Scenario>,
}

#[derive(Debug, Deserialize)]
struct SeriesQuery {
    #[serde(default = "default_series_region")]
    region: String,
    #[serde(default = "default_metric")]
    metric: String,
}

#[derive(Debug, Deserialize)]
struct ViewQuery {
    year: Option<i32>,
    #[serde(default = "default_series_region")]
    region: String,
    #[serde(default = "default_metric")]
    metric: String,
    selected: Option<String>,
}

fn default_series_region() -> String {
    "US".to_string()
}

fn default_metric() -> String {
    "anomaly".to_string()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// GET /api/anomalies - Baselines and per-observation anomalies
async fn get_anomalies(State(state): State<AppState>) -> Response {
    ApiResponse::ok(&state.dataset.anomalies)
}

/// GET /api/small-multiples - One anomaly panel per region
async fn get_small_multiples(State(state): State<AppState>) -> Response {
    let dataset = &state.dataset;
    ApiResponse::ok(small_multiples(&dataset.anomalies, &dataset.config))
}

/// GET /api/heatmap?scenario= - Region × year heatmap
async fn get_heatmap(
    State(state): State<AppState>,
    Query(query): Query<HeatmapQuery>,
) -> Response {
    ApiResponse::ok(heatmap(
        &state.observations,
        query.scenario,
        &state.dataset.config,
    ))
}

/// GET /api/curves - All regional warming curves with threshold lines
async fn get_curves(State(state): State<AppState>) -> Response {
    let dataset = &state.dataset;
    ApiResponse::ok(curve_chart(&dataset.curves, &dataset.config))
}

/// GET /api/curves/:region - One curve by name, slug or alias
async fn get_region_curve(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> Response {
    let dataset = &state.dataset;
    match dataset
        .canonical_region(&region)
        .and_then(|name| dataset.curves.get(name))
    {
        Some(curve) => ApiResponse::ok(curve),
        None => not_found(format!("Unknown region: {}", region)),
    }
}

/// GET /api/grid - Warming grid at 2100
async fn get_grid(State(state): State<AppState>) -> Response {
    ApiResponse::ok(state.dataset.grid.cells())
}

/// GET /api/frame/:year - Map colours for one year
async fn get_frame(State(state): State<AppState>, Path(year): Path<i32>) -> Response {
    match map_frame(&state.dataset, year) {
        Some(frame) => ApiResponse::ok(frame),
        None => not_found(format!("Year {} is outside the map range 2025-2100", year)),
    }
}

/// GET /api/view - Everything the page needs for one UI state
async fn get_view(State(state): State<AppState>, Query(query): Query<ViewQuery>) -> Response {
    let mut view_state = ViewState::default()
        .with_region(&query.region)
        .with_metric(&query.metric)
        .with_selection(query.selected.as_deref());
    if let Some(year) = query.year {
        view_state = view_state.with_year(year);
    }

    ApiResponse::ok(derive_view(&state.dataset, &view_state))
}

/// GET /api/series?region=&metric= - One time-series line
async fn get_series(State(state): State<AppState>, Query(query): Query<SeriesQuery>) -> Response {
    let dataset = &state.dataset;
    ApiResponse::ok(time_series(
        &dataset.series,
        &query.region,
        &query.metric,
        &dataset.config,
    ))
}

// ============================================================================
// Router
// ============================================================================

fn build_router(state: AppState, web_dir: PathBuf) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/anomalies", get(get_anomalies))
        .route("/small-multiples", get(get_small_multiples))
        .route("/heatmap", get(get_heatmap))
        .route("/curves", get(get_curves))
        .route("/curves/:region", get(get_region_curve))
        .route("/grid", get(get_grid))
        .route("/frame/:year", get(get_frame))
        .route("/view", get(get_view))
        .route("/series", get(get_series))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(web_dir))
        .layer(CorsLayer::permissive())
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key).map(PathBuf::from)
}

fn load_state() -> Result<AppState> {
    let config = ChartConfig::load_or_default(env_path("CLIMATE_CONFIG").as_deref())?;

    let observations = match env_path("CLIMATE_OBSERVATIONS") {
        Some(path) => {
            let rows = load_dataset(&path)?.into_observations()?;
            let (accepted, summary) = DataQualityEngine::new(config.baseline).partition(rows);
            println!("✓ {}: {}", path.display(), summary.summary());
            accepted
        }
        None => {
            println!("⚠️  CLIMATE_OBSERVATIONS not set, anomaly charts will be empty");
            Vec::new()
        }
    };

    let series = match env_path("CLIMATE_SERIES") {
        Some(path) => {
            let records = load_dataset(&path)?.into_time_series()?;
            println!("✓ {}: {} time-series rows", path.display(), records.len());
            records
        }
        None => Vec::new(),
    };

    let dataset = Dataset::new(&observations, series, config);
    Ok(AppState::new(observations, dataset))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    climate_views::init_logging("info,tower_http=warn");

    println!("🌐 Climate Views - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let state = load_state()?;
    let web_dir = env_path("CLIMATE_WEB_DIR").unwrap_or_else(|| PathBuf::from("web"));
    let app = build_router(state, web_dir);

    let addr = std::env::var("CLIMATE_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/view?year=2100", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
