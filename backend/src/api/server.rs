//! HTTP Server for the kpiboard API.
//!
//! Each upload runs the full metrics pipeline on its own bytes; nothing is
//! kept between requests.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/upload`     | Upload CSV, get metrics              |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, log_success, LOG_BROADCASTER};
use super::types::{error_response, ReportResponse};
use crate::config::Settings;
use crate::error::{CsvError, PipelineError, ServerError, ServerResult};
use crate::metrics::period::Granularity;
use crate::metrics::pipeline::{analyze_bytes, ReportOptions};

type Rejection = (StatusCode, Json<Value>);

/// Optional query parameters of `/api/upload`.
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    pub granularity: Option<String>,
    pub top: Option<String>,
}

/// Build the application router.
pub fn router(settings: Settings) -> Router {
    // Permissive CORS so any dashboard frontend can call the API
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let body_limit = settings.max_upload_bytes;

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload_csv))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(settings)
}

/// Start the HTTP server and serve until Ctrl-C.
pub async fn start_server(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let app = router(settings.clone());

    println!("🚀 kpiboard server running on http://localhost:{}", settings.port);
    println!("   POST /api/upload - Upload CSV file (field 'file')");
    println!("   GET  /api/logs   - SSE log stream");
    println!("   GET  /health     - Health check");
    println!();
    println!(
        "📝 Defaults: {} series, top {} customers, max upload {} bytes",
        settings.granularity, settings.top_customers, settings.max_upload_bytes
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        log_info("Shutting down");
    }
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "kpiboard",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers just skip what they missed.
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload CSV endpoint
async fn upload_csv(
    State(settings): State<Settings>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<Json<ReportResponse>, Rejection> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut granularity = params.granularity;
    let mut top = params.top;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        let status = e.status();
        reject_with(status, ServerError::BadRequest(format!("Multipart error: {}", e)))
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                let bytes = field.bytes().await.map_err(|e| {
                    let status = e.status();
                    reject_with(status, ServerError::BadRequest(format!("Read error: {}", e)))
                })?;
                file_data = Some(bytes.to_vec());
            }
            "granularity" | "top" => {
                let text = field.text().await.map_err(|e| {
                    reject(ServerError::BadRequest(format!("Read error: {}", e)))
                })?;
                if name == "granularity" {
                    granularity = Some(text);
                } else {
                    top = Some(text);
                }
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| reject(ServerError::BadRequest("No file provided".into())))?;
    let options = resolve_options(&settings, granularity.as_deref(), top.as_deref()).map_err(reject)?;

    log_info(format!(
        "📄 New upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    let report = analyze_bytes(&bytes, &options).map_err(|e| {
        log_error(format!("Upload rejected: {}", e));
        reject(ServerError::from(e))
    })?;

    log_success(format!(
        "Report ready: {} records, total sales {}",
        report.metrics.record_count, report.metrics.total_sales
    ));

    Ok(Json(ReportResponse::from(report)))
}

/// Merge request overrides into the configured defaults.
pub fn resolve_options(
    settings: &Settings,
    granularity: Option<&str>,
    top: Option<&str>,
) -> ServerResult<ReportOptions> {
    let mut options = settings.report_options();

    if let Some(raw) = granularity.filter(|s| !s.trim().is_empty()) {
        options.granularity = raw.parse::<Granularity>().map_err(ServerError::BadRequest)?;
    }
    if let Some(raw) = top.filter(|s| !s.trim().is_empty()) {
        options.top_customers = raw
            .trim()
            .parse()
            .map_err(|_| ServerError::BadRequest(format!("'top' must be a non-negative integer, got '{}'", raw)))?;
    }

    Ok(options)
}

/// HTTP status for a server error.
pub fn status_for(err: &ServerError) -> StatusCode {
    match err {
        ServerError::Pipeline(PipelineError::Csv(CsvError::Io(_))) => StatusCode::INTERNAL_SERVER_ERROR,
        ServerError::Pipeline(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
    }
}

fn reject(err: ServerError) -> Rejection {
    let status = status_for(&err);
    reject_with(status, err)
}

fn reject_with(status: StatusCode, err: ServerError) -> Rejection {
    (status, Json(error_response(&err)))
}
