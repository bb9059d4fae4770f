//! HTTP API surface.
//!
//! Thin endpoint layer over the [`QueryEngine`]: routing, parameter
//! binding, and response envelope shaping. All retrieval decisions live in
//! the core.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/v1/devices/{deviceId}/data/{date}` | All readings for a device on a date |
//! | `GET` | `/v1/devices/{deviceId}/data/{date}/{sensorType}` | Readings for one sensor |
//! | `GET` | `/health` | Health check (returns version) |
//!
//! # Response Contract
//!
//! Success is a bare JSON array of readings:
//!
//! ```json
//! [{"EventDateTime": "2019-01-10T00:00:00", "SensorValue": 12.5}]
//! ```
//!
//! Failure is `{"status": ..., "errorMsg": ...}` with status `"Data Not
//! Found"` (HTTP 404) or `"Failed"` (HTTP 500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the API is read-only
//! and unauthenticated.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::error::QueryError;
use crate::query::QueryEngine;
use crate::storage::S3Store;

/// JSON failure envelope. Field names are part of the wire contract.
#[derive(Serialize)]
struct ErrorBody {
    status: String,
    #[serde(rename = "errorMsg")]
    error_msg: String,
}

/// Query failures mapped onto HTTP responses.
struct ApiError(QueryError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (http_status, status, message) = match self.0 {
            QueryError::NotFound(msg) => (StatusCode::NOT_FOUND, "Data Not Found", msg),
            QueryError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed", msg),
        };
        let body = ErrorBody {
            status: status.to_string(),
            error_msg: message,
        };
        (http_status, Json(body)).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError(err)
    }
}

/// Builds the API router over a query engine. Split out from
/// [`run_server`] so tests can drive the router in-process.
pub fn router(engine: QueryEngine) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1/devices/{device_id}/data/{date}", get(handle_device_data))
        .route(
            "/v1/devices/{device_id}/data/{date}/{sensor_type}",
            get(handle_sensor_data),
        )
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(engine)
}

/// Starts the HTTP server on the configured bind address, backed by the
/// S3-compatible store from `[storage]`. Runs until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = S3Store::new(config.storage.clone())?;
    let engine = QueryEngine::new(Arc::new(store));
    let app = router(engine);

    info!(bind = %config.server.bind, bucket = %config.storage.bucket, "starting API server");

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Handler for `GET /v1/devices/{deviceId}/data/{date}/{sensorType}`.
async fn handle_sensor_data(
    State(engine): State<QueryEngine>,
    Path((device_id, date, sensor_type)): Path<(String, String, String)>,
) -> Result<Json<Vec<crate::models::SensorReading>>, ApiError> {
    let readings = engine.get_sensor_data(&device_id, &sensor_type, &date).await?;
    Ok(Json(readings))
}

/// Handler for `GET /v1/devices/{deviceId}/data/{date}`.
async fn handle_device_data(
    State(engine): State<QueryEngine>,
    Path((device_id, date)): Path<(String, String)>,
) -> Result<Json<Vec<crate::models::SensorReading>>, ApiError> {
    let readings = engine.get_device_data(&device_id, &date).await?;
    Ok(Json(readings))
}

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
