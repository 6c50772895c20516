use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
}

/// Health check endpoint handler.
///
/// Always returns 200 while the process is running; wire this to liveness
/// probes.
pub async fn health_handler() -> Response {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Readiness check endpoint handler.
///
/// Services with external dependencies should expose their own readiness
/// route that actually probes those dependencies; this default reports ready.
pub async fn ready_handler() -> Response {
    (StatusCode::OK, Json(ReadyResponse { ready: true })).into_response()
}
