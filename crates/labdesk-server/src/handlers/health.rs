use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use labdesk_api::{ApiError, ApiResult};
use serde::Serialize;
use serde_json::json;

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "service": "LabDesk",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": state.storage.backend_name(),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz(State(state): State<AppState>) -> ApiResult<Json<HealthResponse<'static>>> {
    match state.storage.ping().await {
        Ok(()) => Ok(Json(HealthResponse { status: "ready" })),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            Err(ApiError::service_unavailable("Storage unavailable"))
        }
    }
}
