use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::application::{HostError, HostService, Snapshot};
use crate::ports::HostRecord;

/// Error type that renders as `{"status": "error", "msg": ...}`
#[derive(Debug)]
pub struct AppError(HostError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            HostError::InvalidAddress(_) | HostError::LimitReached(_) => StatusCode::BAD_REQUEST,
            HostError::Store(e) => {
                error!(error = %e, "host list operation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({"status": "error", "msg": self.0.to_string()}))).into_response()
    }
}

impl From<HostError> for AppError {
    fn from(err: HostError) -> Self {
        AppError(err)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub host_service: Arc<HostService>,
}

/// Body for POST /api/hosts
#[derive(Debug, Deserialize)]
pub struct AddHostRequest {
    #[serde(default)]
    pub ip: String,
    pub name: Option<String>,
    pub group: Option<String>,
}

fn ok() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// Handler for GET /api/health
pub async fn health_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "pingmon"
        })),
    )
}

/// Handler for GET /api/data
pub async fn data_handler(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.host_service.registry().snapshot())
}

/// Handler for GET /api/hosts
pub async fn list_hosts_handler(State(state): State<AppState>) -> Result<Json<Vec<HostRecord>>, AppError> {
    Ok(Json(state.host_service.list_hosts().await?))
}

/// Handler for POST /api/hosts
pub async fn add_host_handler(
    State(state): State<AppState>,
    Json(request): Json<AddHostRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .host_service
        .add_host(&request.ip, request.name.as_deref(), request.group)
        .await?;
    Ok(ok())
}

/// Handler for DELETE /api/hosts/{ip}
pub async fn remove_host_handler(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.host_service.remove_host(&ip).await?;
    Ok(ok())
}
