use crate::AppState;
use crate::config::UploadVariant;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub bucket: String,
    #[schema(value_type = String)]
    pub variant: UploadVariant,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage_status = match state.storage.check_bucket().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!("Storage health probe failed: {:#}", e);
            "unreachable"
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        storage: storage_status.to_string(),
        bucket: state.storage.bucket().to_string(),
        variant: state.config.variant,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
