use crate::AppState;
use crate::config::UploadVariant;
use crate::{BatchApiDoc, SingleApiDoc};
use axum::{Json, extract::State};
use utoipa::OpenApi;

/// OpenAPI document for the upload variant this instance serves.
pub async fn openapi_json(State(state): State<AppState>) -> Json<utoipa::openapi::OpenApi> {
    let doc = match state.config.variant {
        UploadVariant::Single => SingleApiDoc::openapi(),
        UploadVariant::Batch => BatchApiDoc::openapi(),
    };
    Json(doc)
}
