pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::{GatewayConfig, UploadVariant};
use crate::services::storage::StorageService;
use crate::services::upload_service::UploadService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upload::upload_single_file,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::SingleUploadResponse,
            models::StoredObject,
            models::PutObjectReceipt,
            models::ResponseMetadata,
            models::ErrorResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "upload", description = "Single-file upload to object storage"),
        (name = "system", description = "Service status")
    )
)]
pub struct SingleApiDoc;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upload::upload_files,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::BatchUploadResponse,
            models::ErrorResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "upload", description = "Batch upload to object storage"),
        (name = "system", description = "Service status")
    )
)]
pub struct BatchApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageService>,
    pub upload_service: Arc<UploadService>,
    pub config: GatewayConfig,
}

impl AppState {
    pub fn new(storage: Arc<dyn StorageService>, config: GatewayConfig) -> Self {
        let upload_service = Arc::new(UploadService::new(storage.clone(), &config));
        Self {
            storage,
            upload_service,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let upload = match state.config.variant {
        UploadVariant::Single => post(api::handlers::upload::upload_single_file),
        UploadVariant::Batch => post(api::handlers::upload::upload_files),
    };

    Router::new()
        .route("/health", get(api::handlers::health::health_check))
        .route("/api-docs/openapi.json", get(api::handlers::docs::openapi_json))
        .route("/upload", upload)
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
