use crate::config::GatewayConfig;
use crate::services::storage::{S3StorageService, StorageService};
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{Credentials, Region};
use std::sync::Arc;
use tracing::{info, warn};

/// Builds the S3 client from `config`. SDK retries are disabled: every put is
/// a single attempt.
pub async fn setup_storage(config: &GatewayConfig) -> Arc<S3StorageService> {
    match &config.endpoint {
        Some(endpoint) => info!("☁️  S3 Storage: {} (Bucket: {})", endpoint, config.bucket),
        None => info!(
            "☁️  S3 Storage: AWS {} (Bucket: {})",
            config.region, config.bucket
        ),
    }

    let mut loader = aws_config::from_env()
        .region(Region::new(config.region.clone()))
        .credentials_provider(Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "static",
        ));
    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.endpoint.is_some())
        .retry_config(RetryConfig::disabled())
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);
    let storage = Arc::new(S3StorageService::new(s3_client, config.bucket.clone()));

    match storage.check_bucket().await {
        Ok(()) => info!("✅ Bucket '{}' is reachable", config.bucket),
        Err(e) => warn!(
            "⚠️  Bucket '{}' is not reachable yet, uploads will fail until it is: {:#}",
            config.bucket, e
        ),
    }

    storage
}
