#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::{Router, body::Body, http::Request};
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use upload_gateway::config::{GatewayConfig, UploadVariant};
use upload_gateway::models::{PutObjectReceipt, StorageKey};
use upload_gateway::services::storage::{MemoryStorageService, StorageService};
use upload_gateway::{AppState, create_app};

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        field: &'a str,
        filename: &'a str,
        content_type: Option<&'a str>,
        body: &'a [u8],
    },
}

pub fn file<'a>(field: &'a str, filename: &'a str, content_type: &'a str, body: &'a [u8]) -> Part<'a> {
    Part::File {
        field,
        filename,
        content_type: Some(content_type),
        body,
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                        name, value
                    )
                    .as_bytes(),
                );
            }
            Part::File {
                field,
                filename,
                content_type,
                body: contents,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        field, filename
                    )
                    .as_bytes(),
                );
                if let Some(ct) = content_type {
                    body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
                }
                body.extend_from_slice(b"\r\n");
                body.extend_from_slice(contents);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn test_config(variant: UploadVariant) -> GatewayConfig {
    let mut config = GatewayConfig::development();
    config.region = "us-east-1".to_string();
    config.bucket = "test-bucket".to_string();
    config.endpoint = None;
    config.variant = variant;
    config
}

pub fn app_with(storage: Arc<dyn StorageService>, config: GatewayConfig) -> Router {
    create_app(AppState::new(storage, config))
}

pub async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body)
        .unwrap_or_else(|_| panic!("not JSON: {:?}", String::from_utf8_lossy(&body)))
}

/// Storage that fails every key containing `needle` after an optional delay,
/// and delegates the rest to memory.
pub struct FlakyStorage {
    pub inner: MemoryStorageService,
    pub needle: String,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl FlakyStorage {
    pub fn new(needle: &str) -> Self {
        Self {
            inner: MemoryStorageService::new("test-bucket"),
            needle: needle.to_string(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageService for FlakyStorage {
    async fn put_object(
        &self,
        key: &StorageKey,
        body: Bytes,
        content_type: &str,
    ) -> Result<PutObjectReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if key.as_str().contains(&self.needle) {
            return Err(anyhow!("InternalError: We encountered an internal error"));
        }
        tokio::time::sleep(self.delay).await;
        self.inner.put_object(key, body, content_type).await
    }

    async fn check_bucket(&self) -> Result<()> {
        Err(anyhow!("NoSuchBucket"))
    }

    fn bucket(&self) -> &str {
        self.inner.bucket()
    }
}
