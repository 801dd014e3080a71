use crate::models::{PutObjectReceipt, ResponseMetadata, StorageKey};
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::operation::{RequestId, RequestIdExt};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Stores `body` under `key`. Exactly one provider call, never retried.
    async fn put_object(
        &self,
        key: &StorageKey,
        body: Bytes,
        content_type: &str,
    ) -> Result<PutObjectReceipt>;

    /// Checks that the configured bucket is reachable.
    async fn check_bucket(&self) -> Result<()>;

    fn bucket(&self) -> &str;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn put_object(
        &self,
        key: &StorageKey,
        body: Bytes,
        content_type: &str,
    ) -> Result<PutObjectReceipt> {
        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .with_context(|| format!("put_object s3://{}/{}", self.bucket, key))?;

        Ok(PutObjectReceipt {
            e_tag: output.e_tag().map(str::to_string),
            version_id: output.version_id().map(str::to_string),
            server_side_encryption: output
                .server_side_encryption()
                .map(|sse| sse.as_str().to_string()),
            metadata: ResponseMetadata {
                // The SDK only returns an output for a 2xx response
                http_status_code: 200,
                request_id: output.request_id().map(str::to_string),
                extended_request_id: output.extended_request_id().map(str::to_string),
            },
        })
    }

    async fn check_bucket(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .with_context(|| format!("head_bucket {}", self.bucket))?;
        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Object store kept in process memory. Used for local runs and tests.
#[derive(Clone, Default)]
pub struct MemoryStorageService {
    bucket: String,
    objects: Arc<RwLock<HashMap<String, StoredObjectData>>>,
}

#[derive(Debug, Clone)]
pub struct StoredObjectData {
    pub body: Bytes,
    pub content_type: String,
}

impl MemoryStorageService {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<StoredObjectData> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl StorageService for MemoryStorageService {
    async fn put_object(
        &self,
        key: &StorageKey,
        body: Bytes,
        content_type: &str,
    ) -> Result<PutObjectReceipt> {
        self.objects.write().await.insert(
            key.to_string(),
            StoredObjectData {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(PutObjectReceipt {
            e_tag: Some(format!("\"{}\"", Uuid::new_v4().simple())),
            metadata: ResponseMetadata {
                request_id: Some(Uuid::new_v4().to_string()),
                ..ResponseMetadata::default()
            },
            ..PutObjectReceipt::default()
        })
    }

    async fn check_bucket(&self) -> Result<()> {
        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
