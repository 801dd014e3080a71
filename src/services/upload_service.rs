use crate::config::GatewayConfig;
use crate::models::{StorageKey, UploadResult, UploadedFile};
use crate::services::storage::StorageService;
use crate::utils::naming::{
    base_name_from_original, build_storage_key, extension_for_content_type, object_url,
};
use anyhow::{Result, anyhow};
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

pub struct UploadService {
    storage: Arc<dyn StorageService>,
    region: String,
    endpoint: Option<String>,
    clock: Clock,
}

impl UploadService {
    pub fn new(storage: Arc<dyn StorageService>, config: &GatewayConfig) -> Self {
        Self {
            storage,
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
            clock: Arc::new(|| Utc::now().timestamp_millis()),
        }
    }

    /// Replaces the millisecond clock used for single-file keys.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Key for the single-file variant: `{directory}/{millis}_{file_name}{.ext}`.
    pub fn single_file_key(
        &self,
        directory: &str,
        file_name: &str,
        content_type: &str,
    ) -> StorageKey {
        build_storage_key(
            directory,
            Some((self.clock)()),
            file_name,
            extension_for_content_type(content_type),
        )
    }

    /// Key for the batch variant: `{directory}/{original base name}{.ext}`.
    ///
    /// Re-uploading a file with the same name and type overwrites the object.
    pub fn batch_file_key(directory: &str, file: &UploadedFile) -> StorageKey {
        build_storage_key(
            directory,
            None,
            base_name_from_original(&file.original_name),
            extension_for_content_type(&file.content_type),
        )
    }

    /// Uploads one file under a caller-chosen name and returns its public URL.
    pub async fn upload_single(
        &self,
        file: UploadedFile,
        directory: &str,
        file_name: &str,
    ) -> Result<UploadResult> {
        let key = self.single_file_key(directory, file_name, &file.content_type);
        debug!(
            "Uploading '{}' ({} bytes) to {}",
            file.original_name,
            file.bytes.len(),
            key
        );

        let receipt = self
            .storage
            .put_object(&key, file.bytes, &file.content_type)
            .await?;

        let location = object_url(
            &self.region,
            self.storage.bucket(),
            self.endpoint.as_deref(),
            &key,
        );
        info!("✅ Stored {}", key);

        Ok(UploadResult {
            key,
            receipt,
            location,
        })
    }

    /// Uploads every file concurrently and returns the results in input order.
    ///
    /// All puts are joined before returning. If any of them failed the whole
    /// batch fails; objects already written are left in place.
    pub async fn upload_batch(
        &self,
        files: Vec<UploadedFile>,
        directory: &str,
    ) -> Result<Vec<UploadResult>> {
        let count = files.len();
        if count == 0 {
            return Err(anyhow!("batch contains no files"));
        }

        let mut tasks = JoinSet::new();
        for (index, file) in files.into_iter().enumerate() {
            let storage = Arc::clone(&self.storage);
            let key = Self::batch_file_key(directory, &file);
            debug!("Uploading '{}' ({} bytes) to {}", file.original_name, file.bytes.len(), key);

            tasks.spawn(async move {
                let outcome = storage
                    .put_object(&key, file.bytes, &file.content_type)
                    .await;
                (index, key, outcome)
            });
        }

        let mut results: Vec<Option<UploadResult>> = (0..count).map(|_| None).collect();
        let mut first_error = None;
        let mut failures = 0usize;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, key, Ok(receipt))) => {
                    results[index] = Some(UploadResult {
                        location: key.to_string(),
                        key,
                        receipt,
                    });
                }
                Ok((_, key, Err(e))) => {
                    failures += 1;
                    warn!("Upload of {} failed: {:#}", key, e);
                    first_error.get_or_insert(e.context(format!("upload of {} failed", key)));
                }
                Err(e) => {
                    failures += 1;
                    warn!("Upload task failed to complete: {}", e);
                    first_error.get_or_insert_with(|| anyhow!(e));
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e.context(format!("{} of {} uploads failed", failures, count)));
        }

        info!("✅ Stored {} files under '{}/'", count, directory);

        results
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| anyhow!("upload result missing from batch"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PutObjectReceipt;
    use crate::services::storage::MemoryStorageService;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn file(name: &str, content_type: &str) -> UploadedFile {
        UploadedFile {
            original_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: Bytes::from(format!("contents of {}", name)),
        }
    }

    fn config() -> GatewayConfig {
        let mut config = GatewayConfig::development();
        config.region = "eu-west-1".to_string();
        config.endpoint = None;
        config
    }

    /// Fails every key containing `needle`, counting all calls.
    struct FailingStorage {
        inner: MemoryStorageService,
        needle: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StorageService for FailingStorage {
        async fn put_object(
            &self,
            key: &StorageKey,
            body: Bytes,
            content_type: &str,
        ) -> Result<PutObjectReceipt> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if key.as_str().contains(self.needle) {
                return Err(anyhow!("AccessDenied"));
            }
            self.inner.put_object(key, body, content_type).await
        }

        async fn check_bucket(&self) -> Result<()> {
            Ok(())
        }

        fn bucket(&self) -> &str {
            self.inner.bucket()
        }
    }

    #[tokio::test]
    async fn test_single_upload_builds_timestamped_key_and_url() {
        let storage = MemoryStorageService::new("media");
        let service = UploadService::new(Arc::new(storage.clone()), &config())
            .with_clock(|| 1_700_000_000_000);

        let result = service
            .upload_single(file("IMG_0001.JPG", "image/png"), "avatars", "alice")
            .await
            .unwrap();

        assert_eq!(result.key.as_str(), "avatars/1700000000000_alice.png");
        assert_eq!(
            result.location,
            "https://s3.eu-west-1.amazonaws.com/media/avatars/1700000000000_alice.png"
        );
        let stored = storage.get(result.key.as_str()).await.unwrap();
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(stored.body, Bytes::from("contents of IMG_0001.JPG"));
    }

    #[tokio::test]
    async fn test_single_upload_keys_differ_across_timestamps() {
        let storage = Arc::new(MemoryStorageService::new("media"));
        let tick = Arc::new(AtomicUsize::new(0));
        let clock = Arc::clone(&tick);
        let service = UploadService::new(storage.clone(), &config())
            .with_clock(move || 1_000 + clock.fetch_add(1, Ordering::SeqCst) as i64);

        let first = service
            .upload_single(file("a.txt", "text/plain"), "docs", "report")
            .await
            .unwrap();
        let second = service
            .upload_single(file("a.txt", "text/plain"), "docs", "report")
            .await
            .unwrap();

        assert_ne!(first.key, second.key);
        assert_eq!(storage.len().await, 2);
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order() {
        let storage = Arc::new(MemoryStorageService::new("media"));
        let service = UploadService::new(storage.clone(), &config());

        let files = (0..12)
            .map(|i| file(&format!("photo{}.raw", i), "image/webp"))
            .collect();
        let results = service.upload_batch(files, "gallery").await.unwrap();

        let keys: Vec<&str> = results.iter().map(|r| r.location.as_str()).collect();
        let expected: Vec<String> = (0..12).map(|i| format!("gallery/photo{}.webp", i)).collect();
        assert_eq!(keys, expected);
        assert_eq!(storage.len().await, 12);
    }

    #[tokio::test]
    async fn test_batch_reuses_keys_for_identical_files() {
        let storage = Arc::new(MemoryStorageService::new("media"));
        let service = UploadService::new(storage.clone(), &config());

        let first = service
            .upload_batch(vec![file("a.png", "image/png")], "uploads")
            .await
            .unwrap();
        let second = service
            .upload_batch(vec![file("a.png", "image/png")], "uploads")
            .await
            .unwrap();

        assert_eq!(first[0].key, second[0].key);
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_batch_fails_when_one_put_fails_and_joins_siblings() {
        let storage = Arc::new(FailingStorage {
            inner: MemoryStorageService::new("media"),
            needle: "broken",
            calls: AtomicUsize::new(0),
        });
        let service = UploadService::new(storage.clone(), &config());

        let files = vec![
            file("one.png", "image/png"),
            file("broken.png", "image/png"),
            file("three.png", "image/png"),
        ];
        let err = service.upload_batch(files, "uploads").await.unwrap_err();

        assert!(err.to_string().contains("1 of 3 uploads failed"));
        let chain = format!("{:#}", err);
        assert!(chain.contains("upload of uploads/broken.png failed"), "{}", chain);
        assert!(chain.contains("AccessDenied"), "{}", chain);
        assert_eq!(storage.calls.load(Ordering::SeqCst), 3);
        // Siblings ran to completion and are not rolled back
        assert_eq!(
            storage.inner.keys().await,
            vec!["uploads/one.png".to_string(), "uploads/three.png".to_string()]
        );
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let service = UploadService::new(Arc::new(MemoryStorageService::new("media")), &config());
        assert!(service.upload_batch(Vec::new(), "uploads").await.is_err());
    }
}
