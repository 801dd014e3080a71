use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Which `POST /upload` behavior the gateway mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UploadVariant {
    /// One file under `file`, caller-chosen name, timestamped key, full URL in the response.
    Single,
    /// Many files under `files`, name taken from the upload, bare keys in the response.
    Batch,
}

impl fmt::Display for UploadVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadVariant::Single => f.write_str("single"),
            UploadVariant::Batch => f.write_str("batch"),
        }
    }
}

impl FromStr for UploadVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(UploadVariant::Single),
            "batch" => Ok(UploadVariant::Batch),
            other => Err(format!("unknown upload variant '{}'", other)),
        }
    }
}

/// Gateway configuration, read once at startup
#[derive(Clone)]
pub struct GatewayConfig {
    /// Bucket region (AWS_REGION)
    pub region: String,

    /// Static access key (AWS_ACCESS_KEY_ID)
    pub access_key_id: String,

    /// Static secret key (AWS_SECRET_ACCESS_KEY)
    pub secret_access_key: String,

    /// Target bucket (AWS_BUCKET_NAME)
    pub bucket: String,

    /// Optional S3-compatible endpoint such as MinIO (S3_ENDPOINT)
    pub endpoint: Option<String>,

    /// Bind address (default: 0.0.0.0)
    pub host: IpAddr,

    /// Listening port (default: 4000)
    pub port: u16,

    /// Upload behavior mounted at /upload (default: single)
    pub variant: UploadVariant,

    /// Maximum number of files in one batch request (default: 30)
    pub max_batch_files: usize,

    /// Maximum request body size in bytes (default: 256 MB)
    pub max_body_size: usize,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("region", &self.region)
            .field("access_key_id", &"***")
            .field("secret_access_key", &"***")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("variant", &self.variant)
            .field("max_batch_files", &self.max_batch_files)
            .field("max_body_size", &self.max_body_size)
            .finish()
    }
}

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_MAX_BATCH_FILES: usize = 30;
pub const DEFAULT_MAX_BODY_SIZE: usize = 256 * 1024 * 1024; // 256 MB

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{} must be set", key))
        };

        let host = match lookup("HOST") {
            Some(v) => v
                .parse::<IpAddr>()
                .with_context(|| format!("HOST is not a valid IP address: {}", v))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let port = match lookup("PORT") {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("PORT must be a number: {}", v))?,
            None => DEFAULT_PORT,
        };

        let variant = match lookup("UPLOAD_VARIANT") {
            Some(v) => v.parse::<UploadVariant>().map_err(|e| anyhow!(e))?,
            None => UploadVariant::Single,
        };

        Ok(Self {
            region: required("AWS_REGION")?,
            access_key_id: required("AWS_ACCESS_KEY_ID")?,
            secret_access_key: required("AWS_SECRET_ACCESS_KEY")?,
            bucket: required("AWS_BUCKET_NAME")?,
            endpoint: lookup("S3_ENDPOINT")
                .map(|v| v.trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),
            host,
            port,
            variant,
            max_batch_files: lookup("MAX_BATCH_FILES")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_BATCH_FILES),
            max_body_size: lookup("MAX_BODY_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),
        })
    }

    /// Config for local runs and tests against MinIO
    pub fn development() -> Self {
        Self {
            region: "us-east-1".to_string(),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            bucket: "uploads".to_string(),
            endpoint: Some("http://127.0.0.1:9000".to_string()),
            host: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
            variant: UploadVariant::Single,
            max_batch_files: DEFAULT_MAX_BATCH_FILES,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
