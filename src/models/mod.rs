use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;
use validator::Validate;

/// One file part collected from a multipart request, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Form fields of the single-file variant.
#[derive(Debug, Default, Validate)]
pub struct SingleUploadForm {
    #[validate(length(min = 1))]
    pub directory_name: String,
    #[validate(length(min = 1))]
    pub file_name: String,
}

/// Form fields of the batch variant.
#[derive(Debug, Default, Validate)]
pub struct BatchUploadForm {
    #[validate(length(min = 1))]
    pub directory_name: String,
}

/// Path-like identifier of an object in the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider metadata returned by a successful put. Serializes with the S3
/// member names (`ETag`, `VersionId`, ..); absent members are omitted.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct PutObjectReceipt {
    #[serde(rename = "ETag", skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_side_encryption: Option<String>,
    #[serde(rename = "$metadata")]
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub http_status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_request_id: Option<String>,
}

impl Default for ResponseMetadata {
    fn default() -> Self {
        Self {
            http_status_code: 200,
            request_id: None,
            extended_request_id: None,
        }
    }
}

/// Outcome of one successful put: the key, the provider receipt and the
/// location handed back to the caller (full URL or bare key).
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub key: StorageKey,
    pub receipt: PutObjectReceipt,
    pub location: String,
}

/// Put receipt plus the object's public URL, as returned by the single-file
/// upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct StoredObject {
    #[serde(flatten)]
    pub receipt: PutObjectReceipt,
    pub url: String,
}

impl From<UploadResult> for StoredObject {
    fn from(result: UploadResult) -> Self {
        Self {
            receipt: result.receipt,
            url: result.location,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SingleUploadResponse {
    pub message: String,
    pub data: StoredObject,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchUploadResponse {
    pub message: String,
    /// Storage keys, in the order the files were sent
    pub data: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
