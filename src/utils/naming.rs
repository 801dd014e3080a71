use crate::models::StorageKey;
use mime::Mime;

/// Content type assumed for file parts that do not declare one (RFC 7578).
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// First extension the IANA/mime-db registry lists for common content types.
/// Anything not listed here falls back to the `mime_guess` database.
const CANONICAL_EXTENSIONS: &[(&str, &str)] = &[
    // Documents
    ("application/pdf", "pdf"),
    ("application/json", "json"),
    ("application/xml", "xml"),
    ("application/rtf", "rtf"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
    ("application/vnd.ms-excel", "xls"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ),
    ("application/vnd.ms-powerpoint", "ppt"),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "pptx",
    ),
    ("text/plain", "txt"),
    ("text/csv", "csv"),
    ("text/html", "html"),
    ("text/css", "css"),
    ("text/markdown", "md"),
    ("application/javascript", "js"),
    // Images
    ("image/jpeg", "jpeg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/bmp", "bmp"),
    ("image/tiff", "tif"),
    ("image/svg+xml", "svg"),
    ("image/avif", "avif"),
    ("image/heic", "heic"),
    ("image/x-icon", "ico"),
    // Audio
    ("audio/mpeg", "mpga"),
    ("audio/mp4", "m4a"),
    ("audio/wav", "wav"),
    ("audio/ogg", "oga"),
    ("audio/webm", "weba"),
    // Video
    ("video/mp4", "mp4"),
    ("video/mpeg", "mpeg"),
    ("video/webm", "webm"),
    ("video/quicktime", "qt"),
    ("video/x-msvideo", "avi"),
    // Archives
    ("application/zip", "zip"),
    ("application/gzip", "gz"),
    ("application/x-tar", "tar"),
    ("application/x-7z-compressed", "7z"),
    ("application/vnd.rar", "rar"),
    ("application/octet-stream", "bin"),
];

/// Maps a declared content type to a file extension without the leading dot.
///
/// Parameters (`; charset=utf-8`) are ignored and matching is case-insensitive.
/// Returns `None` when the type has no known extension.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = match content_type.parse::<Mime>() {
        Ok(mime) => mime.essence_str().to_ascii_lowercase(),
        Err(_) => content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase(),
    };

    if essence.is_empty() {
        return None;
    }

    CANONICAL_EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(&essence).and_then(|exts| exts.first().copied())
        })
}

/// Base name of an uploaded file: everything before the first `.`.
///
/// `my.report.png` yields `my`; a name without a dot is returned whole.
pub fn base_name_from_original(original_name: &str) -> &str {
    original_name
        .split_once('.')
        .map_or(original_name, |(base, _)| base)
}

/// Composes `{directory}/{timestamp_}{base_name}{.extension}`.
pub fn build_storage_key(
    directory: &str,
    timestamp_millis: Option<i64>,
    base_name: &str,
    extension: Option<&str>,
) -> StorageKey {
    let mut key = String::with_capacity(directory.len() + base_name.len() + 24);
    key.push_str(directory);
    key.push('/');
    if let Some(ts) = timestamp_millis {
        key.push_str(&ts.to_string());
        key.push('_');
    }
    key.push_str(base_name);
    if let Some(ext) = extension {
        key.push('.');
        key.push_str(ext);
    }
    StorageKey::new(key)
}

/// External URL of an object.
///
/// AWS regional form unless a custom (path-style) endpoint is configured.
pub fn object_url(region: &str, bucket: &str, endpoint: Option<&str>, key: &StorageKey) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
        None => format!("https://s3.{}.amazonaws.com/{}/{}", region, bucket, key),
    }
}
