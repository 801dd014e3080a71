use crate::AppState;
use crate::api::error::AppError;
use crate::models::{
    BatchUploadForm, BatchUploadResponse, SingleUploadForm, SingleUploadResponse, UploadedFile,
};
use crate::utils::naming::DEFAULT_CONTENT_TYPE;
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use std::collections::HashMap;
use validator::Validate;

pub const SINGLE_FILE_FIELD: &str = "file";
pub const BATCH_FILES_FIELD: &str = "files";

const SINGLE_REQUIRED_MESSAGE: &str = "File, directoryName, and fileName are required";
const BATCH_REQUIRED_MESSAGE: &str = "Files and directoryName are required";

/// File parts and text fields of one multipart request.
#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    fn field(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::Internal(format!("Malformed multipart body: {}", err.body_text()))
    }
}

/// Buffers the whole request. Parts carrying a filename are files and must
/// arrive under `file_field`, at most `max_files` of them; every other part is
/// a text field. A file part outside those rules aborts the request with a
/// generic 500.
async fn collect_form(
    multipart: &mut Multipart,
    file_field: &str,
    max_files: usize,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_string) {
            Some(original_name) => {
                if name != file_field || form.files.len() >= max_files {
                    return Err(AppError::Internal(format!("Unexpected field: {}", name)));
                }
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;

                form.files.push(UploadedFile {
                    original_name,
                    content_type,
                    bytes,
                });
            }
            None => {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}

/// Reads the form, or an empty one when the body is not multipart at all.
async fn read_upload_form(
    multipart: Result<Multipart, MultipartRejection>,
    file_field: &str,
    max_files: usize,
) -> Result<UploadForm, AppError> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::debug!("Request is not multipart: {}", rejection.body_text());
            return Ok(UploadForm::default());
        }
    };

    match collect_form(&mut multipart, file_field, max_files).await {
        Ok(form) => Ok(form),
        Err(e) => {
            // Drain what is left so the client sees our response instead of a reset connection
            tracing::warn!("Upload rejected early: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(
        content = String,
        description = "Multipart form: `file` (one file), `directoryName`, `fileName`",
        content_type = "multipart/form-data"
    ),
    responses(
        (status = 200, description = "File stored", body = SingleUploadResponse),
        (status = 400, description = "Missing file, directoryName or fileName", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 500, description = "Storage backend failure or unexpected file part", body = ErrorResponse)
    ),
    tag = "upload"
)]
pub async fn upload_single_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SingleUploadResponse>, AppError> {
    let mut form = read_upload_form(multipart, SINGLE_FILE_FIELD, 1).await?;

    let fields = SingleUploadForm {
        directory_name: form.field("directoryName"),
        file_name: form.field("fileName"),
    };
    let (Some(file), Ok(())) = (form.files.pop(), fields.validate()) else {
        return Err(AppError::BadRequest(SINGLE_REQUIRED_MESSAGE.to_string()));
    };

    let result = state
        .upload_service
        .upload_single(file, &fields.directory_name, &fields.file_name)
        .await
        .map_err(AppError::Storage)?;

    Ok(Json(SingleUploadResponse {
        message: "File uploaded successfully".to_string(),
        data: result.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(
        content = String,
        description = "Multipart form: up to 30 `files`, `directoryName`",
        content_type = "multipart/form-data"
    ),
    responses(
        (status = 200, description = "All files stored; keys in upload order", body = BatchUploadResponse),
        (status = 400, description = "Missing files or directoryName", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 500, description = "At least one upload failed, or unexpected/too many file parts", body = ErrorResponse)
    ),
    tag = "upload"
)]
pub async fn upload_files(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BatchUploadResponse>, AppError> {
    let form = read_upload_form(multipart, BATCH_FILES_FIELD, state.config.max_batch_files).await?;

    let fields = BatchUploadForm {
        directory_name: form.field("directoryName"),
    };
    if form.files.is_empty() || fields.validate().is_err() {
        return Err(AppError::BadRequest(BATCH_REQUIRED_MESSAGE.to_string()));
    }

    let results = state
        .upload_service
        .upload_batch(form.files, &fields.directory_name)
        .await
        .map_err(AppError::Storage)?;

    Ok(Json(BatchUploadResponse {
        message: "Files uploaded successfully".to_string(),
        data: results.into_iter().map(|r| r.location).collect(),
    }))
}
