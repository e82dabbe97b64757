//! JSON API handlers proxying to the RAG API

use crate::extract::{ApiMultipart, ApiQuery, PAYLOAD_TOO_LARGE};
use crate::state::WebState;
use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures_util::TryStreamExt;
use ragdash_core::types::{split_tag_list, ListFilesQuery, UploadIntent};
use ragdash_core::DashError;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

const LIST_FAILED: &str = "Failed to fetch files";
const DOWNLOAD_FAILED: &str = "Failed to download file";
const DELETE_FAILED: &str = "Failed to delete file";
const STATS_FAILED: &str = "Failed to load file statistics";
const VALIDATE_FAILED: &str = "Failed to validate file";
const UPLOAD_FAILED: &str = "Failed to upload file";

/// API error types
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    PayloadTooLarge(String),
    Internal(String),
    /// Upstream status and JSON body passed through unchanged
    Relayed {
        status: StatusCode,
        body: serde_json::Value,
    },
}

impl ApiError {
    /// Map a core error onto a response. Upstream details are logged here
    /// and replaced by `fallback` for the client.
    pub fn from_dash(err: DashError, fallback: &str) -> Self {
        match err {
            DashError::InvalidInput(msg) => ApiError::BadRequest(msg),
            DashError::Auth(msg) => ApiError::Unauthorized(msg),
            DashError::Rejected { status, body, .. } => ApiError::Relayed {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                body,
            },
            other => {
                error!("{}: {}", fallback, other);
                ApiError::Internal(fallback.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Relayed { status, body } => return (status, Json(body)).into_response(),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": message,
            "code": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FilenameQuery {
    pub filename: Option<String>,
}

impl FilenameQuery {
    fn require(self) -> Result<String, ApiError> {
        self.filename
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("Filename is required".to_string()))
    }
}

/// Liveness check; needs no session
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "status": "ok",
    }))
}

/// `GET /api/files`
pub async fn list_files(
    State(state): State<WebState>,
    ApiQuery(query): ApiQuery<ListFilesQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let params = query.into_params();
    state
        .rag
        .list_files(&params)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_dash(e, LIST_FAILED))
}

/// `GET /api/files/download?filename=`
///
/// The upstream status is checked before anything is written, so a missing
/// file yields a clean JSON error. After that the body is streamed; a stream
/// error can only cut the body short.
pub async fn download_file(
    State(state): State<WebState>,
    ApiQuery(query): ApiQuery<FilenameQuery>,
) -> Result<Response, ApiError> {
    let filename = query.require()?;
    let upstream = state
        .rag
        .view_file(&filename)
        .await
        .map_err(|e| ApiError::from_dash(e, DOWNLOAD_FAILED))?;

    let mut headers = HeaderMap::new();
    for name in [
        header::CONTENT_TYPE,
        header::CONTENT_DISPOSITION,
        header::CONTENT_LENGTH,
    ] {
        if let Some(value) = upstream.headers().get(&name) {
            headers.insert(name, value.clone());
        }
    }
    if !headers.contains_key(header::CONTENT_DISPOSITION) {
        if let Ok(value) = HeaderValue::from_str(&attachment_disposition(&filename)) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }

    info!("Streaming download of '{}'", filename);
    let stream = upstream
        .bytes_stream()
        .inspect_err(move |e| error!("Download of '{}' interrupted: {}", filename, e));

    let mut response = Response::new(Body::from_stream(stream));
    *response.headers_mut() = headers;
    Ok(response)
}

fn attachment_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

/// `DELETE /api/files/delete?filename=`
pub async fn delete_file(
    State(state): State<WebState>,
    ApiQuery(query): ApiQuery<FilenameQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let filename = query.require()?;
    delete(&state, &filename).await
}

/// `DELETE /api/files/:filename`
pub async fn delete_file_by_path(
    State(state): State<WebState>,
    Path(filename): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    delete(&state, &filename).await
}

async fn delete(state: &WebState, filename: &str) -> Result<Json<serde_json::Value>, ApiError> {
    info!("Deleting '{}'", filename);
    state
        .rag
        .delete_file(filename)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_dash(e, DELETE_FAILED))
}

/// `GET /api/files/stats?filename=`
pub async fn file_stats(
    State(state): State<WebState>,
    ApiQuery(query): ApiQuery<FilenameQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let filename = query.require()?;
    state
        .rag
        .embedding_stats(&filename)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_dash(e, STATS_FAILED))
}

/// `POST /api/files/validate`
pub async fn validate_file(
    State(state): State<WebState>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<Response, ApiError> {
    let intent = read_upload(multipart).await?;
    let reply = state
        .rag
        .validate_file(&intent)
        .await
        .map_err(|e| ApiError::from_dash(e, VALIDATE_FAILED))?;

    if !reply.is_success() {
        warn!("Validation of '{}' rejected ({})", intent.filename, reply.status);
    }
    Ok(relay(reply.status, reply.body))
}

/// `POST /api/files/upload`
pub async fn upload_file(
    State(state): State<WebState>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<Response, ApiError> {
    let intent = read_upload(multipart).await?;
    let reply = state
        .rag
        .upload_file(&intent)
        .await
        .map_err(|e| ApiError::from_dash(e, UPLOAD_FAILED))?;

    if reply.is_success() {
        info!("Uploaded '{}'", intent.filename);
    } else {
        warn!("Upload of '{}' rejected ({})", intent.filename, reply.status);
    }
    Ok(relay(reply.status, reply.body))
}

fn relay(status: u16, body: serde_json::Value) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(body)).into_response()
}

/// A body cut off by the size limit is a 413, anything else a 400
fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(PAYLOAD_TOO_LARGE.to_string())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Collect the browser's multipart form into an upload intent. The `file`
/// part is required; `tags` and `replace_existing` are parsed; any other
/// text field is forwarded unchanged.
async fn read_upload(mut multipart: Multipart) -> Result<UploadIntent, ApiError> {
    let mut file: Option<(String, Option<String>, bytes::Bytes)> = None;
    let mut tags = Vec::new();
    let mut replace_existing = false;
    let mut metadata = BTreeMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(multipart_error)?;
            if !filename.is_empty() {
                file = Some((filename, content_type, data));
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(multipart_error)?;
        match name.as_str() {
            "tags" => tags = split_tag_list(&value),
            "replace_existing" => replace_existing = value.trim().eq_ignore_ascii_case("true"),
            "" => {}
            _ => {
                metadata.insert(name, value);
            }
        }
    }

    let (filename, content_type, data) =
        file.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;
    debug!("Received '{}' ({} bytes)", filename, data.len());

    let mut intent = UploadIntent::new(filename, data)
        .with_tags(tags)
        .with_replace_existing(replace_existing);
    if let Some(content_type) = content_type {
        intent = intent.with_content_type(content_type);
    }
    intent.metadata = metadata;
    Ok(intent)
}
