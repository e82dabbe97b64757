//! HTTP client for the external RAG API
//!
//! Every call is a single round trip with no retries. The optional API token
//! is sent as a bearer credential on every request.

use crate::config::DashboardConfig;
use crate::types::{FileListResponse, ListFilesParams, UploadIntent};
use crate::{DashError, Result};
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

pub const LIST_PATH: &str = "/api/v1/files/list";
pub const VIEW_PATH: &str = "/api/v1/files/view";
pub const DELETE_PATH: &str = "/api/v1/upload/delete";
pub const EMBEDDING_STATS_PATH: &str = "/api/v1/files/embedding-stats";
pub const VALIDATE_PATH: &str = "/api/v1/file/validate";
pub const UPLOAD_PATH: &str = "/api/v1/upload/direct";

/// Status and JSON body of an upstream reply, kept verbatim for relaying
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: JsonValue,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Client for the RAG API
#[derive(Debug, Clone)]
pub struct RagApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RagApiClient {
    /// Create a client for `base_url`
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(DashError::config("RAG API base URL is empty"));
        }
        // No overall timeout: ingestion of large files can take minutes.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        Self::new(
            config.rag_api_base_url.clone(),
            config.api_auth_token.clone(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of an upstream path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.endpoint(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// List files; the body is returned as sent by the backend
    pub async fn list_files(&self, params: &ListFilesParams) -> Result<JsonValue> {
        debug!("Listing files: {:?}", params);
        let response = self
            .request(Method::GET, LIST_PATH)
            .query(&params.to_query())
            .send()
            .await?;
        json_or_error(response).await
    }

    /// List files, decoded into typed records
    pub async fn list_file_records(&self, params: &ListFilesParams) -> Result<FileListResponse> {
        let body = self.list_files(params).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Open a download. Errors unless the backend answered 2xx, so callers
    /// can decide on the response status before writing anything.
    pub async fn view_file(&self, filename: &str) -> Result<Response> {
        require_filename(filename)?;
        let response = self
            .request(Method::GET, VIEW_PATH)
            .query(&[("filename", filename)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(DashError::upstream(format!(
                "view of '{}' returned {}",
                filename,
                response.status()
            )));
        }
        Ok(response)
    }

    pub async fn delete_file(&self, filename: &str) -> Result<JsonValue> {
        require_filename(filename)?;
        let response = self
            .request(Method::DELETE, DELETE_PATH)
            .query(&[("filename", filename)])
            .send()
            .await?;
        json_or_error(response).await
    }

    pub async fn embedding_stats(&self, filename: &str) -> Result<JsonValue> {
        require_filename(filename)?;
        let response = self
            .request(Method::GET, EMBEDDING_STATS_PATH)
            .query(&[("filename", filename)])
            .send()
            .await?;
        json_or_error(response).await
    }

    /// Validate a file. Error statuses with a JSON body come back as a
    /// reply, not an error, so they can be relayed verbatim.
    pub async fn validate_file(&self, intent: &UploadIntent) -> Result<UpstreamReply> {
        debug!("Validating '{}' ({} bytes)", intent.filename, intent.bytes.len());
        let response = self
            .request(Method::POST, VALIDATE_PATH)
            .multipart(intent.to_multipart()?)
            .send()
            .await?;
        reply(response).await
    }

    /// Upload a file, with the same relaying contract as `validate_file`
    pub async fn upload_file(&self, intent: &UploadIntent) -> Result<UpstreamReply> {
        debug!(
            "Uploading '{}' ({} bytes, replace_existing={})",
            intent.filename,
            intent.bytes.len(),
            intent.replace_existing
        );
        let response = self
            .request(Method::POST, UPLOAD_PATH)
            .multipart(intent.to_multipart()?)
            .send()
            .await?;
        reply(response).await
    }
}

fn require_filename(filename: &str) -> Result<()> {
    if filename.trim().is_empty() {
        return Err(DashError::invalid_input("Filename is required"));
    }
    Ok(())
}

async fn json_or_error(response: Response) -> Result<JsonValue> {
    let status = response.status();
    if !status.is_success() {
        return Err(DashError::upstream(format!(
            "{} returned {}",
            response.url().path(),
            status
        )));
    }
    Ok(response.json().await?)
}

async fn reply(response: Response) -> Result<UpstreamReply> {
    let status = response.status();
    let path = response.url().path().to_string();
    let bytes = response.bytes().await?;
    match serde_json::from_slice::<JsonValue>(&bytes) {
        Ok(body) => Ok(UpstreamReply {
            status: status.as_u16(),
            body,
        }),
        Err(e) => Err(DashError::upstream(format!(
            "{} returned {} with a non-JSON body: {}",
            path, status, e
        ))),
    }
}
