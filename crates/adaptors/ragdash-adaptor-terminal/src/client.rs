//! HTTP transport to a running dashboard
//!
//! Talks to the dashboard's `/api/files` endpoints with the same session
//! cookie a browser would hold.

use async_trait::async_trait;
use ragdash_core::types::{
    DeleteResponse, DownloadedFile, FileListResponse, FileStatsResponse, ListFilesParams,
    UploadIntent, UploadResponse, ValidationResult,
};
use ragdash_core::{DashError, FileApi, Result};
use regex::Regex;
use reqwest::{header, redirect::Policy, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info};

const NOT_LOGGED_IN: &str = "Not logged in to the dashboard";

/// Dashboard API client holding an admin session cookie
#[derive(Debug, Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: String,
}

impl DashboardClient {
    /// Create a client for the dashboard at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(DashError::config("Dashboard URL is empty"));
        }

        // Redirects are inspected, not followed: a redirect to /login means
        // the session is gone.
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Sign in with the admin credentials; the session cookie is kept for
    /// every later call
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let response = self
            .request(Method::POST, "/login")
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if response.status().is_redirection() && location == "/dashboard" {
            info!("Logged in to {}", self.base_url);
            return Ok(());
        }
        Err(DashError::auth("Invalid username or password"))
    }

    pub async fn logout(&self) -> Result<()> {
        self.request(Method::POST, "/logout").send().await?;
        Ok(())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        fallback: &str,
    ) -> Result<T> {
        let response = builder.send().await?;
        decode(response, fallback).await
    }
}

/// Decode a dashboard JSON reply. Non-2xx replies with a JSON body become
/// [`DashError::Rejected`] carrying the backend's message.
async fn decode<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T> {
    let status = response.status();
    if status.is_redirection() {
        return Err(DashError::auth(NOT_LOGGED_IN));
    }

    let bytes = response.bytes().await?;
    let body: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
        DashError::upstream(format!("{} ({}): response was not JSON: {}", fallback, status, e))
    })?;

    if status == StatusCode::UNAUTHORIZED {
        let message = body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or(NOT_LOGGED_IN);
        return Err(DashError::auth(message));
    }
    if !status.is_success() {
        return Err(DashError::rejected(status.as_u16(), body, fallback));
    }
    Ok(serde_json::from_value(body)?)
}

fn disposition_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"filename="(.+)""#).ok())
        .as_ref()
}

/// Saved filename from a `Content-Disposition` header
pub fn disposition_filename(header: &str) -> Option<String> {
    disposition_pattern()?
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[async_trait]
impl FileApi for DashboardClient {
    async fn list_files(&self, params: &ListFilesParams) -> Result<FileListResponse> {
        debug!("Listing files: {:?}", params);
        self.send_json(
            self.request(Method::GET, "/api/files")
                .query(&params.to_query()),
            "Failed to fetch files",
        )
        .await
    }

    async fn validate_file(&self, intent: &UploadIntent) -> Result<ValidationResult> {
        self.send_json(
            self.request(Method::POST, "/api/files/validate")
                .multipart(intent.to_multipart()?),
            "Failed to validate file",
        )
        .await
    }

    async fn upload_file(&self, intent: &UploadIntent) -> Result<UploadResponse> {
        self.send_json(
            self.request(Method::POST, "/api/files/upload")
                .multipart(intent.to_multipart()?),
            "Failed to upload file",
        )
        .await
    }

    async fn delete_file(&self, filename: &str) -> Result<DeleteResponse> {
        self.send_json(
            self.request(Method::DELETE, "/api/files/delete")
                .query(&[("filename", filename)]),
            "Failed to delete file",
        )
        .await
    }

    async fn download_file(&self, filename: &str) -> Result<DownloadedFile> {
        let response = self
            .request(Method::GET, "/api/files/download")
            .query(&[("filename", filename)])
            .send()
            .await?;

        if !response.status().is_success() {
            // Error replies carry the usual JSON envelope
            return Err(decode::<serde_json::Value>(response, "Failed to download file")
                .await
                .err()
                .unwrap_or_else(|| DashError::upstream("Failed to download file")));
        }

        let headers = response.headers();
        let saved_name = headers
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_filename)
            .unwrap_or_else(|| filename.to_string());
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await?;
        debug!("Downloaded '{}' ({} bytes)", saved_name, bytes.len());
        Ok(DownloadedFile {
            filename: saved_name,
            content_type,
            bytes,
        })
    }

    async fn file_stats(&self, filename: &str) -> Result<FileStatsResponse> {
        self.send_json(
            self.request(Method::GET, "/api/files/stats")
                .query(&[("filename", filename)]),
            "Failed to load file statistics",
        )
        .await
    }
}
