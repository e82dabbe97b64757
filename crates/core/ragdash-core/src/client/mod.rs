//! Client-side dashboard logic
//!
//! The browser and the terminal client share this model: a [`FileApi`]
//! transport, the [`UploadFlow`] state machine and the [`DashboardController`]
//! holding all interaction state.

pub mod controller;
pub mod flow;
pub mod progress;

pub use controller::{DashboardController, Toast, ToastKind};
pub use flow::{FlowState, UploadFlow};
pub use progress::{Progress, ProgressGuard, ProgressProfile, ProgressTicker};

use crate::types::{
    DeleteResponse, DownloadedFile, FileListResponse, FileStatsResponse, ListFilesParams,
    UploadIntent, UploadResponse, ValidationResult,
};
use crate::Result;
use async_trait::async_trait;

/// Transport used by the client flows.
///
/// Implementations map a non-2xx reply carrying a JSON body to
/// [`DashError::Rejected`](crate::DashError::Rejected) so the backend's
/// message can be shown verbatim.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileApi: Send + Sync {
    async fn list_files(&self, params: &ListFilesParams) -> Result<FileListResponse>;

    async fn validate_file(&self, intent: &UploadIntent) -> Result<ValidationResult>;

    async fn upload_file(&self, intent: &UploadIntent) -> Result<UploadResponse>;

    async fn delete_file(&self, filename: &str) -> Result<DeleteResponse>;

    async fn download_file(&self, filename: &str) -> Result<DownloadedFile>;

    async fn file_stats(&self, filename: &str) -> Result<FileStatsResponse>;
}
