//! Dashboard interaction state
//!
//! One controller owns everything a dashboard session mutates: the active
//! filters, the tag selection, the loaded files, the pending delete and the
//! upload flow. Every interaction borrows it mutably, so two flows can never
//! run at once.

use super::flow::{FlowState, UploadFlow};
use super::FileApi;
use crate::render::{DashboardView, FileStatsView};
use crate::types::{
    parse_tag_input, DownloadedFile, FileRecord, ListFilesParams, SearchFilter, UploadIntent,
    MAX_SELECTED_TAGS, SEARCH_PAGE_SIZE,
};
use crate::{DashError, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    /// How long the toast stays up
    pub fn display_duration(&self) -> Duration {
        match self {
            ToastKind::Error => Duration::from_secs(5),
            _ => Duration::from_secs(3),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ToastKind::Success => "Success",
            ToastKind::Error => "Error",
            ToastKind::Warning => "Warning",
            ToastKind::Info => "Info",
        }
    }
}

/// A transient notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Warning, message)
    }

    pub fn duration(&self) -> Duration {
        self.kind.display_duration()
    }
}

pub struct DashboardController<A: FileApi> {
    api: Arc<A>,
    filter: SearchFilter,
    selected_tags: Vec<String>,
    all_tags: Vec<String>,
    files: Vec<FileRecord>,
    load_error: Option<String>,
    pending_delete: Option<String>,
    flow: UploadFlow<A>,
    toasts: Vec<Toast>,
}

impl<A: FileApi> DashboardController<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            flow: UploadFlow::new(api.clone()),
            api,
            filter: SearchFilter::default(),
            selected_tags: Vec::new(),
            all_tags: Vec::new(),
            files: Vec::new(),
            load_error: None,
            pending_delete: None,
            toasts: Vec::new(),
        }
    }

    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    pub fn selected_tags(&self) -> &[String] {
        &self.selected_tags
    }

    pub fn all_tags(&self) -> &[String] {
        &self.all_tags
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    pub fn flow(&self) -> &UploadFlow<A> {
        &self.flow
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Hand over queued toasts for display
    pub fn take_toasts(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    fn toast(&mut self, toast: Toast) {
        debug!("Toast {:?}: {}", toast.kind, toast.message);
        self.toasts.push(toast);
    }

    /// Current file grid
    pub fn view(&self) -> DashboardView {
        let mut view = DashboardView::build(&self.files, &self.filter, self.load_error.clone());
        if !self.all_tags.is_empty() {
            view.available_tags = self.all_tags.clone();
        }
        view
    }

    /// Collect the tag vocabulary from the default listing. Failures leave
    /// the vocabulary empty.
    pub async fn load_tags(&mut self) {
        match self.api.list_files(&ListFilesParams::default()).await {
            Ok(list) if list.success => self.all_tags = list.all_tags(),
            Ok(_) => debug!("Tag listing reported failure"),
            Err(e) => debug!("Error loading tags: {}", e),
        }
    }

    /// Replace the tag selection, keeping at most ten unique tags
    pub fn select_tags(&mut self, tags: Vec<String>) -> &[String] {
        let mut selected: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.trim().to_string();
            if !tag.is_empty() && !selected.contains(&tag) {
                selected.push(tag);
            }
        }
        if selected.len() > MAX_SELECTED_TAGS {
            selected.truncate(MAX_SELECTED_TAGS);
            self.toast(Toast::warning(format!(
                "You can select up to {} tags",
                MAX_SELECTED_TAGS
            )));
        }
        self.selected_tags = selected;
        &self.selected_tags
    }

    /// Add tags typed as free text, split on commas and spaces
    pub fn add_tag_input(&mut self, input: &str) -> &[String] {
        let mut tags = self.selected_tags.clone();
        tags.extend(parse_tag_input(input));
        self.select_tags(tags)
    }

    /// Apply a query together with the current tag selection
    pub async fn search(&mut self, query: &str) -> Result<()> {
        self.filter = SearchFilter::new(query, self.selected_tags.clone());
        self.refresh().await
    }

    /// Re-fetch files for the active filters
    pub async fn refresh(&mut self) -> Result<()> {
        let params = ListFilesParams::from_filter(&self.filter, SEARCH_PAGE_SIZE);
        match self.api.list_files(&params).await {
            Ok(list) if list.success => {
                self.files = list.files;
                self.load_error = None;
                Ok(())
            }
            Ok(list) => {
                let message = list.error.unwrap_or_else(|| "Failed to load files".to_string());
                self.files.clear();
                self.load_error = Some(message.clone());
                self.toast(Toast::error(message.clone()));
                Err(DashError::upstream(message))
            }
            Err(e) => {
                error!("Error loading files: {}", e);
                self.load_error = Some("Failed to load files".to_string());
                self.toast(Toast::error("Failed to load files"));
                Err(e)
            }
        }
    }

    /// Full reload after a mutation: tag vocabulary and files
    pub async fn reload(&mut self) -> Result<()> {
        self.load_tags().await;
        self.refresh().await
    }

    pub async fn remove_query_filter(&mut self) -> Result<()> {
        self.filter.query.clear();
        self.after_filter_removed().await
    }

    pub async fn remove_tag_filter(&mut self, tag: &str) -> Result<()> {
        self.filter.remove_tag(tag);
        self.selected_tags.retain(|t| t != tag);
        self.after_filter_removed().await
    }

    async fn after_filter_removed(&mut self) -> Result<()> {
        if self.filter.is_empty() {
            self.clear_filters().await
        } else {
            self.refresh().await
        }
    }

    pub async fn clear_filters(&mut self) -> Result<()> {
        self.filter = SearchFilter::default();
        self.selected_tags.clear();
        self.reload().await
    }

    /// First step of a delete: remember what to delete
    pub fn request_delete(&mut self, filename: &str) {
        self.pending_delete = Some(filename.to_string());
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the file remembered by [`request_delete`](Self::request_delete)
    pub async fn confirm_delete(&mut self) -> Result<()> {
        let filename = self
            .pending_delete
            .take()
            .ok_or_else(|| DashError::flow("No file selected for deletion"))?;

        match self.api.delete_file(&filename).await {
            Ok(response) if response.success => {
                self.toast(Toast::success(format!(
                    "File \"{}\" deleted successfully",
                    filename
                )));
                self.reload().await
            }
            Ok(response) => {
                let message = response
                    .error
                    .unwrap_or_else(|| "Failed to delete file".to_string());
                self.toast(Toast::error(message.clone()));
                Err(DashError::upstream(message))
            }
            Err(e) => {
                self.toast(Toast::error(message_or(&e, "Failed to delete file")));
                Err(e)
            }
        }
    }

    pub async fn download(&mut self, filename: &str) -> Result<DownloadedFile> {
        match self.api.download_file(filename).await {
            Ok(file) => {
                self.toast(Toast::success("File downloaded successfully"));
                Ok(file)
            }
            Err(e) => {
                self.toast(Toast::error(format!(
                    "Failed to download file: {}",
                    e.user_message()
                )));
                Err(e)
            }
        }
    }

    pub async fn file_stats(&mut self, filename: &str) -> Result<FileStatsView> {
        const FALLBACK: &str = "Failed to load file statistics";
        match self.api.file_stats(filename).await {
            Ok(response) if response.success => {
                Ok(FileStatsView::from_response(&response, filename))
            }
            Ok(response) => {
                let message = response.error.unwrap_or_else(|| FALLBACK.to_string());
                self.toast(Toast::error(message.clone()));
                Err(DashError::upstream(message))
            }
            Err(e) => {
                self.toast(Toast::error(message_or(&e, FALLBACK)));
                Err(e)
            }
        }
    }

    /// Validate and upload; see [`UploadFlow::submit`]
    pub async fn upload(&mut self, intent: UploadIntent) -> Result<FlowState> {
        let state = self.flow.submit(intent).await?;
        self.settle(state).await
    }

    pub async fn confirm_upload(&mut self) -> Result<FlowState> {
        let state = self.flow.confirm().await?;
        self.settle(state).await
    }

    pub fn cancel_upload(&mut self) -> Result<()> {
        self.flow.cancel()
    }

    /// Start over with a new file
    pub fn select_file(&mut self) -> Result<()> {
        self.flow.select_file()
    }

    /// Replace a listed file; see [`UploadFlow::replace`]
    pub async fn replace(&mut self, filename: &str, intent: UploadIntent) -> Result<FlowState> {
        let original = self
            .files
            .iter()
            .find(|f| f.name == filename)
            .cloned()
            .unwrap_or_else(|| FileRecord {
                name: filename.to_string(),
                ..Default::default()
            });
        let state = self.flow.replace(&original, intent).await?;
        self.settle(state).await
    }

    /// Toast the outcome of a flow step and reload after success
    async fn settle(&mut self, state: FlowState) -> Result<FlowState> {
        match &state {
            FlowState::Done { message, .. } => {
                self.toast(Toast::success(message.clone()));
                // The upload succeeded; a failed reload is reported by its own toast.
                let _ = self.reload().await;
            }
            FlowState::Failed { message, .. } => self.toast(Toast::error(message.clone())),
            FlowState::Rejected { error, suggestion } => {
                let text = match suggestion {
                    Some(s) => format!("File validation failed: {} ({})", error, s),
                    None => format!("File validation failed: {}", error),
                };
                self.toast(Toast::error(text));
            }
            FlowState::NeedsConfirmation { warnings, .. } => {
                for warning in warnings {
                    self.toast(Toast::warning(warning.describe()));
                }
            }
            _ => {}
        }
        Ok(state)
    }
}

fn message_or(err: &DashError, fallback: &str) -> String {
    match err {
        DashError::Rejected { message, .. } => message.clone(),
        _ => fallback.to_string(),
    }
}
