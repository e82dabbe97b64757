//! Dashboard commands for the terminal
//!
//! [`Console`] runs the shared [`DashboardController`] against any
//! [`FileApi`] and asks for confirmation through a [`Prompt`] wherever the
//! browser would show a modal.

use crate::display::{describe_state, render_file_table, render_progress, render_stats};
use ragdash_core::types::{UploadIntent, MAX_SELECTED_TAGS};
use ragdash_core::{DashError, DashboardController, FileApi, FlowState, Result, Toast};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Yes/no question asked before destructive or warned actions
pub trait Prompt: Send + Sync {
    fn confirm(&self, question: &str) -> Result<bool>;
}

impl<P: Prompt + ?Sized> Prompt for Box<P> {
    fn confirm(&self, question: &str) -> Result<bool> {
        (**self).confirm(question)
    }
}

/// Asks on the terminal
pub struct InteractivePrompt;

impl Prompt for InteractivePrompt {
    fn confirm(&self, question: &str) -> Result<bool> {
        dialoguer::Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .map_err(|e| DashError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))
    }
}

/// Answers yes to everything (`--yes`)
pub struct AssumeYes;

impl Prompt for AssumeYes {
    fn confirm(&self, _question: &str) -> Result<bool> {
        Ok(true)
    }
}

pub struct Console<A: FileApi + 'static, P: Prompt> {
    controller: DashboardController<A>,
    prompt: P,
    show_progress: bool,
}

impl<A: FileApi + 'static, P: Prompt> Console<A, P> {
    pub fn new(api: Arc<A>, prompt: P) -> Self {
        Self {
            controller: DashboardController::new(api),
            prompt,
            show_progress: false,
        }
    }

    /// Print the progress bar to stderr while uploads run
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn controller(&self) -> &DashboardController<A> {
        &self.controller
    }

    pub fn take_toasts(&mut self) -> Vec<Toast> {
        self.controller.take_toasts()
    }

    /// `files list`
    pub async fn list(&mut self, search: &str, tags: Vec<String>) -> Result<String> {
        self.controller.select_tags(tags);
        self.controller.search(search).await?;
        Ok(render_file_table(&self.controller.view()))
    }

    /// `files upload`: validate, confirm warnings, upload
    pub async fn upload(&mut self, path: &Path, tags: Vec<String>) -> Result<FlowState> {
        let intent = UploadIntent::from_path(path).await?.with_tags(cap_tags(tags));

        let printer = self.progress_printer();
        let result = self.controller.upload(intent).await;
        stop_printer(printer);
        let state = result?;

        if !matches!(state, FlowState::NeedsConfirmation { .. }) {
            return Ok(state);
        }

        let question = format!("{}\nUpload anyway?", describe_state(&state));
        if !self.prompt.confirm(&question)? {
            self.controller.cancel_upload()?;
            return Ok(FlowState::Idle);
        }

        let printer = self.progress_printer();
        let result = self.controller.confirm_upload().await;
        stop_printer(printer);
        result
    }

    /// `files replace`: the new file takes the original's tags unless
    /// `tags` is given
    pub async fn replace(
        &mut self,
        filename: &str,
        path: &Path,
        tags: Option<Vec<String>>,
    ) -> Result<FlowState> {
        self.controller.select_tags(Vec::new());
        self.controller.search(filename).await?;
        let original_tags = self
            .controller
            .files()
            .iter()
            .find(|f| f.name == filename)
            .map(|f| f.tags.clone())
            .ok_or_else(|| DashError::invalid_input(format!("File \"{}\" not found", filename)))?;

        let tags = cap_tags(tags.unwrap_or(original_tags));
        let intent = UploadIntent::from_path(path).await?.with_tags(tags);
        let question = format!(
            "Replace \"{}\" with {}? The original is deleted before the new file is uploaded.",
            filename, intent.filename
        );
        if !self.prompt.confirm(&question)? {
            return Ok(FlowState::Idle);
        }

        let printer = self.progress_printer();
        let result = self.controller.replace(filename, intent).await;
        stop_printer(printer);
        result
    }

    /// `files delete`; `Ok(false)` when the user declined
    pub async fn delete(&mut self, filename: &str) -> Result<bool> {
        self.controller.request_delete(filename);
        let question = format!("Delete \"{}\"? This cannot be undone.", filename);
        if !self.prompt.confirm(&question)? {
            self.controller.cancel_delete();
            return Ok(false);
        }
        self.controller.confirm_delete().await?;
        Ok(true)
    }

    /// `files stats`
    pub async fn stats(&mut self, filename: &str) -> Result<String> {
        let stats = self.controller.file_stats(filename).await?;
        Ok(render_stats(&stats))
    }

    /// `files download`; returns where the file was written
    pub async fn download(&mut self, filename: &str, output: Option<&Path>) -> Result<PathBuf> {
        let file = self.controller.download(filename).await?;
        let name = safe_file_name(&file.filename, filename);
        let target = match output {
            Some(dir) if dir.is_dir() => dir.join(name),
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(name),
        };
        tokio::fs::write(&target, &file.bytes).await?;
        Ok(target)
    }

    fn progress_printer(&self) -> Option<JoinHandle<()>> {
        if !self.show_progress {
            return None;
        }
        let mut rx = self.controller.flow().subscribe_progress();
        Some(tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let line = render_progress(&rx.borrow_and_update());
                eprint!("\r{}", line);
            }
        }))
    }
}

fn stop_printer(printer: Option<JoinHandle<()>>) {
    if let Some(handle) = printer {
        handle.abort();
        eprintln!();
    }
}

fn cap_tags(mut tags: Vec<String>) -> Vec<String> {
    if tags.len() > MAX_SELECTED_TAGS {
        warn!("Only the first {} tags are kept", MAX_SELECTED_TAGS);
        tags.truncate(MAX_SELECTED_TAGS);
    }
    tags
}

/// Last path component of a server-supplied name
fn safe_file_name(suggested: &str, fallback: &str) -> String {
    Path::new(suggested)
        .file_name()
        .or_else(|| Path::new(fallback).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string())
}
