//! Validate-then-upload and replace state machine

use super::progress::{Progress, ProgressProfile, ProgressTicker};
use super::FileApi;
use crate::types::{FileRecord, UploadIntent, UploadWarning, ValidationResult};
use crate::{DashError, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

const VALIDATE_FALLBACK: &str = "Failed to validate file";
const UPLOAD_FALLBACK: &str = "Failed to upload file";
const DELETE_FALLBACK: &str = "Failed to delete existing file";
const SAVE_FALLBACK: &str = "Failed to save original file";

// Stages of the replace progress profile
const DELETING_EXISTING_FILE: &str = "Deleting existing file...";
const UPLOADING_NEW_FILE: &str =
    "Uploading new file... This may take a few seconds to a few minutes";

/// Where an upload or replace currently is
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    Idle,
    Validating,
    /// Validation passed with warnings; one confirmation is needed
    NeedsConfirmation {
        warnings: Vec<UploadWarning>,
        validation: ValidationResult,
    },
    ReadyToUpload,
    /// The backend refused the file; a new file must be selected
    Rejected {
        error: String,
        suggestion: Option<String>,
    },
    SavingOriginal,
    DeletingOld,
    Uploading,
    Restoring,
    Done {
        filename: String,
        message: String,
    },
    Failed {
        message: String,
        /// `None` when the original was never removed, otherwise whether the
        /// compensating re-upload succeeded
        original_restored: Option<bool>,
    },
}

impl FlowState {
    /// Whether the interaction lock is held
    pub fn is_locked(&self) -> bool {
        matches!(
            self,
            FlowState::Validating
                | FlowState::ReadyToUpload
                | FlowState::SavingOriginal
                | FlowState::DeletingOld
                | FlowState::Uploading
                | FlowState::Restoring
        )
    }

    /// Whether a new submission is accepted
    pub fn can_submit(&self) -> bool {
        !self.is_locked() && !matches!(self, FlowState::Rejected { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Done { .. } | FlowState::Failed { .. })
    }
}

/// Drives one upload or replace at a time
pub struct UploadFlow<A: FileApi> {
    api: Arc<A>,
    state: watch::Sender<FlowState>,
    progress: Arc<watch::Sender<Progress>>,
    pending: Option<UploadIntent>,
}

impl<A: FileApi> UploadFlow<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (state, _) = watch::channel(FlowState::Idle);
        let (progress, _) = watch::channel(Progress::default());
        Self {
            api,
            state,
            progress: Arc::new(progress),
            pending: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<FlowState> {
        self.state.subscribe()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> Progress {
        self.progress.borrow().clone()
    }

    pub fn is_locked(&self) -> bool {
        self.state.borrow().is_locked()
    }

    fn set_state(&self, state: FlowState) -> FlowState {
        debug!("Upload flow -> {:?}", state);
        self.state.send_replace(state.clone());
        state
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.is_locked() {
            return Err(DashError::flow("Another upload is still in progress"));
        }
        Ok(())
    }

    /// A new file was picked: clear any previous outcome
    pub fn select_file(&mut self) -> Result<()> {
        self.ensure_unlocked()?;
        self.pending = None;
        self.progress.send_replace(Progress::default());
        self.set_state(FlowState::Idle);
        Ok(())
    }

    /// Abandon a pending confirmation
    pub fn cancel(&mut self) -> Result<()> {
        self.select_file()
    }

    /// Validate a file and upload it when nothing needs confirming
    pub async fn submit(&mut self, intent: UploadIntent) -> Result<FlowState> {
        self.ensure_unlocked()?;
        if matches!(*self.state.borrow(), FlowState::Rejected { .. }) {
            return Err(DashError::flow(
                "This file was rejected; select a different file",
            ));
        }

        self.pending = None;
        self.set_state(FlowState::Validating);
        info!("Validating '{}'", intent.filename);

        let validation = match self.api.validate_file(&intent).await {
            Ok(v) => v,
            Err(DashError::Rejected { message, body, .. }) => {
                let suggestion = body
                    .get("suggestion")
                    .and_then(|s| s.as_str())
                    .map(str::to_string);
                warn!("Validation of '{}' rejected: {}", intent.filename, message);
                return Ok(self.set_state(FlowState::Rejected {
                    error: message,
                    suggestion,
                }));
            }
            Err(e) => {
                error!("Validation of '{}' failed: {}", intent.filename, e);
                return Ok(self.set_state(FlowState::Failed {
                    message: failure_message(&e, VALIDATE_FALLBACK),
                    original_restored: None,
                }));
            }
        };

        if !validation.success {
            warn!("Validation of '{}' reported failure", intent.filename);
            return Ok(self.set_state(FlowState::Rejected {
                error: validation
                    .error
                    .clone()
                    .unwrap_or_else(|| "Unknown error".to_string()),
                suggestion: validation.suggestion.clone(),
            }));
        }

        let warnings = validation.warnings(&intent.filename);
        if !warnings.is_empty() {
            self.pending = Some(intent);
            return Ok(self.set_state(FlowState::NeedsConfirmation {
                warnings,
                validation,
            }));
        }

        self.set_state(FlowState::ReadyToUpload);
        Ok(self.upload(intent).await)
    }

    /// Accept the warnings of the pending validation and upload
    pub async fn confirm(&mut self) -> Result<FlowState> {
        let overwrite = match &*self.state.borrow() {
            FlowState::NeedsConfirmation { warnings, .. } => warnings
                .iter()
                .any(|w| matches!(w, UploadWarning::FileExists { .. })),
            _ => return Err(DashError::flow("Nothing is waiting for confirmation")),
        };
        let Some(mut intent) = self.pending.take() else {
            return Err(DashError::flow("Nothing is waiting for confirmation"));
        };

        if overwrite {
            intent.replace_existing = true;
        }
        Ok(self.upload(intent).await)
    }

    async fn upload(&mut self, intent: UploadIntent) -> FlowState {
        self.set_state(FlowState::Uploading);
        let guard = ProgressTicker::start(self.progress.clone(), ProgressProfile::UPLOAD);

        match self.api.upload_file(&intent).await {
            Ok(response) if response.success => {
                guard.finish("Upload completed!");
                let filename = response.filename.unwrap_or(intent.filename);
                info!("Uploaded '{}'", filename);
                self.set_state(FlowState::Done {
                    message: format!("File \"{}\" uploaded successfully!", filename),
                    filename,
                })
            }
            Ok(response) => {
                warn!("Upload of '{}' reported failure", intent.filename);
                self.set_state(FlowState::Failed {
                    message: response
                        .error
                        .unwrap_or_else(|| UPLOAD_FALLBACK.to_string()),
                    original_restored: None,
                })
            }
            Err(e) => {
                error!("Upload of '{}' failed: {}", intent.filename, e);
                self.set_state(FlowState::Failed {
                    message: failure_message(&e, UPLOAD_FALLBACK),
                    original_restored: None,
                })
            }
        }
    }

    /// Replace `original` with a new file.
    ///
    /// The original is downloaded first so it can be re-uploaded if the
    /// replacement fails after the delete went through.
    pub async fn replace(
        &mut self,
        original: &FileRecord,
        mut intent: UploadIntent,
    ) -> Result<FlowState> {
        self.ensure_unlocked()?;
        self.pending = None;

        self.set_state(FlowState::SavingOriginal);
        let guard = ProgressTicker::start(self.progress.clone(), ProgressProfile::REPLACE);
        info!("Replacing '{}' with '{}'", original.name, intent.filename);

        let snapshot = match self.api.download_file(&original.name).await {
            Ok(file) => file,
            Err(e) => {
                error!("Could not save '{}' before replacing: {}", original.name, e);
                return Ok(self.set_state(FlowState::Failed {
                    message: format!(
                        "Replace aborted: {}",
                        failure_message(&e, SAVE_FALLBACK)
                    ),
                    original_restored: None,
                }));
            }
        };

        self.set_state(FlowState::DeletingOld);
        guard.stage(10, DELETING_EXISTING_FILE);
        let delete_error = match self.api.delete_file(&original.name).await {
            Ok(response) if response.success => None,
            Ok(response) => Some(
                response
                    .error
                    .unwrap_or_else(|| DELETE_FALLBACK.to_string()),
            ),
            Err(e) => Some(failure_message(&e, DELETE_FALLBACK)),
        };
        if let Some(message) = delete_error {
            warn!("Delete of '{}' failed; replace aborted", original.name);
            return Ok(self.set_state(FlowState::Failed {
                message: format!("Delete failed: {}", message),
                original_restored: None,
            }));
        }

        self.set_state(FlowState::Uploading);
        guard.stage(30, UPLOADING_NEW_FILE);
        intent.replace_existing = false;
        let upload_error = match self.api.upload_file(&intent).await {
            Ok(response) if response.success => {
                guard.finish("Replacement completed!");
                let filename = response.filename.unwrap_or(intent.filename);
                info!("Replaced '{}' with '{}'", original.name, filename);
                return Ok(self.set_state(FlowState::Done {
                    message: format!(
                        "File \"{}\" replaced successfully with \"{}\"!",
                        original.name, filename
                    ),
                    filename,
                }));
            }
            Ok(response) => response
                .error
                .unwrap_or_else(|| UPLOAD_FALLBACK.to_string()),
            Err(e) => failure_message(&e, UPLOAD_FALLBACK),
        };

        self.set_state(FlowState::Restoring);
        warn!(
            "Replacement upload failed ({}); restoring '{}'",
            upload_error, original.name
        );
        let mut restore = UploadIntent::new(original.name.clone(), snapshot.bytes)
            .with_tags(original.tags.clone());
        if let Some(content_type) = snapshot.content_type {
            restore = restore.with_content_type(content_type);
        }

        let restored = match self.api.upload_file(&restore).await {
            Ok(response) => response.success,
            Err(e) => {
                error!("Restoring '{}' failed: {}", original.name, e);
                false
            }
        };
        drop(guard);

        let outcome = if restored {
            "the original file was restored"
        } else {
            "the original file could not be restored"
        };
        Ok(self.set_state(FlowState::Failed {
            message: format!("Upload failed: {}; {}", upload_error, outcome),
            original_restored: Some(restored),
        }))
    }
}

/// Backend message when there is one, else the fallback
fn failure_message(err: &DashError, fallback: &str) -> String {
    match err {
        DashError::Rejected { message, .. } => message.clone(),
        _ => fallback.to_string(),
    }
}
