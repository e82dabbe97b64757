//! Validation results, upload intents and upload responses

use crate::Result;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Backend assessment of whether a file is worth ingesting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentQuality {
    /// Suitability rating, 0-10
    #[serde(default)]
    pub score: Option<f64>,

    #[serde(default)]
    pub is_sufficient: Option<bool>,

    #[serde(default)]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    #[serde(default)]
    pub content_quality: Option<ContentQuality>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Response of the validate endpoint.
///
/// Only the fields the dashboard branches on are typed; everything else is
/// kept in `extra` so it can be shown or relayed untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub file_exists: bool,

    #[serde(default)]
    pub filename: Option<String>,

    #[serde(default)]
    pub file_size: Option<u64>,

    #[serde(default)]
    pub content_type: Option<String>,

    #[serde(default)]
    pub quality_score: Option<f64>,

    #[serde(default)]
    pub content_analysis: Option<ContentAnalysis>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub suggestion: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Something the user must acknowledge before an upload proceeds
#[derive(Debug, Clone, PartialEq)]
pub enum UploadWarning {
    /// A file with this name is already stored and would be overwritten
    FileExists { filename: String },

    /// The backend judged the content insufficient
    LowQuality {
        score: Option<f64>,
        reasoning: String,
    },
}

impl UploadWarning {
    /// One-line description for prompts and toasts
    pub fn describe(&self) -> String {
        match self {
            UploadWarning::FileExists { filename } => format!(
                "File Already Exists: A file named \"{}\" already exists and will be replaced.",
                filename
            ),
            UploadWarning::LowQuality { score, reasoning } => match score {
                Some(score) => format!(
                    "Content Quality Warning: {} (score {}/10)",
                    reasoning, score
                ),
                None => format!("Content Quality Warning: {}", reasoning),
            },
        }
    }
}

impl ValidationResult {
    /// Content quality block, if the backend sent one
    pub fn content_quality(&self) -> Option<&ContentQuality> {
        self.content_analysis
            .as_ref()
            .and_then(|a| a.content_quality.as_ref())
    }

    /// Quality score from the analysis block, else the top-level score
    pub fn score(&self) -> Option<f64> {
        self.content_quality()
            .and_then(|q| q.score)
            .or(self.quality_score)
    }

    /// Warnings requiring confirmation. Empty for a failed validation.
    pub fn warnings(&self, fallback_filename: &str) -> Vec<UploadWarning> {
        if !self.success {
            return Vec::new();
        }

        let mut warnings = Vec::new();
        if self.file_exists {
            warnings.push(UploadWarning::FileExists {
                filename: self
                    .filename
                    .clone()
                    .unwrap_or_else(|| fallback_filename.to_string()),
            });
        }
        if let Some(quality) = self.content_quality() {
            if quality.is_sufficient == Some(false) {
                warnings.push(UploadWarning::LowQuality {
                    score: quality.score,
                    reasoning: quality.reasoning.clone().unwrap_or_else(|| {
                        "File content may not be suitable for the knowledge base".to_string()
                    }),
                });
            }
        }
        warnings
    }
}

/// Response of the upload endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub filename: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// File plus form fields, assembled right before a validate/upload call
#[derive(Debug, Clone, PartialEq)]
pub struct UploadIntent {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
    pub tags: Vec<String>,
    pub replace_existing: bool,
    /// Extra form fields forwarded as-is
    pub metadata: BTreeMap<String, String>,
}

impl UploadIntent {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let filename = filename.into();
        Self {
            content_type: guess_content_type(&filename).map(str::to_string),
            filename,
            bytes: bytes.into(),
            tags: Vec::new(),
            replace_existing: false,
            metadata: BTreeMap::new(),
        }
    }

    /// Read a file from disk
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                crate::DashError::invalid_input(format!("'{}' is not a file", path.display()))
            })?;
        Ok(Self::new(filename, bytes))
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_replace_existing(mut self, replace_existing: bool) -> Self {
        self.replace_existing = replace_existing;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Text form fields in the order they are sent
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![(
            "replace_existing".to_string(),
            self.replace_existing.to_string(),
        )];
        if !self.tags.is_empty() {
            fields.push(("tags".to_string(), self.tags.join(",")));
        }
        for (key, value) in &self.metadata {
            fields.push((key.clone(), value.clone()));
        }
        fields
    }

    /// Build the multipart body sent to validate/upload endpoints
    pub fn to_multipart(&self) -> Result<reqwest::multipart::Form> {
        let mut part = reqwest::multipart::Part::bytes(self.bytes.to_vec())
            .file_name(self.filename.clone());
        if let Some(content_type) = &self.content_type {
            part = part.mime_str(content_type)?;
        }

        let mut form = reqwest::multipart::Form::new().part("file", part);
        for (key, value) in self.form_fields() {
            form = form.text(key, value);
        }
        Ok(form)
    }
}

/// Content type from a file extension, for the common document formats
pub fn guess_content_type(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit_once('.')?.1.to_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => return None,
    };
    Some(mime)
}
