//! File records and the list/stats/delete payloads returned by the RAG API

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

/// A file stored by the RAG backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// File name, unique within the knowledge base
    pub name: String,

    /// Declared type (MIME type or extension-like string)
    #[serde(default)]
    pub file_type: Option<String>,

    /// Size in bytes
    #[serde(default, deserialize_with = "deserialize_size")]
    pub size: Option<u64>,

    /// Last modification timestamp as sent by the backend
    #[serde(default)]
    pub last_updated: Option<String>,

    /// Tags attached at upload time
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,

    /// Storage path on the backend
    #[serde(default)]
    pub path: Option<String>,
}

impl FileRecord {
    /// Lower-cased extension of the file name, if any
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.name.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_lowercase())
        }
    }

    /// Whether the record carries the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Response of the list endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileListResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<FileRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileListResponse {
    /// Unique tags across all listed files, sorted
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .files
            .iter()
            .flat_map(|f| f.tags.iter().cloned())
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }
}

/// Embedding statistics for one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingStats {
    #[serde(default)]
    pub total_embeddings: u64,

    #[serde(default)]
    pub has_embeddings: bool,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub datapoint_ids: Vec<String>,
}

/// Response of the embedding-stats endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileStatsResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub file_info: Option<FileRecord>,

    #[serde(default)]
    pub embedding_stats: Option<EmbeddingStats>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of the delete endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A downloaded file held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedFile {
    /// Name to save under (from `Content-Disposition` when present)
    pub filename: String,

    /// Content type mirrored from the backend
    pub content_type: Option<String>,

    /// File content
    pub bytes: Bytes,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// Backends written in dynamic languages sometimes send sizes as floats.
fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
    }))
}
