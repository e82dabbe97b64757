//! Rendering of file records into view models
//!
//! Everything here is a pure function of the records and filters passed in.
//! The web pages and the terminal client both render from these models.

use crate::types::{FileRecord, FileStatsResponse, SearchFilter};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::Serialize;
use std::fmt::Display;

/// Fallback icon color
pub const GENERIC_COLOR: &str = "#9aa0a6";

const EXCEL_GREEN: &str = "#34a853";
const PDF_RED: &str = "#ea4335";
const IMAGE_GREEN: &str = "#34a853";
const WORD_BLUE: &str = "#4285f4";
const TEXT_GRAY: &str = "#5f6368";

/// Icon class and background color for a file card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileIcon {
    pub class: &'static str,
    pub color: &'static str,
}

impl FileIcon {
    const fn new(class: &'static str, color: &'static str) -> Self {
        Self { class, color }
    }
}

/// Choose an icon from the extension, then the declared type
pub fn file_icon(file_type: Option<&str>, name: &str) -> FileIcon {
    if let Some((_, ext)) = name.rsplit_once('.') {
        let icon = match ext.to_lowercase().as_str() {
            "xlsx" | "xls" | "csv" => Some(FileIcon::new("bi-file-excel", EXCEL_GREEN)),
            "pdf" => Some(FileIcon::new("bi-file-pdf", PDF_RED)),
            "png" | "jpg" | "jpeg" | "gif" | "bmp" => {
                Some(FileIcon::new("bi-file-image", IMAGE_GREEN))
            }
            "docx" | "doc" => Some(FileIcon::new("bi-file-word", WORD_BLUE)),
            "txt" => Some(FileIcon::new("bi-file-text", TEXT_GRAY)),
            _ => None,
        };
        if let Some(icon) = icon {
            return icon;
        }
    }

    let Some(file_type) = file_type else {
        return FileIcon::new("bi-file-earmark", GENERIC_COLOR);
    };
    let t = file_type.to_lowercase();

    // Order matters: "officedocument" spreadsheets match the word branch.
    if t.contains("pdf") {
        FileIcon::new("bi-file-pdf", PDF_RED)
    } else if t.contains("image") {
        FileIcon::new("bi-file-image", IMAGE_GREEN)
    } else if t.contains("word") || t.contains("document") {
        FileIcon::new("bi-file-word", WORD_BLUE)
    } else if ["excel", "spreadsheet", "xls", "csv"]
        .iter()
        .any(|k| t.contains(k))
    {
        FileIcon::new("bi-file-excel", EXCEL_GREEN)
    } else if t.contains("text") {
        FileIcon::new("bi-file-text", TEXT_GRAY)
    } else {
        FileIcon::new("bi-file-earmark", GENERIC_COLOR)
    }
}

/// Human readable size with 1024 scaling, e.g. 1536 -> "1.5 KB"
pub fn format_file_size(bytes: Option<u64>) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let bytes = match bytes {
        Some(b) if b > 0 => b,
        _ => return "0 B".to_string(),
    };

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Date and time in the local timezone, "Unknown" when absent or unparsable
pub fn format_date(value: Option<&str>) -> String {
    format_date_in(value, &Local)
}

/// Date and time in `tz`. Timestamps without an offset are read as `tz` local time.
pub fn format_date_in<Tz>(value: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    value
        .and_then(|v| parse_timestamp(v.trim(), tz))
        .map(|dt| dt.format("%-m/%-d/%Y %-I:%M:%S %p").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn parse_timestamp<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(tz));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
}

/// View model of one file card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileCard {
    pub name: String,
    pub icon: FileIcon,
    pub size: String,
    pub date: String,
    pub file_type: String,
    pub tags: Vec<String>,
}

impl FileCard {
    pub fn from_record(record: &FileRecord) -> Self {
        Self {
            name: record.name.clone(),
            icon: file_icon(record.file_type.as_deref(), &record.name),
            size: format_file_size(record.size),
            date: format_date(record.last_updated.as_deref()),
            file_type: record
                .file_type
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Unknown type".to_string()),
            tags: record.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Query,
    Tag,
}

/// A removable chip showing one active filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterIndicator {
    pub kind: FilterKind,
    pub label: String,
    pub value: String,
}

/// Indicators for the active filters: the query first, then each tag
pub fn filter_indicators(filter: &SearchFilter) -> Vec<FilterIndicator> {
    let mut indicators = Vec::new();
    if !filter.query.is_empty() {
        indicators.push(FilterIndicator {
            kind: FilterKind::Query,
            label: format!("Search: \"{}\"", filter.query),
            value: filter.query.clone(),
        });
    }
    indicators.extend(filter.tags.iter().map(|tag| FilterIndicator {
        kind: FilterKind::Tag,
        label: tag.clone(),
        value: tag.clone(),
    }));
    indicators
}

/// Everything the dashboard needs to draw the file grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub cards: Vec<FileCard>,
    pub indicators: Vec<FilterIndicator>,
    pub has_filters: bool,
    pub available_tags: Vec<String>,
    pub is_empty: bool,
    pub error: Option<String>,
}

impl DashboardView {
    pub fn build(files: &[FileRecord], filter: &SearchFilter, error: Option<String>) -> Self {
        let mut available_tags: Vec<String> =
            files.iter().flat_map(|f| f.tags.iter().cloned()).collect();
        available_tags.sort();
        available_tags.dedup();

        let indicators = filter_indicators(filter);
        Self {
            cards: files.iter().map(FileCard::from_record).collect(),
            has_filters: !indicators.is_empty(),
            indicators,
            available_tags,
            is_empty: files.is_empty(),
            error,
        }
    }
}

/// File information plus embedding statistics for one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileStatsView {
    pub name: String,
    pub file_type: String,
    pub size: String,
    pub last_updated: String,
    pub path: String,
    pub total_embeddings: u64,
    pub has_embeddings: bool,
    pub status: String,
    pub datapoint_ids: Vec<String>,
}

impl FileStatsView {
    /// `filename` names the file when the backend omits `file_info`
    pub fn from_response(response: &FileStatsResponse, filename: &str) -> Self {
        let info = response.file_info.clone().unwrap_or_else(|| FileRecord {
            name: filename.to_string(),
            ..Default::default()
        });
        let embeddings = response.embedding_stats.clone().unwrap_or_default();

        Self {
            name: info.name,
            file_type: info
                .file_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            size: format_file_size(info.size),
            last_updated: format_date(info.last_updated.as_deref()),
            path: info.path.unwrap_or_default(),
            total_embeddings: embeddings.total_embeddings,
            has_embeddings: embeddings.has_embeddings,
            status: response.message.clone().unwrap_or_default(),
            datapoint_ids: embeddings.datapoint_ids,
        }
    }
}
