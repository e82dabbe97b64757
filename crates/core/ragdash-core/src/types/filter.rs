//! Search filters and the list query they translate into

use serde::{Deserialize, Serialize};

/// Most tags a user can select at once
pub const MAX_SELECTED_TAGS: usize = 10;

/// Page size used by the server-rendered dashboard
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Page size used by client-side searches
pub const SEARCH_PAGE_SIZE: u32 = 1000;

/// Client-side search state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub query: String,
    pub tags: Vec<String>,
}

impl SearchFilter {
    pub fn new(query: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            query: query.into().trim().to_string(),
            tags,
        }
    }

    /// No query and no tags
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.tags.is_empty()
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }
}

/// Split free-form tag input on commas and whitespace, dropping blanks and
/// duplicates while keeping first-seen order.
pub fn parse_tag_input(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for token in input.split(|c: char| c == ',' || c.is_whitespace()) {
        let token = token.trim();
        if !token.is_empty() && !tags.iter().any(|t| t == token) {
            tags.push(token.to_string());
        }
    }
    tags
}

/// Split a comma-joined tag list as sent over the wire. Only commas
/// separate tags here, so a tag may contain spaces.
pub fn split_tag_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parameters of the upstream list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilesParams {
    pub search: String,
    pub tags: Vec<String>,
    pub sort_by: String,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ListFilesParams {
    fn default() -> Self {
        Self {
            search: String::new(),
            tags: Vec::new(),
            sort_by: "date".to_string(),
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl ListFilesParams {
    /// Newest-first query for a filter
    pub fn from_filter(filter: &SearchFilter, limit: u32) -> Self {
        Self {
            search: filter.query.clone(),
            tags: filter.tags.clone(),
            limit,
            ..Default::default()
        }
    }

    /// Query pairs; `tags` is comma-joined and omitted when empty
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("sort_by", self.sort_by.clone()),
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
            ("search", self.search.clone()),
        ];
        if !self.tags.is_empty() {
            query.push(("tags", self.tags.join(",")));
        }
        query
    }
}

/// Query string accepted by the dashboard's list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFilesQuery {
    pub search: Option<String>,
    pub tags: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListFilesQuery {
    pub fn into_params(self) -> ListFilesParams {
        let defaults = ListFilesParams::default();
        ListFilesParams {
            search: self.search.unwrap_or_default(),
            tags: self.tags.as_deref().map(split_tag_list).unwrap_or_default(),
            sort_by: self
                .sort_by
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.sort_by),
            limit: self.limit.unwrap_or(defaults.limit),
            offset: self.offset.unwrap_or(defaults.offset),
        }
    }
}
