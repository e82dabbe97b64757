//! Shared state for the web handlers

use crate::pages;
use axum::http::{header, HeaderMap};
use ragdash_core::session::parse_cookie_header;
use ragdash_core::{
    AdminIdentity, DashboardConfig, RagApiClient, Result, SessionStore, TemplateEngine,
    SESSION_COOKIE,
};
use std::sync::Arc;

/// Dashboard server state
#[derive(Clone)]
pub struct WebState {
    /// Configuration
    pub config: Arc<DashboardConfig>,

    /// Upstream RAG API client
    pub rag: RagApiClient,

    /// Admin sessions
    pub sessions: SessionStore,

    /// Configured admin credentials
    pub admin: AdminIdentity,

    /// Page templates
    pub templates: Arc<TemplateEngine>,
}

impl WebState {
    pub fn new(config: DashboardConfig) -> Result<Self> {
        let rag = RagApiClient::from_config(&config)?;
        let sessions = SessionStore::new(&config.session_secret, config.session_ttl);
        let admin = AdminIdentity::new(
            config.admin_username.as_deref(),
            config.admin_password.as_deref(),
        );

        let mut templates = TemplateEngine::new();
        pages::register_templates(&mut templates)?;

        Ok(Self {
            config: Arc::new(config),
            rag,
            sessions,
            admin,
            templates: Arc::new(templates),
        })
    }

    /// Session cookie value sent with a request, if any
    pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|h| parse_cookie_header(h, SESSION_COOKIE))
            .map(str::to_string)
    }

    /// Whether the request carries a live authenticated session
    pub async fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        match Self::session_cookie(headers) {
            Some(value) => self.sessions.is_authenticated(&value).await,
            None => false,
        }
    }
}
