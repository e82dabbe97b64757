//! Dashboard HTTP server
//!
//! Public routes (login, health, the client script) sit next to a group of
//! protected routes that share one session gate. Protected page routes
//! redirect anonymous visitors to `/login`; protected `/api/` routes answer
//! 401 JSON.

use crate::extract::json_payload_too_large;
use crate::gate::session_gate;
use crate::handlers::{
    delete_file, delete_file_by_path, download_file, file_stats, health_check, list_files,
    upload_file, validate_file,
};
use crate::pages::{
    dashboard, dashboard_script, login_page, login_submit, logout, root, search, upload_page,
};
use crate::state::WebState;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use ragdash_core::{DashError, DashboardConfig, Result};
use std::future::Future;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

/// How often expired sessions are swept
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Dashboard server
pub struct DashboardServer {
    state: WebState,
}

impl DashboardServer {
    /// Create a server from configuration
    pub fn new(config: DashboardConfig) -> Result<Self> {
        Ok(Self {
            state: WebState::new(config)?,
        })
    }

    /// Create a server around prepared state
    pub fn with_state(state: WebState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &WebState {
        &self.state
    }

    /// Build the Axum router
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Serve until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.state.config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| DashError::config(format!("Failed to bind to {}: {}", addr, e)))?;
        info!("RAG file dashboard listening on http://{}", addr);
        info!("Proxying to RAG API at {}", self.state.config.rag_api_base_url);

        let sessions = self.state.sessions.clone();
        let sweeper = tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                let purged = sessions.purge_expired().await;
                if purged > 0 {
                    debug!("Purged {} expired sessions", purged);
                }
            }
        });

        let router = self.router();
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await;
        sweeper.abort();

        if let Err(e) = result {
            error!("Server error: {}", e);
            return Err(DashError::Io(e));
        }
        info!("Dashboard server stopped");
        Ok(())
    }
}

/// Build the dashboard router over shared state
pub fn build_router(state: WebState) -> Router {
    let max_body = state.config.max_upload_bytes;

    let protected = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/upload", get(upload_page))
        .route("/search", get(search))
        .route("/api/files", get(list_files))
        .route("/api/files/download", get(download_file))
        .route("/api/files/delete", delete(delete_file))
        .route("/api/files/stats", get(file_stats))
        .route("/api/files/validate", post(validate_file))
        .route("/api/files/upload", post(upload_file))
        .route("/api/files/:filename", delete(delete_file_by_path))
        .route_layer(middleware::from_fn_with_state(state.clone(), session_gate));

    Router::new()
        .route("/", get(root))
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", post(logout))
        .route("/health", get(health_check))
        .route("/static/dashboard.js", get(dashboard_script))
        .merge(protected)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(middleware::map_response(json_payload_too_large))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
