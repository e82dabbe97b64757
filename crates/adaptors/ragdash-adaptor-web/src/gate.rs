//! Session gate for protected routes

use crate::handlers::ApiError;
use crate::state::WebState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

/// Lets authenticated requests through. Anonymous API calls get 401 JSON,
/// anonymous page requests are sent to the login page.
pub async fn session_gate(State(state): State<WebState>, request: Request, next: Next) -> Response {
    if state.is_authenticated(request.headers()).await {
        return next.run(request).await;
    }

    let path = request.uri().path();
    debug!("Unauthenticated request to {}", path);
    if path.starts_with("/api/") {
        ApiError::Unauthorized("Authentication required".to_string()).into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}
