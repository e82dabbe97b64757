//! Server-rendered pages: login, dashboard, upload

use crate::handlers::ApiError;
use crate::state::WebState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use ragdash_core::session::{expired_session_cookie, session_cookie};
use ragdash_core::types::{
    split_tag_list, ListFilesParams, SearchFilter, MAX_SELECTED_TAGS, SEARCH_PAGE_SIZE,
};
use ragdash_core::{DashboardView, Result, TemplateEngine};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

const HEAD_TEMPLATE: &str = include_str!("../templates/head.hbs");
const LOGIN_TEMPLATE: &str = include_str!("../templates/login.hbs");
const DASHBOARD_TEMPLATE: &str = include_str!("../templates/dashboard.hbs");
const UPLOAD_TEMPLATE: &str = include_str!("../templates/upload.hbs");

/// Client script for the dashboard modals and flows
pub const DASHBOARD_SCRIPT: &str = include_str!("../assets/dashboard.js");

/// Banner shown when the file listing cannot be loaded
pub const LIST_UNAVAILABLE: &str = "Failed to fetch files. Please check if the RAG API is running.";

const INVALID_LOGIN: &str = "Invalid username or password";

/// Register every page template
pub fn register_templates(engine: &mut TemplateEngine) -> Result<()> {
    engine.register_template("head", HEAD_TEMPLATE)?;
    engine.register_template("login", LOGIN_TEMPLATE)?;
    engine.register_template("dashboard", DASHBOARD_TEMPLATE)?;
    engine.register_template("upload", UPLOAD_TEMPLATE)?;
    Ok(())
}

fn render<T: Serialize>(
    state: &WebState,
    name: &str,
    data: &T,
) -> std::result::Result<Html<String>, ApiError> {
    state.templates.render_named(name, data).map(Html).map_err(|e| {
        error!("Failed to render '{}': {}", name, e);
        ApiError::Internal("Failed to render page".to_string())
    })
}

#[derive(Serialize)]
struct LoginPage<'a> {
    title: &'a str,
    error: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub search: Option<String>,
    pub tags: Option<String>,
}

#[derive(Serialize)]
struct DashboardPage<'a> {
    title: &'a str,
    view: DashboardView,
    query: &'a str,
    tags: String,
    max_tags: usize,
}

/// `GET /`
pub async fn root(State(state): State<WebState>, headers: HeaderMap) -> Redirect {
    if state.is_authenticated(&headers).await {
        Redirect::to("/dashboard")
    } else {
        Redirect::to("/login")
    }
}

/// `GET /login`
pub async fn login_page(
    State(state): State<WebState>,
    headers: HeaderMap,
) -> std::result::Result<Response, ApiError> {
    if state.is_authenticated(&headers).await {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    let page = LoginPage {
        title: "Login",
        error: None,
    };
    Ok(render(&state, "login", &page)?.into_response())
}

/// `POST /login`
pub async fn login_submit(
    State(state): State<WebState>,
    Form(form): Form<LoginForm>,
) -> std::result::Result<Response, ApiError> {
    if !state.admin.verify(&form.username, &form.password) {
        warn!("Failed login attempt");
        let page = LoginPage {
            title: "Login",
            error: Some(INVALID_LOGIN),
        };
        return Ok(render(&state, "login", &page)?.into_response());
    }

    let value = state.sessions.create_authenticated().await.map_err(|e| {
        error!("Could not create session: {}", e);
        ApiError::Internal("Failed to create session".to_string())
    })?;
    let cookie = session_cookie(&value, state.sessions.ttl(), state.config.cookie_secure);
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|_| ApiError::Internal("Failed to create session".to_string()))?;

    info!("Admin logged in");
    let mut response = Redirect::to("/dashboard").into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

/// `POST /logout`
pub async fn logout(State(state): State<WebState>, headers: HeaderMap) -> Response {
    if let Some(value) = WebState::session_cookie(&headers) {
        if state.sessions.destroy(&value).await {
            info!("Admin logged out");
        }
    }

    let mut response = Redirect::to("/login").into_response();
    if let Ok(cookie) = HeaderValue::from_str(&expired_session_cookie()) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

/// `GET /dashboard`
///
/// Without filters this shows the newest page of files. With `search` or
/// `tags` in the query the listing is fetched with those filters.
pub async fn dashboard(
    State(state): State<WebState>,
    Query(query): Query<DashboardQuery>,
) -> std::result::Result<Html<String>, ApiError> {
    let tags = query.tags.as_deref().map(split_tag_list).unwrap_or_default();
    let tags = tags.into_iter().take(MAX_SELECTED_TAGS).collect();
    let filter = SearchFilter::new(query.search.unwrap_or_default(), tags);

    let params = if filter.is_empty() {
        ListFilesParams::default()
    } else {
        ListFilesParams::from_filter(&filter, SEARCH_PAGE_SIZE)
    };

    let view = match state.rag.list_file_records(&params).await {
        Ok(list) => DashboardView::build(&list.files, &filter, None),
        Err(e) => {
            error!("Error fetching files: {}", e);
            DashboardView::build(&[], &filter, Some(LIST_UNAVAILABLE.to_string()))
        }
    };

    let page = DashboardPage {
        title: "Dashboard",
        query: &filter.query,
        tags: filter.tags.join(","),
        max_tags: MAX_SELECTED_TAGS,
        view,
    };
    render(&state, "dashboard", &page)
}

/// `GET /upload`
pub async fn upload_page(
    State(state): State<WebState>,
) -> std::result::Result<Html<String>, ApiError> {
    render(
        &state,
        "upload",
        &serde_json::json!({"title": "Upload", "max_tags": MAX_SELECTED_TAGS}),
    )
}

/// `GET /search`: searching happens on the dashboard
pub async fn search() -> Redirect {
    Redirect::to("/dashboard")
}

/// `GET /static/dashboard.js`
pub async fn dashboard_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        DASHBOARD_SCRIPT,
    )
}
