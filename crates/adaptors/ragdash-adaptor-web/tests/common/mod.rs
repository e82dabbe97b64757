//! Common test utilities and a mock RAG API for E2E testing

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{Multipart, Query, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use ragdash_adaptor_web::{build_router, WebState};
use ragdash_core::DashboardConfig;
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower::util::ServiceExt;

// ============================================================================
// Test Configuration
// ============================================================================

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse";
pub const API_TOKEN: &str = "test-api-token";
pub const BOUNDARY: &str = "ragdash-test-boundary";

/// Dashboard configuration pointing at a mock RAG API
pub fn create_test_config(rag_addr: SocketAddr) -> DashboardConfig {
    DashboardConfig {
        session_secret: "test-session-secret".to_string(),
        admin_username: Some(ADMIN_USER.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        rag_api_base_url: format!("http://{}", rag_addr),
        api_auth_token: Some(API_TOKEN.to_string()),
        session_ttl: Duration::from_secs(60 * 60),
        ..DashboardConfig::default()
    }
}

// ============================================================================
// Mock RAG API
// ============================================================================

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub tags: Vec<String>,
}

/// State for the mock RAG API
#[derive(Default)]
pub struct MockRagState {
    pub files: RwLock<BTreeMap<String, StoredFile>>,
    /// `METHOD path` of every request received
    pub requests: RwLock<Vec<String>>,
    /// Authorization header of every request received
    pub auth_headers: RwLock<Vec<Option<String>>>,
}

impl MockRagState {
    pub async fn seed(&self, name: &str, bytes: &[u8], tags: &[&str]) {
        self.files.write().await.insert(
            name.to_string(),
            StoredFile {
                name: name.to_string(),
                content_type: "application/pdf".to_string(),
                bytes: bytes.to_vec(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
        );
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

type MockState = Arc<MockRagState>;

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    search: String,
    tags: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct NameQuery {
    filename: String,
}

async fn record(state: &MockState, method: &str, path: &str, headers: &HeaderMap) {
    state.requests.write().await.push(format!("{} {}", method, path));
    state.auth_headers.write().await.push(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
}

fn file_json(file: &StoredFile) -> serde_json::Value {
    let ext = file.name.rsplit('.').next().unwrap_or_default();
    json!({
        "name": file.name,
        "file_type": ext,
        "size": file.bytes.len(),
        "last_updated": "2024-03-05T14:07:09Z",
        "tags": file.tags,
        "path": format!("uploads/{}", file.name),
    })
}

async fn mock_list(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Json<serde_json::Value> {
    record(&state, "GET", "/api/v1/files/list", &headers).await;
    let wanted: Vec<String> = query
        .tags
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    let search = query.search.to_lowercase();

    let files = state.files.read().await;
    let matched: Vec<serde_json::Value> = files
        .values()
        .filter(|f| search.is_empty() || f.name.to_lowercase().contains(&search))
        .filter(|f| wanted.is_empty() || wanted.iter().any(|t| f.tags.contains(t)))
        .skip(query.offset.unwrap_or(0))
        .take(query.limit.unwrap_or(50))
        .map(file_json)
        .collect();

    Json(json!({"success": true, "total": matched.len(), "files": matched}))
}

async fn mock_view(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<NameQuery>,
) -> Response {
    record(&state, "GET", "/api/v1/files/view", &headers).await;
    match state.files.read().await.get(&query.filename) {
        Some(file) => (
            [
                (header::CONTENT_TYPE, file.content_type.clone()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file.name),
                ),
            ],
            file.bytes.clone(),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "error": "File not found"})),
        )
            .into_response(),
    }
}

async fn mock_delete(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<NameQuery>,
) -> Response {
    record(&state, "DELETE", "/api/v1/upload/delete", &headers).await;
    match state.files.write().await.remove(&query.filename) {
        Some(_) => Json(json!({
            "success": true,
            "message": format!("Deleted {}", query.filename),
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "error": "File not found"})),
        )
            .into_response(),
    }
}

async fn mock_stats(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<NameQuery>,
) -> Response {
    record(&state, "GET", "/api/v1/files/embedding-stats", &headers).await;
    match state.files.read().await.get(&query.filename) {
        Some(file) => Json(json!({
            "success": true,
            "file_info": file_json(file),
            "embedding_stats": {
                "total_embeddings": 3,
                "has_embeddings": true,
                "datapoint_ids": ["dp-1", "dp-2", "dp-3"],
            },
            "message": "Embeddings up to date",
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "error": "File not found"})),
        )
            .into_response(),
    }
}

struct ReceivedUpload {
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
    fields: HashMap<String, String>,
}

async fn read_form(mut multipart: Multipart) -> Option<ReceivedUpload> {
    let mut file = None;
    let mut fields = HashMap::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.ok()?.to_vec();
            file = Some((filename, content_type, bytes));
        } else {
            fields.insert(name, field.text().await.ok()?);
        }
    }
    let (filename, content_type, bytes) = file?;
    Some(ReceivedUpload {
        filename,
        content_type,
        bytes,
        fields,
    })
}

async fn mock_validate(
    State(state): State<MockState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    record(&state, "POST", "/api/v1/file/validate", &headers).await;
    let Some(upload) = read_form(multipart).await else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": "No file"})),
        )
            .into_response();
    };

    if upload.filename.ends_with(".exe") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "success": false,
                "error": "Unsupported file type: .exe",
                "suggestion": "Upload a PDF, Word, Excel, CSV or text document",
            })),
        )
            .into_response();
    }

    let file_exists = state.files.read().await.contains_key(&upload.filename);
    let sufficient = upload.bytes.len() >= 16;
    Json(json!({
        "success": true,
        "filename": upload.filename,
        "file_exists": file_exists,
        "file_size": upload.bytes.len(),
        "content_type": upload.content_type,
        "quality_score": if sufficient { 0.9 } else { 0.2 },
        "content_analysis": {
            "content_quality": {
                "score": if sufficient { 0.9 } else { 0.2 },
                "is_sufficient": sufficient,
                "reasoning": if sufficient { "Readable text" } else { "Too little text" },
            }
        }
    }))
    .into_response()
}

async fn mock_upload(
    State(state): State<MockState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    record(&state, "POST", "/api/v1/upload/direct", &headers).await;
    let Some(upload) = read_form(multipart).await else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": "No file"})),
        )
            .into_response();
    };

    let replace = upload
        .fields
        .get("replace_existing")
        .map(|v| v == "true")
        .unwrap_or(false);
    let mut files = state.files.write().await;
    if files.contains_key(&upload.filename) && !replace {
        return (
            StatusCode::CONFLICT,
            Json(json!({"success": false, "error": "File already exists"})),
        )
            .into_response();
    }

    let tags = upload
        .fields
        .get("tags")
        .map(|t| {
            t.split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    files.insert(
        upload.filename.clone(),
        StoredFile {
            name: upload.filename.clone(),
            content_type: upload
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            bytes: upload.bytes,
            tags,
        },
    );

    Json(json!({
        "success": true,
        "filename": upload.filename,
        "message": "File uploaded successfully",
    }))
    .into_response()
}

/// Start a mock RAG API on an ephemeral port
pub async fn start_mock_rag() -> (SocketAddr, Arc<MockRagState>) {
    let state = Arc::new(MockRagState::default());
    let app = Router::new()
        .route("/api/v1/files/list", get(mock_list))
        .route("/api/v1/files/view", get(mock_view))
        .route("/api/v1/upload/delete", delete(mock_delete))
        .route("/api/v1/files/embedding-stats", get(mock_stats))
        .route("/api/v1/file/validate", post(mock_validate))
        .route("/api/v1/upload/direct", post(mock_upload))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

// ============================================================================
// Dashboard helpers
// ============================================================================

/// Dashboard router wired to a fresh mock RAG API
pub async fn setup() -> (Router, Arc<MockRagState>) {
    let (addr, rag) = start_mock_rag().await;
    let state = WebState::new(create_test_config(addr)).unwrap();
    (build_router(state), rag)
}

/// Dashboard router accepting request bodies up to `max_upload_bytes`
pub async fn setup_with_upload_limit(max_upload_bytes: usize) -> (Router, Arc<MockRagState>) {
    let (addr, rag) = start_mock_rag().await;
    let config = DashboardConfig {
        max_upload_bytes,
        ..create_test_config(addr)
    };
    (build_router(WebState::new(config).unwrap()), rag)
}

/// Dashboard router whose RAG API is not listening
pub fn setup_unreachable() -> Router {
    let addr: SocketAddr = "127.0.0.1:9".parse().unwrap();
    build_router(WebState::new(create_test_config(addr)).unwrap())
}

/// Log in and return the `Cookie` header value for the session
pub async fn login(router: &Router) -> String {
    let response = router
        .clone()
        .oneshot(login_request(ADMIN_USER, ADMIN_PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login sets a cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

pub fn login_request(username: &str, password: &str) -> Request<Body> {
    let form = format!(
        "username={}&password={}",
        username,
        password.replace(' ', "+")
    );
    Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap()
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    request("GET", uri, cookie)
}

pub fn request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Multipart request carrying one file part plus text fields
pub fn multipart_request(
    uri: &str,
    cookie: &str,
    file: Option<(&str, &[u8])>,
    fields: &[(&str, &str)],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
