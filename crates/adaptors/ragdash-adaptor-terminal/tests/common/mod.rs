//! Mock dashboard server for terminal client tests

#![allow(dead_code)]

use axum::{
    extract::{Multipart, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
    Form, Json, Router,
};
use ragdash_adaptor_terminal::{DashboardClient, Prompt};
use ragdash_core::Result;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "secret";
const SESSION: &str = "ragdash.sid=test-session";

#[derive(Debug, Clone)]
pub struct MockFile {
    pub bytes: Vec<u8>,
    pub tags: Vec<String>,
}

/// State for the mock dashboard
#[derive(Default)]
pub struct MockDashboard {
    pub files: RwLock<BTreeMap<String, MockFile>>,
    /// `METHOD path` of every authenticated API call
    pub calls: RwLock<Vec<String>>,
}

impl MockDashboard {
    pub async fn seed(&self, name: &str, bytes: &[u8], tags: &[&str]) {
        self.files.write().await.insert(
            name.to_string(),
            MockFile {
                bytes: bytes.to_vec(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
        );
    }

    pub async fn called(&self, call: &str) -> bool {
        self.calls.read().await.iter().any(|c| c == call)
    }
}

type MockState = Arc<MockDashboard>;

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"success": false, "error": "Authentication required", "code": 401})),
    )
        .into_response()
}

async fn gate(state: &MockState, headers: &HeaderMap, call: &str) -> bool {
    let signed_in = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|c| c.contains(SESSION))
        .unwrap_or(false);
    if signed_in {
        state.calls.write().await.push(call.to_string());
    }
    signed_in
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login(Form(form): Form<LoginForm>) -> Response {
    if form.username == ADMIN_USER && form.password == ADMIN_PASSWORD {
        (
            StatusCode::SEE_OTHER,
            [
                (header::LOCATION, "/dashboard".to_string()),
                (header::SET_COOKIE, format!("{}; Path=/; HttpOnly", SESSION)),
            ],
        )
            .into_response()
    } else {
        Html("<p>Invalid username or password</p>").into_response()
    }
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    search: String,
    tags: Option<String>,
}

#[derive(Deserialize)]
struct NameQuery {
    filename: Option<String>,
}

async fn list(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    if !gate(&state, &headers, "GET /api/files").await {
        return unauthorized();
    }
    let wanted: Vec<String> = query
        .tags
        .unwrap_or_default()
        .split(',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    let files: Vec<serde_json::Value> = state
        .files
        .read()
        .await
        .iter()
        .filter(|(name, _)| name.contains(&query.search))
        .filter(|(_, f)| wanted.is_empty() || wanted.iter().any(|t| f.tags.contains(t)))
        .map(|(name, f)| {
            json!({
                "name": name,
                "file_type": "pdf",
                "size": f.bytes.len(),
                "last_updated": "2024-03-05T14:07:09Z",
                "tags": f.tags,
            })
        })
        .collect();
    Json(json!({"success": true, "files": files})).into_response()
}

struct Upload {
    filename: String,
    bytes: Vec<u8>,
    tags: Vec<String>,
    replace_existing: bool,
}

async fn read_upload(mut multipart: Multipart) -> Upload {
    let mut upload = Upload {
        filename: String::new(),
        bytes: Vec::new(),
        tags: Vec::new(),
        replace_existing: false,
    };
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                upload.filename = field.file_name().unwrap_or_default().to_string();
                upload.bytes = field.bytes().await.unwrap().to_vec();
            }
            "tags" => {
                upload.tags = field
                    .text()
                    .await
                    .unwrap()
                    .split(',')
                    .map(str::to_string)
                    .collect()
            }
            "replace_existing" => upload.replace_existing = field.text().await.unwrap() == "true",
            _ => {}
        }
    }
    upload
}

async fn validate(
    State(state): State<MockState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if !gate(&state, &headers, "POST /api/files/validate").await {
        return unauthorized();
    }
    let upload = read_upload(multipart).await;
    if upload.filename.ends_with(".exe") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "success": false,
                "error": "Unsupported file type: .exe",
                "suggestion": "Upload a PDF or text document",
            })),
        )
            .into_response();
    }
    let sufficient = upload.bytes.len() >= 16;
    Json(json!({
        "success": true,
        "filename": upload.filename,
        "file_exists": state.files.read().await.contains_key(&upload.filename),
        "content_analysis": {
            "content_quality": {
                "score": if sufficient { 8.5 } else { 2.0 },
                "is_sufficient": sufficient,
                "reasoning": if sufficient { "Readable text" } else { "Too little text" },
            }
        }
    }))
    .into_response()
}

async fn upload(
    State(state): State<MockState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if !gate(&state, &headers, "POST /api/files/upload").await {
        return unauthorized();
    }
    let upload = read_upload(multipart).await;
    if upload.filename.contains("broken") {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": "Embedding service unavailable"})),
        )
            .into_response();
    }
    let mut files = state.files.write().await;
    if files.contains_key(&upload.filename) && !upload.replace_existing {
        return (
            StatusCode::CONFLICT,
            Json(json!({"success": false, "error": "File already exists"})),
        )
            .into_response();
    }
    files.insert(
        upload.filename.clone(),
        MockFile {
            bytes: upload.bytes,
            tags: upload.tags,
        },
    );
    Json(json!({"success": true, "filename": upload.filename})).into_response()
}

async fn delete_file(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<NameQuery>,
) -> Response {
    if !gate(&state, &headers, "DELETE /api/files/delete").await {
        return unauthorized();
    }
    let name = query.filename.unwrap_or_default();
    match state.files.write().await.remove(&name) {
        Some(_) => Json(json!({"success": true, "message": "File deleted"})).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": "Failed to delete file"})),
        )
            .into_response(),
    }
}

async fn download(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<NameQuery>,
) -> Response {
    if !gate(&state, &headers, "GET /api/files/download").await {
        return unauthorized();
    }
    let name = query.filename.unwrap_or_default();
    match state.files.read().await.get(&name) {
        Some(file) => (
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", name),
                ),
            ],
            file.bytes.clone(),
        )
            .into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": "Failed to download file"})),
        )
            .into_response(),
    }
}

async fn stats(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<NameQuery>,
) -> Response {
    if !gate(&state, &headers, "GET /api/files/stats").await {
        return unauthorized();
    }
    let name = query.filename.unwrap_or_default();
    Json(json!({
        "success": true,
        "file_info": {"name": name, "file_type": "pdf", "size": 2048, "path": format!("uploads/{}", name)},
        "embedding_stats": {"total_embeddings": 2, "has_embeddings": true, "datapoint_ids": ["dp-1", "dp-2"]},
        "message": "Embeddings up to date",
    }))
    .into_response()
}

/// Start the mock dashboard on an ephemeral port
pub async fn start_mock_dashboard() -> (SocketAddr, Arc<MockDashboard>) {
    let state = Arc::new(MockDashboard::default());
    let app = Router::new()
        .route("/login", post(login))
        .route("/api/files", get(list))
        .route("/api/files/validate", post(validate))
        .route("/api/files/upload", post(upload))
        .route("/api/files/delete", delete(delete_file))
        .route("/api/files/download", get(download))
        .route("/api/files/stats", get(stats))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

/// Signed-in client for a fresh mock dashboard
pub async fn setup() -> (Arc<DashboardClient>, Arc<MockDashboard>) {
    let (addr, dashboard) = start_mock_dashboard().await;
    let client = DashboardClient::new(format!("http://{}", addr)).unwrap();
    client.login(ADMIN_USER, ADMIN_PASSWORD).await.unwrap();
    (Arc::new(client), dashboard)
}

/// Prompt with a fixed answer that records every question
pub struct Scripted {
    answer: bool,
    pub asked: Mutex<Vec<String>>,
}

impl Scripted {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }
}

impl Prompt for Scripted {
    fn confirm(&self, question: &str) -> Result<bool> {
        self.asked.lock().unwrap().push(question.to_string());
        Ok(self.answer)
    }
}

/// Write `bytes` to a fresh temp file named `name`
pub fn temp_file(name: &str, bytes: &[u8]) -> PathBuf {
    let dir = temp_dir();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Fresh empty temp directory
pub fn temp_dir() -> PathBuf {
    static NEXT: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);
    let n = NEXT.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("ragdash-terminal-{}-{}", std::process::id(), n));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
