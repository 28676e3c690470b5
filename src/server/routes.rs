//! HTTP handlers for the `/api/*` endpoints.
//!
//! Every endpoint answers both GET and POST. Parameters are looked up in
//! the request headers, then the query string, then a JSON object body.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::extract::{FromRequest, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{classify, ScanError};
use crate::server::tasks::{TaskRecord, TaskRegistry, TaskStatus, WAIT_STEP};
use crate::session::FinderSession;

/// Rebuilding scans the whole list.
pub const SYNC_TIMEOUT: Duration = Duration::from_secs(30);
pub const SELECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);
/// Largest JSON body read for parameters.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared state of the HTTP facade.
pub struct AppState {
    pub session: Arc<Mutex<FinderSession>>,
    pub tasks: Arc<TaskRegistry>,
    pub screenshot_dir: PathBuf,
}

pub type SharedState = Arc<AppState>;

/// Request parameters from headers, query string and JSON body.
#[derive(Debug, Default)]
pub struct Params {
    headers: HeaderMap,
    query: HashMap<String, String>,
    body: Option<Value>,
}

impl Params {
    pub fn new(headers: HeaderMap, query: HashMap<String, String>, body: Option<Value>) -> Self {
        Self {
            headers,
            query,
            body,
        }
    }

    /// First non-empty value of `name`.
    pub fn get(&self, name: &str) -> Option<String> {
        let from_header = self
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let value = from_header
            .or_else(|| self.query.get(name).cloned())
            .or_else(|| {
                match self.body.as_ref()?.get(name)? {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                }
            })?;
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for Params {
    type Rejection = std::convert::Infallible;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or_default();
        let body = match to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) if !bytes.is_empty() => serde_json::from_slice::<Value>(&bytes)
                .ok()
                .filter(Value::is_object),
            _ => None,
        };
        Ok(Params::new(parts.headers, query, body))
    }
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// True if `name` names a file directly inside a directory.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().is_some_and(|f| f == name)
}

/// Log a failed UI operation and turn it into the task's error message.
///
/// After a failure that leaves the list position unknown, the next
/// operation re-anchors before replaying any offsets.
pub fn task_error(operation: &str, error: ScanError) -> String {
    warn!(
        operation,
        category = error.category(),
        severity = ?error.severity(),
        reanchor = classify::requires_reanchor(&error),
        error = %error,
        "task operation failed"
    );
    error.to_string()
}

/// Status code and body reported for a task.
pub fn task_response(task: &TaskRecord) -> (StatusCode, Value) {
    match task.status {
        TaskStatus::Pending => (
            StatusCode::ACCEPTED,
            json!({"status": task.status, "message": "Task is pending start"}),
        ),
        TaskStatus::InProgress => (
            StatusCode::ACCEPTED,
            json!({"status": task.status, "message": "Task is in progress"}),
        ),
        TaskStatus::Completed => (
            StatusCode::OK,
            json!({"status": task.status, "message": "Task completed", "result": task.result}),
        ),
        TaskStatus::Failed => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"status": task.status, "message": "Task failed", "error": task.error}),
        ),
    }
}

pub async fn friends_list(State(state): State<SharedState>) -> Response {
    let listing = state.session.lock().await.friends();
    let friends: Vec<Value> = listing
        .friends
        .iter()
        .map(|entry| {
            json!({
                "name": entry.name,
                "last_screenshot": entry.last_capture_ref,
                "last_screenshot_time": entry.last_capture_at,
            })
        })
        .collect();
    Json(json!({
        "last_sync": listing.last_sync.map(|at| at.to_rfc3339()),
        "friends": friends,
        "selected_friend": listing.selected,
    }))
    .into_response()
}

pub async fn sync(State(state): State<SharedState>) -> Response {
    let session = Arc::clone(&state.session);
    let task_id = state.tasks.spawn(Some(SYNC_TIMEOUT), async move {
        let report = session
            .lock()
            .await
            .rebuild()
            .await
            .map_err(|e| task_error("sync", e))?;
        Ok(json!({
            "entries": report.entries,
            "rounds": report.rounds,
            "restored": report.restored,
            "reached_end": report.reached_end,
        }))
    });
    Json(json!({"message": "Index sync started", "task_id": task_id})).into_response()
}

pub async fn select_friend(State(state): State<SharedState>, params: Params) -> Response {
    let Some(name) = params.get("name") else {
        return error(StatusCode::BAD_REQUEST, "name parameter is required");
    };
    if state.session.lock().await.resolve(&name).is_none() {
        return error(StatusCode::NOT_FOUND, format!("Friend '{}' not found", name));
    }

    let session = Arc::clone(&state.session);
    let query = name.clone();
    let task_id = state.tasks.spawn(Some(SELECT_TIMEOUT), async move {
        let selection = session
            .lock()
            .await
            .select(&query, true)
            .await
            .map_err(|e| task_error("select_friend", e))?;
        Ok(json!({"selected": selection.key}))
    });
    Json(json!({"message": format!("Selecting friend '{}'", name), "task_id": task_id}))
        .into_response()
}

pub async fn take_screenshot(State(state): State<SharedState>) -> Response {
    let session = Arc::clone(&state.session);
    let task_id = state.tasks.spawn(Some(CAPTURE_TIMEOUT), async move {
        let record = session
            .lock()
            .await
            .capture_map(None)
            .await
            .map_err(|e| task_error("take_screenshot", e))?;
        Ok(Value::String(record.filename))
    });
    Json(json!({"message": "Taking screenshot", "task_id": task_id})).into_response()
}

pub async fn task_wait(State(state): State<SharedState>, params: Params) -> Response {
    let Some(task_id) = params.get("task_id") else {
        return error(StatusCode::BAD_REQUEST, "task_id parameter is required");
    };
    match state.tasks.wait(&task_id, WAIT_STEP).await {
        Some(task) => {
            let (status, body) = task_response(&task);
            (status, Json(body)).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Task not found"),
    }
}

pub async fn list_tasks(State(state): State<SharedState>) -> Response {
    Json(json!({ "tasks": state.tasks.list() })).into_response()
}

pub async fn get_screenshot(State(state): State<SharedState>, params: Params) -> Response {
    let Some(filename) = params.get("filename") else {
        return error(StatusCode::BAD_REQUEST, "filename parameter is required");
    };
    if !is_plain_file_name(&filename) {
        return error(StatusCode::BAD_REQUEST, format!("Invalid file name '{}'", filename));
    }
    match tokio::fs::read(state.screenshot_dir.join(&filename)).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(_) => error(
            StatusCode::NOT_FOUND,
            format!("Screenshot '{}' not found", filename),
        ),
    }
}

/// Plain files in `dir` with their modification time in Unix seconds.
pub fn screenshot_files(dir: &Path) -> std::io::Result<Vec<(String, f64)>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        files.push((entry.file_name().to_string_lossy().into_owned(), mtime));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

pub async fn list_screenshots(State(state): State<SharedState>) -> Response {
    match screenshot_files(&state.screenshot_dir) {
        Ok(files) => Json(json!({ "screenshots": files })).into_response(),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn delete_screenshot(State(state): State<SharedState>, params: Params) -> Response {
    let Some(filename) = params.get("filename") else {
        return error(StatusCode::BAD_REQUEST, "filename parameter is required");
    };
    if !is_plain_file_name(&filename) {
        return error(StatusCode::BAD_REQUEST, format!("Invalid file name '{}'", filename));
    }
    let path = state.screenshot_dir.join(&filename);
    if !path.is_file() {
        return error(
            StatusCode::NOT_FOUND,
            format!("Screenshot '{}' not found", filename),
        );
    }
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            info!(file = %filename, "deleted screenshot");
            Json(json!({"message": format!("Deleted screenshot '{}'", filename)})).into_response()
        }
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn delete_all_screenshots(State(state): State<SharedState>) -> Response {
    let files = match screenshot_files(&state.screenshot_dir) {
        Ok(files) => files,
        Err(e) => return error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    let mut deleted = Vec::new();
    for (name, _) in files {
        match tokio::fs::remove_file(state.screenshot_dir.join(&name)).await {
            Ok(()) => deleted.push(name),
            Err(e) => {
                warn!(file = %name, error = %e, "could not delete screenshot");
                return error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
            }
        }
    }
    info!(count = deleted.len(), "deleted all screenshots");
    Json(json!({
        "message": format!("Deleted {} screenshots", deleted.len()),
        "deleted_files": deleted,
    }))
    .into_response()
}
