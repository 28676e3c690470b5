//! # HTTP Facade
//!
//! Exposes a [`FinderSession`] over HTTP. UI-driving operations run as
//! background tasks (see [`tasks`]); the session sits behind one async
//! mutex so only one of them drives the mouse at a time.
//!
//! | Endpoint | Effect |
//! |----------|--------|
//! | `/api/friends_list` | index listing and current selection |
//! | `/api/sync` | rebuild task |
//! | `/api/select_friend` | navigation task (`name`) |
//! | `/api/take_screenshot` | map capture task |
//! | `/api/task_wait` | wait for a task (`task_id`) |
//! | `/api/tasks` | every known task |
//! | `/api/get_screenshot` | PNG bytes (`filename`) |
//! | `/api/list_screenshots` | `[filename, mtime]` pairs |
//! | `/api/delete_screenshot` | delete one (`filename`) |
//! | `/api/delete_all_screenshots` | delete all |
//!
//! Anything else is served from the public directory.

pub mod routes;
pub mod tasks;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, get_service};
use axum::Router;
use tokio::sync::Mutex;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use crate::session::FinderSession;
use routes::{AppState, SharedState};
use tasks::TaskRegistry;

pub const DEFAULT_PORT: u16 = 5050;

/// Build the router for `state`, serving static files from `public_dir`.
pub fn router(state: SharedState, public_dir: PathBuf) -> Router {
    let spa_entry = ServeFile::new(public_dir.join("index.html"));
    Router::new()
        .route("/api/friends_list", get(routes::friends_list).post(routes::friends_list))
        .route("/api/sync", get(routes::sync).post(routes::sync))
        .route("/api/select_friend", get(routes::select_friend).post(routes::select_friend))
        .route("/api/take_screenshot", get(routes::take_screenshot).post(routes::take_screenshot))
        .route("/api/task_wait", get(routes::task_wait).post(routes::task_wait))
        .route("/api/tasks", get(routes::list_tasks).post(routes::list_tasks))
        .route("/api/get_screenshot", get(routes::get_screenshot).post(routes::get_screenshot))
        .route("/api/list_screenshots", get(routes::list_screenshots).post(routes::list_screenshots))
        .route("/api/delete_screenshot", get(routes::delete_screenshot).post(routes::delete_screenshot))
        .route(
            "/api/delete_all_screenshots",
            get(routes::delete_all_screenshots).post(routes::delete_all_screenshots),
        )
        .route("/friends/*name", get_service(spa_entry))
        .fallback_service(ServeDir::new(public_dir))
        .with_state(state)
}

/// Serve `session` on `0.0.0.0:port` until the process is stopped.
pub async fn serve(session: FinderSession, port: u16, public_dir: PathBuf) -> Result<()> {
    let state = Arc::new(AppState {
        screenshot_dir: session.config().screenshot_path(),
        session: Arc::new(Mutex::new(session)),
        tasks: Arc::new(TaskRegistry::new()),
    });
    std::fs::create_dir_all(&state.screenshot_dir)
        .with_context(|| format!("creating {}", state.screenshot_dir.display()))?;

    let app = router(state, public_dir);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "web host listening");
    axum::serve(listener, app).await.context("http server failed")?;
    Ok(())
}
