//! HTTP API.
//!
//! Serves the cached scan to frontend clients. Read endpoints never block
//! on an in-progress scan; they only read the last completed cache
//! snapshot. `POST /api/refresh` queues a scan and returns immediately.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/files` | Cached scan result |
//! | `POST` | `/api/refresh` | Queue an on-demand scan (fire-and-forget) |
//! | `GET`  | `/api/status` | Scan interval and last scan timestamp |
//! | `GET`  | `/api/notes/{discipline}/{filename}` | Read one note |
//! | `PUT`  | `/api/notes/{discipline}/{filename}` | Set or clear one note |
//! | `GET`  | `/health` | Liveness check (unauthenticated) |
//!
//! # Authentication
//!
//! Every `/api/*` route requires `Authorization: Bearer <token>`, checked
//! through the injected [`Authorizer`] predicate. Invalid or expired
//! tokens get 401; valid tokens for unlisted emails get 403.
//!
//! # Error contract
//!
//! Error responses are `{ "error": { "code": ..., "message": ... } }`.
//! A missing cache is not an error: `GET /api/files` degrades to
//! `{ "error": ..., "disciplines": {} }` with 200 so clients keep polling.

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::auth::{AuthError, Authorizer};
use crate::cache::CacheStore;
use crate::config::Config;
use crate::notes::NoteStore;
use crate::sched::{ScanTrigger, TriggerOutcome};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    cache: Arc<CacheStore>,
    notes: Arc<Mutex<NoteStore>>,
    authorizer: Arc<dyn Authorizer>,
    trigger: ScanTrigger,
}

/// Start the HTTP server on `[server].bind`. Runs until the process stops.
pub async fn run_server(
    config: Arc<Config>,
    cache: Arc<CacheStore>,
    notes: Arc<Mutex<NoteStore>>,
    authorizer: Arc<dyn Authorizer>,
    trigger: ScanTrigger,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let state = AppState {
        config,
        cache,
        notes,
        authorizer,
        trigger,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/files", get(handle_files))
        .route("/api/refresh", axum::routing::post(handle_refresh))
        .route("/api/status", get(handle_status))
        .route(
            "/api/notes/{discipline}/{filename}",
            get(handle_get_note).put(handle_put_note),
        )
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    info!(bind = bind_addr.as_str(), "API server listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn unauthorized(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::UNAUTHORIZED,
        code: "unauthorized".to_string(),
        message: message.into(),
    }
}

fn forbidden(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::FORBIDDEN,
        code: "forbidden".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ Authentication ============

/// Check the bearer token on an `/api/*` request.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| unauthorized("missing bearer token"))?;

    match state.authorizer.authorize(token) {
        Ok(_) => Ok(()),
        Err(err @ (AuthError::InvalidToken | AuthError::Expired)) => {
            Err(unauthorized(err.to_string()))
        }
        Err(err @ AuthError::NotAuthorized(_)) => Err(forbidden(err.to_string())),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/files ============

/// Returns the cached scan. Before the first scan completes (or after a
/// corrupt cache was discarded) the response degrades to an empty
/// disciplines map rather than failing.
async fn handle_files(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    authorize(&state, &headers)?;

    match state.cache.read() {
        Ok(Some(result)) => Ok(Json(
            serde_json::to_value(&result).map_err(|e| internal(e.to_string()))?,
        )),
        Ok(None) => Ok(Json(serde_json::json!({
            "error": "no scan data available yet",
            "disciplines": {}
        }))),
        Err(err) => Err(internal(err.to_string())),
    }
}

// ============ POST /api/refresh ============

#[derive(Serialize)]
struct RefreshResponse {
    status: String,
    message: String,
}

/// Queues a scan; acknowledges queuing only, never completion.
async fn handle_refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, AppError> {
    authorize(&state, &headers)?;

    let (status, message) = match state.trigger.request() {
        TriggerOutcome::Queued => ("queued", "scan queued, data will refresh shortly"),
        TriggerOutcome::AlreadyQueued => ("already-queued", "a scan is already pending"),
    };
    Ok(Json(RefreshResponse {
        status: status.to_string(),
        message: message.to_string(),
    }))
}

// ============ GET /api/status ============

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    scan_interval_seconds: u64,
    last_scan_timestamp: Option<DateTime<Utc>>,
}

async fn handle_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, AppError> {
    authorize(&state, &headers)?;

    let last_scan = state
        .cache
        .read()
        .map_err(|e| internal(e.to_string()))?
        .map(|r| r.timestamp);

    Ok(Json(StatusResponse {
        status: "online".to_string(),
        scan_interval_seconds: state.config.scan.interval_secs,
        last_scan_timestamp: last_scan,
    }))
}

// ============ /api/notes/{discipline}/{filename} ============

#[derive(Deserialize)]
struct NoteBody {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct NoteResponse {
    discipline: String,
    filename: String,
    content: String,
}

async fn handle_get_note(
    State(state): State<AppState>,
    Path((discipline, filename)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<NoteResponse>, AppError> {
    authorize(&state, &headers)?;

    let notes = state.notes.lock().expect("note store lock poisoned");
    match notes.get(&discipline, &filename) {
        Some(content) => Ok(Json(NoteResponse {
            discipline,
            filename,
            content: content.to_string(),
        })),
        None => Err(not_found(format!(
            "no note for {discipline}/{filename}"
        ))),
    }
}

/// Set or clear a note. Empty or absent content clears it. The note file
/// is persisted before the response is sent.
async fn handle_put_note(
    State(state): State<AppState>,
    Path((discipline, filename)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<NoteBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    authorize(&state, &headers)?;

    let mut notes = state.notes.lock().expect("note store lock poisoned");
    match body.content.as_deref() {
        Some(content) if !content.trim().is_empty() => notes.set(&discipline, &filename, content),
        _ => notes.remove(&discipline, &filename),
    }
    notes.save().map_err(|e| internal(e.to_string()))?;

    Ok(Json(serde_json::json!({ "status": "ok" })))
}
