//! HTTP endpoint handlers.
//!
//! Structural/input errors (unknown prompt, missing variables, malformed
//! bodies) are rejected with a 4xx and a human-readable cause; validation
//! and resolution issues on the log path are absorbed into record metadata
//! by the core and never fail the caller.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use promptdeck::{Error, Registry, UsageLog, aggregate, render};
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// Shared application state passed to all handlers via axum's `State`
/// extractor. The registry is loaded once before serving and read-only
/// thereafter; the usage log is the only mutable shared resource.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub usage_log: Arc<UsageLog>,
    pub prompts_dir: PathBuf,
}

impl AppState {
    /// Load the registry from `prompts_dir` and wire up the usage log.
    pub fn load(prompts_dir: impl Into<PathBuf>, usage_log: impl Into<PathBuf>) -> Self {
        let prompts_dir = prompts_dir.into();
        Self {
            registry: Arc::new(Registry::load(&prompts_dir)),
            usage_log: Arc::new(UsageLog::new(usage_log.into())),
            prompts_dir,
        }
    }
}

type ApiResponse = (StatusCode, Json<Value>);

fn error_body(status: StatusCode, message: impl Into<String>) -> ApiResponse {
    (status, Json(json!({"error": message.into()})))
}

/// Map a core error to its boundary outcome.
fn core_error(err: Error) -> ApiResponse {
    match err {
        Error::NotFound { .. } => error_body(StatusCode::NOT_FOUND, err.to_string()),
        Error::MissingVariables { .. } | Error::Template(_) => {
            error_body(StatusCode::BAD_REQUEST, err.to_string())
        }
        Error::Io(_) | Error::Json(_) => {
            error_body(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

/// GET /health — 200 if the prompts directory is reachable, else 500.
pub async fn get_health(State(app): State<AppState>) -> ApiResponse {
    let ok = app.prompts_dir.is_dir();
    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(json!({
            "status": if ok { "ok" } else { "error" },
            "prompts_dir_exists": ok,
        })),
    )
}

/// Query string for GET /prompt/{id}.
#[derive(Deserialize)]
pub struct VersionQuery {
    pub version: Option<String>,
}

/// GET /prompt/{id}?version=V — full definition, 404 if unresolved.
pub async fn get_prompt(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<VersionQuery>,
) -> ApiResponse {
    match app.registry.resolve(&id, query.version.as_deref()) {
        Ok(definition) => (
            StatusCode::OK,
            Json(serde_json::to_value(definition).unwrap_or_default()),
        ),
        Err(err) => core_error(err),
    }
}

/// Request body for POST /prompt/{id}/render.
#[derive(Deserialize)]
pub struct RenderRequest {
    pub version: Option<String>,
    #[serde(default)]
    pub inputs: Map<String, Value>,
}

/// POST /prompt/{id}/render — `{rendered}`; 404 if unresolved, 400 on a
/// missing/invalid JSON body or a render failure.
pub async fn post_render(
    State(app): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<RenderRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_body(
                StatusCode::BAD_REQUEST,
                format!("missing or invalid JSON body: {rejection}"),
            );
        }
    };

    let definition = match app.registry.resolve(&id, body.version.as_deref()) {
        Ok(definition) => definition,
        Err(err) => return core_error(err),
    };

    match render(definition, &body.inputs) {
        Ok(rendered) => (StatusCode::OK, Json(json!({"rendered": rendered}))),
        Err(err) => core_error(err),
    }
}

/// Request body for POST /prompt/{id}/log.
#[derive(Deserialize)]
pub struct LogRequest {
    pub version: Option<String>,
    #[serde(default)]
    pub input: Map<String, Value>,
    #[serde(default)]
    pub response: Map<String, Value>,
    pub latency_ms: Option<f64>,
    pub metadata: Option<Map<String, Value>>,
}

/// POST /prompt/{id}/log — append one usage record.
///
/// 400 if `version` or `latency_ms` is absent, 404 if `(id, version)` does
/// not resolve. Schema-validation failures do not fail the request; they
/// are attached to the record's metadata.
pub async fn post_log(
    State(app): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<LogRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_body(
                StatusCode::BAD_REQUEST,
                format!("missing or invalid JSON body: {rejection}"),
            );
        }
    };

    let (Some(version), Some(latency_ms)) = (body.version, body.latency_ms) else {
        return error_body(
            StatusCode::BAD_REQUEST,
            "missing required fields: version, latency_ms",
        );
    };

    // Fail fast on unknown prompts at the boundary; the core's record()
    // itself stays tolerant for callers that log unregistered versions.
    if let Err(err) = app.registry.resolve(&id, Some(&version)) {
        return core_error(err);
    }

    match app.usage_log.record(
        &app.registry,
        &id,
        &version,
        body.input,
        body.response,
        latency_ms,
        body.metadata,
    ) {
        Ok(record) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "record": serde_json::to_value(record).unwrap_or_default(),
            })),
        ),
        Err(err) => core_error(err),
    }
}

/// GET /metrics — per-id summaries folded from the usage log.
pub async fn get_metrics(State(app): State<AppState>) -> ApiResponse {
    if !app.usage_log.path().exists() {
        return (
            StatusCode::OK,
            Json(json!({"metrics": {}, "note": "no usage log found"})),
        );
    }

    match aggregate(&app.usage_log) {
        Ok(metrics) => (
            StatusCode::OK,
            Json(json!({
                "metrics": serde_json::to_value(metrics).unwrap_or_default(),
            })),
        ),
        Err(err) => core_error(err),
    }
}
