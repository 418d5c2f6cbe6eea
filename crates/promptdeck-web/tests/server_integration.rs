//! Integration tests for the promptdeck API server.
//!
//! These tests start a real axum server on a random port against a
//! temporary prompts directory and exercise every route end to end.

use std::path::Path;

use promptdeck_web::{AppState, build_router, start_server};
use tempfile::TempDir;

fn write_doc(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

fn seed_prompts(dir: &Path) {
    write_doc(
        dir,
        "greeting_v1.yaml",
        "prompt_id: greeting\nversion: \"1.0.0\"\ntemplate: \"Hello {{name}}\"\n",
    );
    write_doc(
        dir,
        "greeting_v2.yaml",
        "prompt_id: greeting\nversion: \"2.0.0\"\ntemplate: \"Hi {{name}}!\"\n",
    );
    write_doc(
        dir,
        "answer.yaml",
        "prompt_id: answer\n\
         version: \"1.0.0\"\n\
         template: \"{{question}}\"\n\
         expected_output_schema:\n\
         \x20 type: object\n\
         \x20 properties:\n\
         \x20   text: {type: string}\n\
         \x20 required: [text]\n",
    );
}

/// Helper: spawn a test server on port 0 (random available port).
///
/// Returns the temp dir (keep it alive), the base URL, and the state.
async fn spawn_test_server() -> (TempDir, String, AppState) {
    let dir = TempDir::new().unwrap();
    let prompts_dir = dir.path().join("prompts");
    std::fs::create_dir(&prompts_dir).unwrap();
    seed_prompts(&prompts_dir);

    let state = AppState::load(&prompts_dir, dir.path().join("usage.jsonl"));
    let addr = start_server(build_router(state.clone()), ([127, 0, 0, 1], 0).into())
        .await
        .unwrap();
    (dir, format!("http://{addr}"), state)
}

// ── Health ───────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_prompts_dir() {
    let (_dir, base, _state) = spawn_test_server().await;

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["prompts_dir_exists"], true);
}

#[tokio::test]
async fn health_fails_when_prompts_dir_is_missing() {
    let dir = TempDir::new().unwrap();
    let state = AppState::load(dir.path().join("nope"), dir.path().join("usage.jsonl"));
    let addr = start_server(build_router(state), ([127, 0, 0, 1], 0).into())
        .await
        .unwrap();

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 500);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["prompts_dir_exists"], false);
}

// ── GET /prompt/{id} ─────────────────────────────────────────────────

#[tokio::test]
async fn get_prompt_returns_newest_version() {
    let (_dir, base, _state) = spawn_test_server().await;

    let resp = reqwest::get(format!("{base}/prompt/greeting")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["version"], "2.0.0");
    assert_eq!(json["template"], "Hi {{name}}!");
    assert_eq!(json["source_file"], "greeting_v2.yaml");
}

#[tokio::test]
async fn get_prompt_resolves_exact_version() {
    let (_dir, base, _state) = spawn_test_server().await;

    let resp = reqwest::get(format!("{base}/prompt/greeting?version=1.0.0"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["template"], "Hello {{name}}");
}

#[tokio::test]
async fn get_prompt_404_for_unknown_id_or_version() {
    let (_dir, base, _state) = spawn_test_server().await;

    let resp = reqwest::get(format!("{base}/prompt/farewell")).await.unwrap();
    assert_eq!(resp.status(), 404);

    let resp = reqwest::get(format!("{base}/prompt/greeting?version=1.0"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

// ── POST /prompt/{id}/render ─────────────────────────────────────────

#[tokio::test]
async fn render_substitutes_inputs() {
    let (_dir, base, _state) = spawn_test_server().await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/prompt/greeting/render"))
        .json(&serde_json::json!({"inputs": {"name": "Ada"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["rendered"], "Hi Ada!");
}

#[tokio::test]
async fn render_missing_variable_is_400_naming_it() {
    let (_dir, base, _state) = spawn_test_server().await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/prompt/greeting/render"))
        .json(&serde_json::json!({"inputs": {}}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let json: serde_json::Value = resp.json().await.unwrap();
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("name"), "error was: {message}");
}

#[tokio::test]
async fn render_without_body_is_400() {
    let (_dir, base, _state) = spawn_test_server().await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/prompt/greeting/render"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn render_unknown_prompt_is_404() {
    let (_dir, base, _state) = spawn_test_server().await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/prompt/farewell/render"))
        .json(&serde_json::json!({"inputs": {}}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

// ── POST /prompt/{id}/log ────────────────────────────────────────────

#[tokio::test]
async fn log_appends_record_and_returns_it() {
    let (_dir, base, state) = spawn_test_server().await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/prompt/answer/log"))
        .json(&serde_json::json!({
            "version": "1.0.0",
            "input": {"question": "why?"},
            "response": {"text": "because"},
            "latency_ms": 12.5,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["record"]["prompt_id"], "answer");
    assert_eq!(json["record"]["latency_ms"], 12.5);

    let contents = std::fs::read_to_string(state.usage_log.path()).unwrap();
    assert_eq!(contents.lines().count(), 1);
}

#[tokio::test]
async fn log_annotates_schema_violation_but_succeeds() {
    let (_dir, base, _state) = spawn_test_server().await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/prompt/answer/log"))
        .json(&serde_json::json!({
            "version": "1.0.0",
            "response": {"wrong_shape": true},
            "latency_ms": 3.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    let note = json["record"]["metadata"]["validation_error"].as_str().unwrap();
    assert!(note.contains("text"), "note was: {note}");
}

#[tokio::test]
async fn log_missing_required_fields_is_400() {
    let (_dir, base, _state) = spawn_test_server().await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/prompt/answer/log"))
        .json(&serde_json::json!({"version": "1.0.0"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{base}/prompt/answer/log"))
        .json(&serde_json::json!({"latency_ms": 1.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn log_unresolved_pair_is_404() {
    let (_dir, base, _state) = spawn_test_server().await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/prompt/answer/log"))
        .json(&serde_json::json!({"version": "9.9.9", "latency_ms": 1.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

// ── GET /metrics ─────────────────────────────────────────────────────

#[tokio::test]
async fn metrics_without_log_returns_note() {
    let (_dir, base, _state) = spawn_test_server().await;

    let resp = reqwest::get(format!("{base}/metrics")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["metrics"], serde_json::json!({}));
    assert!(json["note"].is_string());
}

#[tokio::test]
async fn metrics_folds_logged_usage() {
    let (_dir, base, _state) = spawn_test_server().await;

    let client = reqwest::Client::new();
    for latency in [10.0, 20.0, 30.0] {
        let resp = client
            .post(format!("{base}/prompt/answer/log"))
            .json(&serde_json::json!({
                "version": "1.0.0",
                "response": {"text": "ok"},
                "latency_ms": latency,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = reqwest::get(format!("{base}/metrics")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    let summary = &json["metrics"]["answer"];
    assert_eq!(summary["count"], 3);
    assert_eq!(summary["avg_latency_ms"], 20.0);
    assert_eq!(summary["latest_version"], "1.0.0");
    assert!(summary["last_seen"].is_string());
}
