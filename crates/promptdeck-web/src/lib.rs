//! HTTP binding for the promptdeck prompt registry.
//!
//! Exposes the core registry over a small axum API:
//!
//! ```text
//! GET  /health                   → {status, prompts_dir_exists}
//! GET  /prompt/{id}?version=V    → full definition (404 if unresolved)
//! POST /prompt/{id}/render       → {rendered}
//! POST /prompt/{id}/log          → {status: "ok", record}
//! GET  /metrics                  → {metrics: {id: summary}}
//! ```
//!
//! The registry loads once before the server starts and is shared
//! read-only across workers; the append-only usage log is the single
//! mutable resource.
//!
//! # Quick start
//!
//! ```ignore
//! use promptdeck_web::{AppState, build_router, start_server};
//!
//! let state = AppState::load("prompts", "prompt_usage.jsonl");
//! let addr = start_server(build_router(state), ([127, 0, 0, 1], 0).into()).await?;
//! println!("API at http://{addr}");
//! ```

mod api;
mod server;

pub use api::AppState;
pub use server::{build_router, serve, start_server};
