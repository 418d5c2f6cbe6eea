//! Axum server setup and router construction.

use std::net::SocketAddr;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{self, AppState};

/// Build the full axum router.
///
/// Routes:
/// - `GET /health`
/// - `GET /prompt/{id}` (optional `?version=`)
/// - `POST /prompt/{id}/render`
/// - `POST /prompt/{id}/log`
/// - `GET /metrics`
pub fn build_router(state: AppState) -> Router {
    // Permissive CORS: the API carries no credentials or auth.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::get_health))
        .route("/prompt/{id}", get(api::get_prompt))
        .route("/prompt/{id}/render", post(api::post_render))
        .route("/prompt/{id}/log", post(api::post_log))
        .route("/metrics", get(api::get_metrics))
        .with_state(state)
        .layer(cors)
}

/// Bind and serve until the process exits.
pub async fn serve(router: Router, bind_addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Serving on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await
}

/// Start the server on a background task and return the bound address.
///
/// Used by integration tests (bind to port 0 for a random free port).
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!("Server error: {e}");
        }
    });

    Ok(addr)
}
