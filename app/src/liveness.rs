//! Liveness endpoint proving the process is up.
//!
//! The handlers have no access to scan state.

use axum::{http::StatusCode, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Router serving `/` and `/health`.
pub fn router() -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
}

/// Serve the liveness router on `listener` until `cancel` fires.
///
/// # Errors
/// Returns error if the server fails while accepting connections.
pub async fn serve(listener: TcpListener, cancel: CancellationToken) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Liveness endpoint listening on {addr}");
    }
    axum::serve(listener, router())
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
}

async fn root_handler() -> &'static str {
    "Bot is running!"
}

async fn health_handler() -> Result<Json<Value>, StatusCode> {
    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_root_handler() {
        assert_eq!(root_handler().await, "Bot is running!");
    }

    #[tokio::test]
    async fn test_health_handler() {
        let Json(body) = health_handler().await.expect("health ok");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
