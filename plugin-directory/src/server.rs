//! HTTP boundary of the directory.

use crate::cache::{PluginCache, PluginSource};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Build the router serving the plugin list out of `cache`.
///
/// When `static_dir` is set, every path without a matching route is served
/// from there, with `index.html` as the fallback for client side routes.
pub fn router<S: PluginSource>(cache: Arc<PluginCache<S>>, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/api/plugins", get(get_plugins::<S>))
        .route("/health", get(health::<S>))
        .with_state(cache);

    let router = match static_dir {
        Some(dir) => {
            let index = ServeFile::new(dir.join("index.html"));
            router.fallback_service(ServeDir::new(dir).fallback(index))
        }
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

async fn get_plugins<S: PluginSource>(State(cache): State<Arc<PluginCache<S>>>) -> Response {
    match cache.get_plugins().await {
        Ok(served) => {
            tracing::debug!("Serving plugin list ({:?})", served.freshness);

            (
                [(header::CONTENT_TYPE, "application/json")],
                served.document.body().clone(),
            )
                .into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Failed to fetch plugins",
                "message": err.to_string(),
            })),
        )
            .into_response(),
    }
}

async fn health<S: PluginSource>(State(cache): State<Arc<PluginCache<S>>>) -> impl IntoResponse {
    let state = cache.state().await;

    Json(json!({
        "status": "ok",
        "cache": state.name(),
        "cache_age_secs": state.age().map(|age| age.as_secs()),
    }))
}

/// Bind to `addr`, returning the listener and the address actually bound
/// (useful when the port is 0).
pub async fn bind(addr: SocketAddr) -> std::io::Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;

    Ok((listener, local))
}

/// Serve `router` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}
