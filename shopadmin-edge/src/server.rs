//! Router assembly and the listening loop.

use axum::{Json, Router, middleware, routing::get};
use serde_json::{Value, json};
use shared::config::ConsoleConfig;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::{
    filter::{EdgeFilter, enforce_session_cookie},
    tracer::create_trace_layer,
};

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the edge application.
///
/// Console pages are served from `edge.pages_dir`; a directory request
/// serves its `index.html`. The session filter runs before any page.
pub fn build_router(config: &ConsoleConfig) -> Router {
    let filter = EdgeFilter::from_config(&config.session);
    let pages = ServeDir::new(&config.edge.pages_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/healthz", get(healthz))
        .fallback_service(pages)
        .layer(middleware::from_fn_with_state(filter, enforce_session_cookie))
        .layer(create_trace_layer())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down edge server");
}

/// Serves the edge application on an already bound listener until Ctrl+C.
///
/// # Errors
/// Returns an error if the server fails while running.
pub async fn serve(listener: TcpListener, config: &ConsoleConfig) -> anyhow::Result<()> {
    let app = build_router(config);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Binds `edge.port` on all interfaces and serves until Ctrl+C.
///
/// # Errors
/// Returns an error if the port cannot be bound or the server fails.
pub async fn run(config: &ConsoleConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.edge.port));
    let listener = TcpListener::bind(addr).await?;
    info!(
        %addr,
        pages = %config.edge.pages_dir.display(),
        protected = %config.session.protected_prefix,
        "edge server listening"
    );
    serve(listener, config).await
}
