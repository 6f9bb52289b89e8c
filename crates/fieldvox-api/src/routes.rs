//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, the upload body limit
//! and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use fieldvox_core::error::{FieldvoxError, Result};
use fieldvox_transcribe::SpeechToText;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
///
/// CORS is fully open: the recording front-end is served from a different
/// origin than this server.
pub fn create_router<E: SpeechToText + 'static>(state: AppState<E>) -> Router {
    let body_limit = state.config.server.max_body_bytes;

    Router::new()
        .route("/health", get(handlers::health::<E>))
        .route("/schedule", get(handlers::schedule::<E>))
        .route("/extract", post(handlers::extract::<E>))
        .route("/transcribe_audio", post(handlers::transcribe_audio::<E>))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API on an already bound listener until the server stops.
pub async fn serve<E: SpeechToText + 'static>(
    listener: TcpListener,
    state: AppState<E>,
) -> Result<()> {
    let router = create_router(state);
    axum::serve(listener, router)
        .await
        .map_err(|e| FieldvoxError::Api(format!("Server error: {}", e)))
}

/// Start the HTTP server on the configured host and port.
///
/// Returns after Ctrl-C once in-flight requests have finished.
pub async fn start_server<E: SpeechToText + 'static>(state: AppState<E>) -> Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);

    tracing::info!("Starting API server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| FieldvoxError::Api(format!("Failed to bind: {}", e)))?;

    let router = create_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down API server");
        })
        .await
        .map_err(|e| FieldvoxError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
