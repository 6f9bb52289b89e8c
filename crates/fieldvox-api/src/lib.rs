//! Fieldvox API crate - axum HTTP server for transcription and extraction.
//!
//! Serves the transcription endpoint the dialogue engine uploads answer clips
//! to, plus command extraction, the field schedule and a health check.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, serve, start_server};
pub use state::AppState;
