//! Route handlers for all API endpoints.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use fieldvox_core::types::{ExtractionResult, FieldSpec, Question};
use fieldvox_transcribe::SpeechToText;

use crate::error::ApiError;
use crate::state::AppState;

const NO_AUDIO: &str = "No audio file provided";

// =============================================================================
// Transcription
// =============================================================================

/// Response body for POST /transcribe_audio.
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub transcript: String,
}

/// POST /transcribe_audio - transcribe the multipart `audio` upload.
pub async fn transcribe_audio<E: SpeechToText + 'static>(
    State(state): State<AppState<E>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Request is not multipart");
        ApiError::BadRequest(NO_AUDIO.to_string())
    })?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(multipart_error)?;
        upload = Some((bytes, content_type));
        break;
    }

    let Some((bytes, content_type)) = upload else {
        return Err(ApiError::BadRequest(NO_AUDIO.to_string()));
    };

    let result = state.engine.transcribe(&bytes, &content_type).await?;
    tracing::info!(
        bytes = bytes.len(),
        content_type = %content_type,
        duration_secs = result.duration_secs,
        text_len = result.text.len(),
        "Audio transcribed"
    );

    Ok(Json(TranscribeResponse {
        transcript: result.text,
    }))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

// =============================================================================
// Extraction
// =============================================================================

/// Request body for POST /extract.
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub transcript: String,
}

/// Response body for POST /extract.
#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    /// Found values keyed by field, in schedule order.
    pub fields: ExtractionResult,
    /// Schedule fields with no value in the transcript.
    pub missing: Vec<String>,
}

/// POST /extract - pull schedule fields out of a spoken command.
pub async fn extract<E: SpeechToText + 'static>(
    State(state): State<AppState<E>>,
    Json(req): Json<ExtractRequest>,
) -> Json<ExtractResponse> {
    let fields = state.extractor.extract(&req.transcript);
    let missing = fields
        .missing(&state.schedule)
        .into_iter()
        .map(str::to_string)
        .collect();
    Json(ExtractResponse { fields, missing })
}

// =============================================================================
// Schedule
// =============================================================================

/// Response body for GET /schedule.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub fields: Vec<FieldSpec>,
    pub questions: Vec<Question>,
}

/// GET /schedule - keyword anchors and interview questions.
pub async fn schedule<E: SpeechToText + 'static>(
    State(state): State<AppState<E>>,
) -> Json<ScheduleResponse> {
    Json(ScheduleResponse {
        fields: state.schedule.specs().to_vec(),
        questions: state.config.dialogue.questions.clone(),
    })
}

// =============================================================================
// Health
// =============================================================================

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health - liveness and uptime.
pub async fn health<E: SpeechToText + 'static>(
    State(state): State<AppState<E>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
