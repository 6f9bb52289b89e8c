//! Fieldvox Transcribe crate - speech-to-text on both sides of the wire.
//!
//! `HttpTranscriber` is the client the dialogue engine uses to send answer
//! clips to `POST /transcribe_audio`. `SpeechToText` is the engine that
//! answers those requests on the server, with a mock implementation for
//! running without a model.

use std::future::Future;

use serde::Serialize;

use fieldvox_core::error::FieldvoxError;

pub mod client;
pub mod wav;

pub use client::HttpTranscriber;

// =============================================================================
// Result types
// =============================================================================

/// The result of transcribing one uploaded clip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionResult {
    /// Full transcribed text.
    pub text: String,
    /// Detected or specified language.
    pub language: String,
    /// Audio duration in seconds, 0 when the container is not understood.
    pub duration_secs: f32,
}

// =============================================================================
// Trait
// =============================================================================

/// Server-side speech-to-text engine.
pub trait SpeechToText: Send + Sync {
    /// Transcribe an encoded audio upload.
    ///
    /// # Arguments
    /// * `audio` - The uploaded file bytes.
    /// * `content_type` - MIME type reported by the client, e.g. `audio/wav`.
    fn transcribe(
        &self,
        audio: &[u8],
        content_type: &str,
    ) -> impl Future<Output = Result<TranscriptionResult, FieldvoxError>> + Send;
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Mock engine that returns a fixed transcript.
///
/// Used for development and tests without a speech model. The reported
/// duration comes from the WAV header when the upload has one.
#[derive(Debug, Clone)]
pub struct MockSpeechToText {
    text: String,
}

impl Default for MockSpeechToText {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSpeechToText {
    pub fn new() -> Self {
        Self::with_text("[mock transcription]")
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl SpeechToText for MockSpeechToText {
    async fn transcribe(
        &self,
        audio: &[u8],
        content_type: &str,
    ) -> Result<TranscriptionResult, FieldvoxError> {
        if audio.is_empty() {
            return Err(FieldvoxError::TranscriptionService(
                "Cannot transcribe empty audio data".to_string(),
            ));
        }

        let duration_secs = wav::wav_duration(audio)
            .map(|d| d.as_secs_f32())
            .unwrap_or(0.0);

        tracing::debug!(
            bytes = audio.len(),
            content_type = %content_type,
            duration_secs = duration_secs,
            "Mock transcription generated"
        );

        Ok(TranscriptionResult {
            text: self.text.clone(),
            language: "en".to_string(),
            duration_secs,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
