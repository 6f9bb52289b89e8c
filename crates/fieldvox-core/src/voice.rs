//! Platform voice collaborators.
//!
//! The dialogue engine drives these traits and never touches hardware or the
//! network directly. Implementations wrap whatever the host offers: a browser
//! speech API, an OS synthesizer, a microphone stream, an HTTP backend.

use std::future::Future;

use crate::error::FieldvoxError;
use crate::types::AudioClip;

/// Text-to-speech output.
pub trait SpeechSynthesizer: Send + Sync {
    /// Whether the platform can speak at all. Checked before a session starts.
    fn is_available(&self) -> bool {
        true
    }

    /// Speak `text`. The returned future resolves once the utterance has
    /// finished playing, so callers can safely start recording afterwards.
    fn speak(&self, text: &str) -> impl Future<Output = Result<(), FieldvoxError>> + Send;
}

/// Microphone capture producing one clip per start/stop pair.
pub trait AudioRecorder: Send + Sync {
    /// Begin capturing. Permission denial surfaces as
    /// [`FieldvoxError::PermissionDenied`].
    fn start(&self) -> impl Future<Output = Result<(), FieldvoxError>> + Send;

    /// Stop capturing and hand back the recorded clip.
    fn stop(&self) -> impl Future<Output = Result<AudioClip, FieldvoxError>> + Send;
}

/// Remote speech-to-text for a recorded clip.
pub trait Transcriber: Send + Sync {
    /// Transcribe a clip. `Ok(None)` means the service answered but had no
    /// transcript for it, which is not an error.
    fn transcribe(
        &self,
        clip: &AudioClip,
    ) -> impl Future<Output = Result<Option<String>, FieldvoxError>> + Send;
}
