use thiserror::Error;

/// Top-level error type for Fieldvox.
///
/// Extraction misses and keywords without a usable value are deliberately
/// absent here: they surface as missing entries in an `ExtractionResult`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FieldvoxError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The platform declined microphone (or location) access.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The platform has no speech capability. Raised before any session starts.
    #[error("Speech recognition unavailable: {0}")]
    RecognitionUnavailable(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Speech synthesis error: {0}")]
    Speech(String),

    #[error("Transcription service error: {0}")]
    TranscriptionService(String),

    #[error("Transcription timed out after {secs}s")]
    TranscriptionTimeout { secs: u64 },

    #[error("Dialogue error: {0}")]
    Dialogue(String),

    #[error("Listening error: {0}")]
    Listening(String),

    #[error("Audio device is in use by another session")]
    DeviceBusy,

    #[error("Session cancelled")]
    Cancelled,

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for FieldvoxError {
    fn from(err: toml::de::Error) -> Self {
        FieldvoxError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for FieldvoxError {
    fn from(err: toml::ser::Error) -> Self {
        FieldvoxError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for FieldvoxError {
    fn from(err: serde_json::Error) -> Self {
        FieldvoxError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Fieldvox operations.
pub type Result<T> = std::result::Result<T, FieldvoxError>;
