use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{FieldvoxError, Result};
use crate::types::{
    default_field_specs, default_questions, duplicate_question_field, FieldSpec, Question,
    Schedule,
};

/// Top-level configuration for Fieldvox.
///
/// Loaded from `~/.fieldvox/config.toml` by default. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldvoxConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub dialogue: DialogueConfig,
    #[serde(default)]
    pub listening: ListeningConfig,
    #[serde(default = "default_field_specs")]
    pub schedule: Vec<FieldSpec>,
}

impl Default for FieldvoxConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            transcription: TranscriptionConfig::default(),
            dialogue: DialogueConfig::default(),
            listening: ListeningConfig::default(),
            schedule: default_field_specs(),
        }
    }
}

impl FieldvoxConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// configured schedule is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FieldvoxConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| FieldvoxError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.schedule()?;
        if self.dialogue.questions.is_empty() {
            return Err(FieldvoxError::Config(
                "dialogue.questions must not be empty".to_string(),
            ));
        }
        if let Some(field) = duplicate_question_field(&self.dialogue.questions) {
            return Err(FieldvoxError::Config(format!(
                "dialogue.questions asks for field '{}' more than once",
                field
            )));
        }
        if self.dialogue.record_duration_ms == 0 {
            return Err(FieldvoxError::Config(
                "dialogue.record_duration_ms must be greater than 0".to_string(),
            ));
        }
        if self.transcription.timeout_secs == 0 {
            return Err(FieldvoxError::Config(
                "transcription.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.listening.stop_phrase.trim().is_empty() {
            return Err(FieldvoxError::Config(
                "listening.stop_phrase must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The validated field schedule.
    pub fn schedule(&self) -> Result<Schedule> {
        Schedule::new(self.schedule.clone())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings for the transcription backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on request bodies (audio uploads).
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Client-side settings for reaching the transcription service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Base URL; `/transcribe_audio` is appended.
    pub endpoint: String,
    /// Request timeout. Expiry fails the current dialogue.
    pub timeout_secs: u64,
    /// Answer recorded when the service returns no transcript.
    pub placeholder: String,
}

impl TranscriptionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000".to_string(),
            timeout_secs: 30,
            placeholder: "No transcription received".to_string(),
        }
    }
}

/// Scripted interview settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Fixed recording window per question. No voice activity detection.
    pub record_duration_ms: u64,
    /// Spoken once every question has been answered.
    pub closing_statement: String,
    pub questions: Vec<Question>,
}

impl DialogueConfig {
    pub fn record_duration(&self) -> Duration {
        Duration::from_millis(self.record_duration_ms)
    }
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            record_duration_ms: 5000,
            closing_statement: "Thank you. All your answers have been recorded.".to_string(),
            questions: default_questions(),
        }
    }
}

/// Continuous listening (single command) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListeningConfig {
    /// Saying this phrase ends the session and triggers parsing.
    pub stop_phrase: String,
}

impl Default for ListeningConfig {
    fn default() -> Self {
        Self {
            stop_phrase: "stop listening".to_string(),
        }
    }
}
