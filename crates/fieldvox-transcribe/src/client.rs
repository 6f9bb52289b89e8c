//! HTTP client for the remote transcription service.

use std::time::Duration;

use reqwest::multipart::{Form, Part};

use fieldvox_core::config::TranscriptionConfig;
use fieldvox_core::error::{FieldvoxError, Result};
use fieldvox_core::types::AudioClip;
use fieldvox_core::voice::Transcriber;

/// Uploads answer clips to `POST {endpoint}/transcribe_audio`.
#[derive(Debug, Clone)]
pub struct HttpTranscriber {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpTranscriber {
    /// Create a client for the service rooted at `endpoint`, with `timeout`
    /// applied to the whole request.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FieldvoxError::TranscriptionService(e.to_string()))?;
        Ok(Self {
            url: format!("{}/transcribe_audio", endpoint.trim_end_matches('/')),
            timeout,
            client,
        })
    }

    pub fn from_config(config: &TranscriptionConfig) -> Result<Self> {
        Self::new(&config.endpoint, config.timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_send_error(&self, e: reqwest::Error) -> FieldvoxError {
        if e.is_timeout() {
            FieldvoxError::TranscriptionTimeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            FieldvoxError::TranscriptionService(e.to_string())
        }
    }
}

impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, clip: &AudioClip) -> Result<Option<String>> {
        let part = Part::bytes(clip.bytes.clone())
            .file_name(clip.file_name())
            .mime_str(&clip.content_type)
            .map_err(|e| FieldvoxError::TranscriptionService(e.to_string()))?;
        let form = Form::new().part("audio", part);

        tracing::debug!(
            url = %self.url,
            bytes = clip.bytes.len(),
            content_type = %clip.content_type,
            "Uploading clip for transcription"
        );

        let res = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(FieldvoxError::TranscriptionService(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let json: serde_json::Value = res.json().await.map_err(|e| self.map_send_error(e))?;
        let transcript = json
            .get("transcript")
            .and_then(|t| t.as_str())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        if transcript.is_none() {
            tracing::debug!("Transcription service returned no transcript");
        }
        Ok(transcript)
    }
}
