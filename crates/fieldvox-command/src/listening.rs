//! Continuous listening session feeding one combined transcript into the
//! command extractor.
//!
//! Lifecycle: Idle -> Listening -> Stopped. Stopping, either by the user or
//! by the stop phrase showing up in the transcript, always parses whatever
//! has been accumulated so far.

use std::fmt;

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

use fieldvox_core::device::{AudioDeviceLock, AudioLease};
use fieldvox_core::error::{FieldvoxError, Result};
use fieldvox_core::types::ExtractionResult;

use crate::extractor::CommandFieldExtractor;

/// Status of a continuous listening session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListeningStatus {
    Idle,
    Listening,
    Stopped,
}

impl fmt::Display for ListeningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListeningStatus::Idle => write!(f, "Idle"),
            ListeningStatus::Listening => write!(f, "Listening"),
            ListeningStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

/// One recognizer output. Interim fragments may still change and are
/// ignored; only final fragments are accumulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub is_final: bool,
}

impl Fragment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// A caller-owned continuous listening session.
#[derive(Debug)]
pub struct ListeningSession {
    extractor: CommandFieldExtractor,
    stop_phrase: Regex,
    device: AudioDeviceLock,
    lease: Option<AudioLease>,
    status: ListeningStatus,
    session_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    transcript: String,
    result: Option<ExtractionResult>,
}

impl ListeningSession {
    /// Create an idle session.
    ///
    /// Fails if `stop_phrase` is blank.
    pub fn new(
        extractor: CommandFieldExtractor,
        stop_phrase: &str,
        device: AudioDeviceLock,
    ) -> Result<Self> {
        let words: Vec<String> = stop_phrase.split_whitespace().map(regex::escape).collect();
        if words.is_empty() {
            return Err(FieldvoxError::Config(
                "stop phrase must not be empty".to_string(),
            ));
        }
        let stop_phrase = Regex::new(&format!(r"(?i)\b{}\b", words.join(r"\s+")))
            .map_err(|e| FieldvoxError::Config(format!("invalid stop phrase: {}", e)))?;

        Ok(Self {
            extractor,
            stop_phrase,
            device,
            lease: None,
            status: ListeningStatus::Idle,
            session_id: None,
            started_at: None,
            transcript: String::new(),
            result: None,
        })
    }

    pub fn status(&self) -> ListeningStatus {
        self.status
    }

    /// Finalized text accumulated so far, fragments joined by single spaces.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Result of the last completed session, if any.
    pub fn result(&self) -> Option<&ExtractionResult> {
        self.result.as_ref()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    /// Begin listening. Valid from Idle or Stopped; a restart discards the
    /// previous transcript and result.
    pub fn start(&mut self) -> Result<()> {
        if self.status == ListeningStatus::Listening {
            return Err(FieldvoxError::Listening(
                "Listening session is already active".to_string(),
            ));
        }
        let lease = self.device.try_acquire().ok_or(FieldvoxError::DeviceBusy)?;

        let id = Uuid::new_v4();
        self.lease = Some(lease);
        self.status = ListeningStatus::Listening;
        self.session_id = Some(id);
        self.started_at = Some(Utc::now());
        self.transcript.clear();
        self.result = None;

        tracing::info!(session_id = %id, "Listening session started");
        Ok(())
    }

    /// Feed one recognizer fragment.
    ///
    /// Returns `Some(result)` when this fragment contained the stop phrase
    /// and ended the session.
    pub fn push_fragment(&mut self, fragment: Fragment) -> Result<Option<ExtractionResult>> {
        if self.status != ListeningStatus::Listening {
            return Err(FieldvoxError::Listening(format!(
                "Cannot accept speech in {} state",
                self.status
            )));
        }
        if !fragment.is_final {
            return Ok(None);
        }

        let text = fragment.text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if !self.transcript.is_empty() {
            self.transcript.push(' ');
        }
        self.transcript.push_str(text);

        if let Some(m) = self.stop_phrase.find(&self.transcript) {
            let cut = m.start();
            self.transcript.truncate(cut);
            let kept = self.transcript.trim_end().len();
            self.transcript.truncate(kept);
            tracing::info!(
                session_id = ?self.session_id,
                "Stop phrase detected"
            );
            return self.finish().map(Some);
        }

        Ok(None)
    }

    /// Stop listening (user-triggered) and parse the transcript so far.
    pub fn stop(&mut self) -> Result<ExtractionResult> {
        if self.status != ListeningStatus::Listening {
            return Err(FieldvoxError::Listening(format!(
                "Cannot stop listening from {} state",
                self.status
            )));
        }
        self.finish()
    }

    fn finish(&mut self) -> Result<ExtractionResult> {
        self.status = ListeningStatus::Stopped;
        self.lease = None;

        let elapsed_ms = self
            .started_at
            .map(|t| (Utc::now() - t).num_milliseconds())
            .unwrap_or(0);
        let result = self.extractor.extract(&self.transcript);

        tracing::info!(
            session_id = ?self.session_id,
            elapsed_ms,
            transcript_len = self.transcript.len(),
            fields = result.len(),
            "Listening session stopped"
        );

        self.result = Some(result.clone());
        Ok(result)
    }
}

// =============================================================================
// Tests
// =============================================================================
