//! Terminal stand-ins for the platform voice collaborators.
//!
//! Questions are printed instead of spoken, and answers come either from
//! recorded silence or from a directory of pre-recorded clips.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use fieldvox_core::error::{FieldvoxError, Result};
use fieldvox_core::types::AudioClip;
use fieldvox_core::voice::{AudioRecorder, SpeechSynthesizer};
use fieldvox_transcribe::wav;

/// "Speaks" by printing to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSynthesizer;

impl SpeechSynthesizer for ConsoleSynthesizer {
    async fn speak(&self, text: &str) -> Result<()> {
        println!("> {}", text);
        Ok(())
    }
}

/// Records silence for however long the window stays open.
#[derive(Debug)]
pub struct SilenceRecorder {
    sample_rate: u32,
    started: Mutex<Option<Instant>>,
}

impl SilenceRecorder {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            started: Mutex::new(None),
        }
    }
}

impl Default for SilenceRecorder {
    fn default() -> Self {
        Self::new(16000)
    }
}

impl AudioRecorder for SilenceRecorder {
    async fn start(&self) -> Result<()> {
        let mut started = self
            .started
            .lock()
            .map_err(|e| FieldvoxError::Capture(format!("Recorder mutex poisoned: {}", e)))?;
        *started = Some(Instant::now());
        Ok(())
    }

    async fn stop(&self) -> Result<AudioClip> {
        let started = self
            .started
            .lock()
            .map_err(|e| FieldvoxError::Capture(format!("Recorder mutex poisoned: {}", e)))?
            .take()
            .ok_or_else(|| FieldvoxError::Capture("Recorder was not started".to_string()))?;
        let duration = started.elapsed();
        Ok(AudioClip::new(
            wav::silence(duration, self.sample_rate),
            "audio/wav",
            duration,
        ))
    }
}

/// Plays back pre-recorded answer clips from a directory, one per question,
/// in file name order.
#[derive(Debug)]
pub struct ClipDirRecorder {
    clips: Vec<PathBuf>,
    next: AtomicUsize,
}

impl ClipDirRecorder {
    pub fn new(dir: &Path) -> Result<Self> {
        let mut clips: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        clips.sort();

        if clips.is_empty() {
            return Err(FieldvoxError::Config(format!(
                "No answer clips found in {}",
                dir.display()
            )));
        }
        tracing::info!(dir = %dir.display(), clips = clips.len(), "Answer clips loaded");

        Ok(Self {
            clips,
            next: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("webm") => "audio/webm",
        Some("ogg") => "audio/ogg",
        Some("mp3") => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

impl AudioRecorder for ClipDirRecorder {
    async fn start(&self) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<AudioClip> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        let path = self.clips.get(n).ok_or_else(|| {
            FieldvoxError::Capture(format!("Ran out of answer clips after {}", self.clips.len()))
        })?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| FieldvoxError::Capture(format!("{}: {}", path.display(), e)))?;
        let duration = wav::wav_duration(&bytes).unwrap_or(Duration::ZERO);
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Answer clip loaded");

        Ok(AudioClip::new(bytes, content_type_for(path), duration))
    }
}
