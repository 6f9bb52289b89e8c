//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use fieldvox_command::CommandFieldExtractor;
use fieldvox_core::config::FieldvoxConfig;
use fieldvox_core::error::Result;
use fieldvox_core::types::Schedule;
use fieldvox_transcribe::SpeechToText;

/// Shared application state, generic over the speech-to-text engine.
///
/// All fields use `Arc` for cheap cloning across handler tasks. Nothing here
/// is mutated after startup.
pub struct AppState<E> {
    /// Application configuration.
    pub config: Arc<FieldvoxConfig>,
    /// Field schedule used by `/extract` and `/schedule`.
    pub schedule: Arc<Schedule>,
    /// Compiled extractor for the schedule.
    pub extractor: Arc<CommandFieldExtractor>,
    /// Engine behind `/transcribe_audio`.
    pub engine: Arc<E>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl<E> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            schedule: Arc::clone(&self.schedule),
            extractor: Arc::clone(&self.extractor),
            engine: Arc::clone(&self.engine),
            start_time: self.start_time,
        }
    }
}

impl<E: SpeechToText> AppState<E> {
    /// Build state from a validated configuration.
    pub fn new(config: FieldvoxConfig, engine: E) -> Result<Self> {
        let schedule = config.schedule()?;
        let extractor = CommandFieldExtractor::new(schedule.clone());
        Ok(Self {
            config: Arc::new(config),
            schedule: Arc::new(schedule),
            extractor: Arc::new(extractor),
            engine: Arc::new(engine),
            start_time: Instant::now(),
        })
    }
}
