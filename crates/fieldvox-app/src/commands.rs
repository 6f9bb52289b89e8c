//! Subcommand bodies, kept out of `main` so they can be driven from tests.

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use fieldvox_command::{CommandFieldExtractor, Fragment, ListeningSession};
use fieldvox_core::config::FieldvoxConfig;
use fieldvox_core::device::AudioDeviceLock;
use fieldvox_core::error::Result;
use fieldvox_core::events::DialogueEvent;
use fieldvox_core::types::{ExtractionResult, FieldRecord, Schedule};
use fieldvox_core::voice::AudioRecorder;
use fieldvox_dialogue::{DialogueController, DialogueOutcome, DialogueSettings};
use fieldvox_transcribe::HttpTranscriber;

use crate::console::{ClipDirRecorder, ConsoleSynthesizer, SilenceRecorder};

/// A blank form for `schedule` with the extracted values written in.
pub fn fill_form(schedule: &Schedule, result: &ExtractionResult) -> FieldRecord {
    let mut record = FieldRecord::blank(schedule.fields());
    record.apply(result);
    record
}

/// One-shot command extraction.
pub fn run_extract(config: &FieldvoxConfig, transcript: &str) -> Result<FieldRecord> {
    let schedule = config.schedule()?;
    let extractor = CommandFieldExtractor::new(schedule.clone());
    let result = extractor.extract(transcript);

    let missing = result.missing(&schedule);
    if !missing.is_empty() {
        tracing::info!(missing = ?missing, "Some fields were not mentioned");
    }
    Ok(fill_form(&schedule, &result))
}

/// Feed `input` line by line into a listening session until the stop phrase
/// or end of input.
pub fn run_listen<R: BufRead>(config: &FieldvoxConfig, input: R) -> Result<FieldRecord> {
    let schedule = config.schedule()?;
    let mut session = ListeningSession::new(
        CommandFieldExtractor::new(schedule.clone()),
        &config.listening.stop_phrase,
        AudioDeviceLock::new(),
    )?;
    session.start()?;

    for line in input.lines() {
        if let Some(result) = session.push_fragment(Fragment::final_text(line?))? {
            return Ok(fill_form(&schedule, &result));
        }
    }

    tracing::debug!("End of input, stopping listening session");
    let result = session.stop()?;
    Ok(fill_form(&schedule, &result))
}

/// Run a guided interview in the terminal.
pub async fn run_interview(
    config: &FieldvoxConfig,
    endpoint: Option<&str>,
    clips: Option<&Path>,
) -> Result<DialogueOutcome> {
    let transcriber = match endpoint {
        Some(url) => HttpTranscriber::new(url, config.transcription.timeout())?,
        None => HttpTranscriber::from_config(&config.transcription)?,
    };
    tracing::info!(url = %transcriber.url(), "Using transcription service");

    let settings = DialogueSettings::from_config(config);
    match clips {
        Some(dir) => interview(settings, ClipDirRecorder::new(dir)?, transcriber).await,
        None => interview(settings, SilenceRecorder::default(), transcriber).await,
    }
}

async fn interview<R: AudioRecorder + 'static>(
    settings: DialogueSettings,
    recorder: R,
    transcriber: HttpTranscriber,
) -> Result<DialogueOutcome> {
    let total = settings.questions.len();
    let controller = Arc::new(DialogueController::new(
        settings,
        ConsoleSynthesizer,
        recorder,
        transcriber,
        AudioDeviceLock::new(),
    ));

    let mut events = controller.subscribe();
    let indicator = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = status_line(&event, total) {
                        eprintln!("{}", line);
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let ctrl_c = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                controller.cancel();
            }
        })
    };

    let outcome = controller.start().await;

    ctrl_c.abort();
    let _ = ctrl_c.await;
    drop(controller);
    let _ = indicator.await;

    outcome
}

/// Text for the status indicator, if the event warrants one.
pub fn status_line(event: &DialogueEvent, total: usize) -> Option<String> {
    match event {
        DialogueEvent::RecordingStarted { index, .. } => {
            Some(format!("[{}/{}] recording...", index + 1, total))
        }
        DialogueEvent::RecordingStopped { index, .. } => {
            Some(format!("[{}/{}] transcribing...", index + 1, total))
        }
        DialogueEvent::AnswerRecorded { index, text, .. } => {
            Some(format!("[{}/{}] heard: {}", index + 1, total, text))
        }
        DialogueEvent::Failed { error, .. } => Some(format!("stopped: {}", error)),
        _ => None,
    }
}
