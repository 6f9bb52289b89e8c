//! Guided interview controller.
//!
//! The `DialogueController` asks each configured question aloud, records a
//! fixed-length answer clip, sends it for transcription and stores the text
//! against the question's field. Sessions run sequentially inside the caller's
//! task; every hardware or network step is an explicit await on one of the
//! voice collaborators.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Notify};
use uuid::Uuid;

use fieldvox_core::config::FieldvoxConfig;
use fieldvox_core::device::AudioDeviceLock;
use fieldvox_core::error::{FieldvoxError, Result};
use fieldvox_core::events::DialogueEvent;
use fieldvox_core::types::{default_questions, duplicate_question_field, FieldRecord, Question};
use fieldvox_core::voice::{AudioRecorder, SpeechSynthesizer, Transcriber};

use crate::session::DialogueSession;
use crate::state::{DialogueStatus, StateMachine};

const EVENT_CAPACITY: usize = 64;

/// Tunables for a dialogue run.
#[derive(Debug, Clone)]
pub struct DialogueSettings {
    pub questions: Vec<Question>,
    /// Fixed recording window per answer. There is no silence detection.
    pub record_duration: Duration,
    pub transcription_timeout: Duration,
    /// Stored as the answer when the service returns no transcript.
    pub placeholder: String,
    pub closing_statement: String,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            questions: default_questions(),
            record_duration: Duration::from_millis(5000),
            transcription_timeout: Duration::from_secs(30),
            placeholder: "No transcription received".to_string(),
            closing_statement: "Thank you. All your answers have been recorded.".to_string(),
        }
    }
}

impl DialogueSettings {
    pub fn from_config(config: &FieldvoxConfig) -> Self {
        Self {
            questions: config.dialogue.questions.clone(),
            record_duration: config.dialogue.record_duration(),
            transcription_timeout: config.transcription.timeout(),
            placeholder: config.transcription.placeholder.clone(),
            closing_statement: config.dialogue.closing_statement.clone(),
        }
    }
}

/// How a call to [`DialogueController::start`] ended.
#[derive(Debug)]
pub enum DialogueOutcome {
    /// Every question was answered.
    Completed {
        session_id: Uuid,
        answers: FieldRecord,
    },
    /// The session halted. `answers` holds whatever was collected first.
    Failed {
        session_id: Uuid,
        answers: FieldRecord,
        error: FieldvoxError,
    },
    /// A session was already running, or the audio device was held
    /// elsewhere. Nothing changed.
    AlreadyActive,
}

impl DialogueOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, DialogueOutcome::Completed { .. })
    }

    pub fn answers(&self) -> Option<&FieldRecord> {
        match self {
            DialogueOutcome::Completed { answers, .. } | DialogueOutcome::Failed { answers, .. } => {
                Some(answers)
            }
            DialogueOutcome::AlreadyActive => None,
        }
    }
}

/// Drives question/answer sessions over the voice collaborators.
pub struct DialogueController<S, R, T> {
    settings: DialogueSettings,
    synthesizer: S,
    recorder: R,
    transcriber: T,
    device: AudioDeviceLock,
    state_machine: StateMachine,
    session: Mutex<Option<DialogueSession>>,
    events: broadcast::Sender<DialogueEvent>,
    cancel_requested: AtomicBool,
    cancel_notify: Notify,
}

impl<S, R, T> std::fmt::Debug for DialogueController<S, R, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueController")
            .field("settings", &self.settings)
            .field("state_machine", &self.state_machine)
            .field("session", &self.session)
            .finish()
    }
}

impl<S, R, T> DialogueController<S, R, T>
where
    S: SpeechSynthesizer,
    R: AudioRecorder,
    T: Transcriber,
{
    pub fn new(
        settings: DialogueSettings,
        synthesizer: S,
        recorder: R,
        transcriber: T,
        device: AudioDeviceLock,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            settings,
            synthesizer,
            recorder,
            transcriber,
            device,
            state_machine: StateMachine::new(),
            session: Mutex::new(None),
            events,
            cancel_requested: AtomicBool::new(false),
            cancel_notify: Notify::new(),
        }
    }

    pub fn settings(&self) -> &DialogueSettings {
        &self.settings
    }

    pub fn status(&self) -> DialogueStatus {
        self.state_machine.current()
    }

    /// Snapshot of the current or most recent session.
    pub fn session(&self) -> Option<DialogueSession> {
        let guard = self.session.lock().ok()?;
        guard.as_ref().map(|s| {
            let mut snapshot = s.clone();
            snapshot.status = self.state_machine.current();
            snapshot
        })
    }

    /// Subscribe to progress events for the status indicator.
    pub fn subscribe(&self) -> broadcast::Receiver<DialogueEvent> {
        self.events.subscribe()
    }

    /// Ask the active session to stop at its next suspension point.
    ///
    /// Returns `false` if no session is active.
    pub fn cancel(&self) -> bool {
        let requested = self
            .state_machine
            .while_active(|| self.cancel_requested.store(true, Ordering::SeqCst));
        if requested {
            tracing::info!("Dialogue cancellation requested");
            self.cancel_notify.notify_waiters();
        }
        requested
    }

    /// Run one full interview.
    ///
    /// Returns `Ok(AlreadyActive)` without touching anything if a session is
    /// running. Collaborator failures end the session and are reported through
    /// [`DialogueOutcome::Failed`], not as `Err`.
    pub async fn start(&self) -> Result<DialogueOutcome> {
        if !self.synthesizer.is_available() {
            tracing::warn!("Speech synthesis unavailable, dialogue not started");
            return Err(FieldvoxError::RecognitionUnavailable(
                "speech synthesis is not supported on this platform".to_string(),
            ));
        }

        // A stale request from an earlier session is cleared under the same
        // lock that makes this one active.
        let Some(previous) = self
            .state_machine
            .try_begin_with(|| self.cancel_requested.store(false, Ordering::SeqCst))
        else {
            tracing::info!(
                state = %self.state_machine.current(),
                "Dialogue already active, ignoring start"
            );
            return Ok(DialogueOutcome::AlreadyActive);
        };
        let Some(lease) = self.device.try_acquire() else {
            self.state_machine.restore(previous);
            tracing::info!("Audio device in use, ignoring start");
            return Ok(DialogueOutcome::AlreadyActive);
        };
        let _abandoned = AbandonGuard {
            state_machine: &self.state_machine,
        };

        let session = DialogueSession::new();
        let session_id = session.id;
        self.store_session(session)?;

        tracing::info!(
            session_id = %session_id,
            questions = self.settings.questions.len(),
            "Dialogue session started"
        );
        self.emit(DialogueEvent::SessionStarted {
            session_id,
            question_count: self.settings.questions.len(),
            timestamp: Utc::now(),
        });

        let run = self.run_questions(session_id).await;
        let answers = self.answers_record();

        let outcome = match run {
            Ok(()) => {
                // Closing statement is courtesy only
                if let Err(e) = self.synthesizer.speak(&self.settings.closing_statement).await {
                    tracing::warn!(session_id = %session_id, error = %e, "Closing statement failed");
                }
                tracing::info!(
                    session_id = %session_id,
                    answers = answers.len(),
                    "Dialogue session completed"
                );
                self.emit(DialogueEvent::Completed {
                    session_id,
                    answer_count: answers.len(),
                    timestamp: Utc::now(),
                });
                DialogueOutcome::Completed {
                    session_id,
                    answers,
                }
            }
            Err(error) => {
                self.state_machine.fail();
                let index = self.current_index();
                tracing::error!(
                    session_id = %session_id,
                    question = index,
                    answers = answers.len(),
                    error = %error,
                    "Dialogue session failed"
                );
                self.emit(DialogueEvent::Failed {
                    session_id,
                    index,
                    error: error.to_string(),
                    timestamp: Utc::now(),
                });
                DialogueOutcome::Failed {
                    session_id,
                    answers,
                    error,
                }
            }
        };

        drop(lease);
        Ok(outcome)
    }

    async fn run_questions(&self, session_id: Uuid) -> Result<()> {
        let total = self.settings.questions.len();
        if total == 0 {
            return Err(FieldvoxError::Dialogue("No questions configured".to_string()));
        }
        if let Some(field) = duplicate_question_field(&self.settings.questions) {
            return Err(FieldvoxError::Dialogue(format!(
                "Field '{}' is asked for by more than one question",
                field
            )));
        }

        for (index, question) in self.settings.questions.iter().enumerate() {
            if index > 0 {
                self.state_machine.transition(DialogueStatus::Asking)?;
            }

            // Asking
            tracing::debug!(session_id = %session_id, index, field = %question.field, "Asking question");
            self.until_cancelled(self.synthesizer.speak(&question.prompt))
                .await??;
            self.emit(DialogueEvent::QuestionAsked {
                session_id,
                index,
                prompt: question.prompt.clone(),
            });

            // Recording
            self.state_machine.transition(DialogueStatus::Recording)?;
            self.recorder.start().await?;
            self.emit(DialogueEvent::RecordingStarted { session_id, index });

            let window = self
                .until_cancelled(tokio::time::sleep(self.settings.record_duration))
                .await;
            let clip = self.recorder.stop().await;
            window?;
            let clip = clip?;
            tracing::debug!(
                session_id = %session_id,
                index,
                bytes = clip.bytes.len(),
                "Answer recorded"
            );
            self.emit(DialogueEvent::RecordingStopped {
                session_id,
                index,
                bytes: clip.bytes.len(),
            });

            // Transcribing
            self.state_machine.transition(DialogueStatus::Transcribing)?;
            let timeout = self.settings.transcription_timeout;
            let transcript = self
                .until_cancelled(tokio::time::timeout(
                    timeout,
                    self.transcriber.transcribe(&clip),
                ))
                .await?
                .map_err(|_| FieldvoxError::TranscriptionTimeout {
                    secs: timeout.as_secs(),
                })??;

            let text = match transcript {
                Some(t) if !t.trim().is_empty() => t.trim().to_string(),
                _ => {
                    tracing::debug!(session_id = %session_id, index, "No transcript, using placeholder");
                    self.settings.placeholder.clone()
                }
            };

            self.record_answer(question, &text)?;
            tracing::info!(
                session_id = %session_id,
                index,
                field = %question.field,
                text_len = text.len(),
                "Answer transcribed"
            );
            self.emit(DialogueEvent::AnswerRecorded {
                session_id,
                index,
                field: question.field.clone(),
                text,
            });

            if index + 1 == total {
                self.state_machine.transition(DialogueStatus::Completed)?;
            }
        }

        Ok(())
    }

    /// Race `fut` against a cancel request.
    async fn until_cancelled<F: Future>(&self, fut: F) -> Result<F::Output> {
        tokio::select! {
            out = fut => Ok(out),
            _ = self.cancelled() => Err(FieldvoxError::Cancelled),
        }
    }

    async fn cancelled(&self) {
        loop {
            let notified = self.cancel_notify.notified();
            if self.cancel_requested.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }

    fn store_session(&self, session: DialogueSession) -> Result<()> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| FieldvoxError::Dialogue(format!("Session mutex poisoned: {}", e)))?;
        *guard = Some(session);
        Ok(())
    }

    fn record_answer(&self, question: &Question, text: &str) -> Result<()> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| FieldvoxError::Dialogue(format!("Session mutex poisoned: {}", e)))?;
        let session = guard
            .as_mut()
            .ok_or_else(|| FieldvoxError::Dialogue("No active session".to_string()))?;
        session.record_answer(question, text);
        Ok(())
    }

    fn current_index(&self) -> usize {
        self.session
            .lock()
            .ok()
            .and_then(|g| g.as_ref().map(|s| s.current_index))
            .unwrap_or(0)
    }

    fn answers_record(&self) -> FieldRecord {
        self.session
            .lock()
            .ok()
            .and_then(|g| g.as_ref().map(DialogueSession::answers_record))
            .unwrap_or_default()
    }

    fn emit(&self, event: DialogueEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Moves the machine to `Failed` if `start` is dropped mid-session, so the
/// next start is not refused.
struct AbandonGuard<'a> {
    state_machine: &'a StateMachine,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if self.state_machine.current().is_active() {
            tracing::warn!(
                state = %self.state_machine.current(),
                "Dialogue abandoned mid-session"
            );
            self.state_machine.fail();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use fieldvox_core::types::AudioClip;

    #[derive(Clone, Default)]
    struct ScriptedSynthesizer {
        spoken: Arc<Mutex<Vec<String>>>,
        unavailable: bool,
    }

    impl ScriptedSynthesizer {
        fn spoken(&self) -> Vec<String> {
            self.spoken.lock().unwrap().clone()
        }
    }

    impl SpeechSynthesizer for ScriptedSynthesizer {
        fn is_available(&self) -> bool {
            !self.unavailable
        }

        async fn speak(&self, text: &str) -> Result<()> {
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct CountingRecorder {
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
        deny: bool,
    }

    impl AudioRecorder for CountingRecorder {
        async fn start(&self) -> Result<()> {
            if self.deny {
                return Err(FieldvoxError::PermissionDenied("microphone".to_string()));
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> Result<AudioClip> {
            let n = self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(AudioClip::new(
                vec![n as u8; 16],
                "audio/wav",
                Duration::from_millis(20),
            ))
        }
    }

    /// Answers clip `n` with `script[n]`; calls past the end return `None`.
    /// Scripted errors are `Err(message)`.
    #[derive(Clone)]
    struct ScriptedTranscriber {
        script: Arc<Vec<std::result::Result<Option<String>, String>>>,
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl ScriptedTranscriber {
        fn new(script: Vec<std::result::Result<Option<String>, String>>) -> Self {
            Self {
                script: Arc::new(script),
                calls: Arc::new(AtomicUsize::new(0)),
                delay: Duration::ZERO,
            }
        }
    }

    impl Transcriber for ScriptedTranscriber {
        async fn transcribe(&self, clip: &AudioClip) -> Result<Option<String>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(clip.bytes[0] as usize, n, "clips must arrive in order");
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.script.get(n) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(message)) => Err(FieldvoxError::TranscriptionService(message.clone())),
                None => Ok(None),
            }
        }
    }

    type TestController =
        DialogueController<ScriptedSynthesizer, CountingRecorder, ScriptedTranscriber>;

    struct Harness {
        controller: Arc<TestController>,
        synth: ScriptedSynthesizer,
        recorder: CountingRecorder,
        transcriber: ScriptedTranscriber,
        device: AudioDeviceLock,
    }

    fn three_questions() -> Vec<Question> {
        vec![
            Question::new("landArea", "What is the land area?"),
            Question::new("previousCrop", "What was the previous crop?"),
            Question::new("state", "Which state is the farm in?"),
        ]
    }

    fn settings(record_ms: u64) -> DialogueSettings {
        DialogueSettings {
            questions: three_questions(),
            record_duration: Duration::from_millis(record_ms),
            transcription_timeout: Duration::from_secs(5),
            ..DialogueSettings::default()
        }
    }

    fn harness_with(
        settings: DialogueSettings,
        synth: ScriptedSynthesizer,
        recorder: CountingRecorder,
        transcriber: ScriptedTranscriber,
    ) -> Harness {
        let device = AudioDeviceLock::new();
        let controller = Arc::new(DialogueController::new(
            settings,
            synth.clone(),
            recorder.clone(),
            transcriber.clone(),
            device.clone(),
        ));
        Harness {
            controller,
            synth,
            recorder,
            transcriber,
            device,
        }
    }

    fn harness(transcriber: ScriptedTranscriber) -> Harness {
        harness_with(
            settings(10),
            ScriptedSynthesizer::default(),
            CountingRecorder::default(),
            transcriber,
        )
    }

    fn ok(text: &str) -> std::result::Result<Option<String>, String> {
        Ok(Some(text.to_string()))
    }

    #[tokio::test]
    async fn test_all_questions_answered() {
        let h = harness(ScriptedTranscriber::new(vec![
            ok("five acres"),
            ok(" wheat "),
            ok("Punjab"),
        ]));

        let outcome = h.controller.start().await.unwrap();
        let DialogueOutcome::Completed { answers, .. } = outcome else {
            panic!("expected completion, got {:?}", outcome);
        };

        assert_eq!(answers.len(), 3);
        assert_eq!(answers.get("landArea"), Some("five acres"));
        assert_eq!(answers.get("previousCrop"), Some("wheat"));
        assert_eq!(answers.get("state"), Some("Punjab"));
        assert_eq!(h.recorder.starts.load(Ordering::SeqCst), 3);
        assert_eq!(h.transcriber.calls.load(Ordering::SeqCst), 3);
        assert_eq!(h.controller.status(), DialogueStatus::Completed);

        let spoken = h.synth.spoken();
        assert_eq!(spoken.len(), 4);
        assert_eq!(spoken[0], "What is the land area?");
        assert_eq!(spoken[3], h.controller.settings().closing_statement);

        let session = h.controller.session().unwrap();
        assert_eq!(session.current_index, 3);
        assert_eq!(session.status, DialogueStatus::Completed);
        assert!(!h.device.is_in_use());
    }

    #[tokio::test]
    async fn test_transcription_failure_stops_session() {
        let h = harness(ScriptedTranscriber::new(vec![
            ok("five acres"),
            Err("HTTP 500".to_string()),
            ok("Punjab"),
        ]));

        let outcome = h.controller.start().await.unwrap();
        let DialogueOutcome::Failed { answers, error, .. } = outcome else {
            panic!("expected failure, got {:?}", outcome);
        };

        assert!(matches!(error, FieldvoxError::TranscriptionService(_)));
        assert_eq!(answers.len(), 1);
        assert_eq!(answers.get("landArea"), Some("five acres"));
        assert_eq!(h.controller.status(), DialogueStatus::Failed);

        // Question 3 never asked, no closing statement
        let spoken = h.synth.spoken();
        assert_eq!(spoken.len(), 2);
        assert!(!spoken.iter().any(|s| s.contains("state")));
        assert_eq!(h.recorder.starts.load(Ordering::SeqCst), 2);
        assert!(!h.device.is_in_use());
    }

    #[tokio::test]
    async fn test_missing_transcript_uses_placeholder() {
        let h = harness(ScriptedTranscriber::new(vec![
            ok("five acres"),
            Ok(None),
            ok("   "),
        ]));

        let outcome = h.controller.start().await.unwrap();
        let answers = outcome.answers().unwrap();
        assert!(outcome.is_completed());
        assert_eq!(answers.get("previousCrop"), Some("No transcription received"));
        assert_eq!(answers.get("state"), Some("No transcription received"));
    }

    #[tokio::test]
    async fn test_start_while_active_is_noop() {
        let h = harness_with(
            settings(200),
            ScriptedSynthesizer::default(),
            CountingRecorder::default(),
            ScriptedTranscriber::new(vec![ok("a"), ok("b"), ok("c")]),
        );

        let first = {
            let controller = h.controller.clone();
            tokio::spawn(async move { controller.start().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(h.controller.status().is_active());

        let before = h.controller.session().unwrap();
        let second = h.controller.start().await.unwrap();
        assert!(matches!(second, DialogueOutcome::AlreadyActive));
        let after = h.controller.session().unwrap();
        assert_eq!(before.id, after.id);

        let outcome = first.await.unwrap().unwrap();
        assert!(outcome.is_completed());
        assert_eq!(h.recorder.starts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_device_held_elsewhere_is_noop() {
        let h = harness(ScriptedTranscriber::new(vec![]));
        let _lease = h.device.try_acquire().unwrap();

        let outcome = h.controller.start().await.unwrap();
        assert!(matches!(outcome, DialogueOutcome::AlreadyActive));
        assert_eq!(h.controller.status(), DialogueStatus::Idle);
        assert!(h.controller.session().is_none());
        assert!(h.synth.spoken().is_empty());
    }

    #[tokio::test]
    async fn test_transcription_timeout_fails() {
        let mut transcriber = ScriptedTranscriber::new(vec![ok("too late")]);
        transcriber.delay = Duration::from_millis(500);
        let h = harness_with(
            DialogueSettings {
                transcription_timeout: Duration::from_millis(50),
                ..settings(10)
            },
            ScriptedSynthesizer::default(),
            CountingRecorder::default(),
            transcriber,
        );

        let outcome = h.controller.start().await.unwrap();
        let DialogueOutcome::Failed { answers, error, .. } = outcome else {
            panic!("expected failure, got {:?}", outcome);
        };
        assert!(matches!(error, FieldvoxError::TranscriptionTimeout { .. }));
        assert!(answers.is_empty());
    }

    #[tokio::test]
    async fn test_synthesis_unavailable_fails_fast() {
        let h = harness_with(
            settings(10),
            ScriptedSynthesizer {
                unavailable: true,
                ..Default::default()
            },
            CountingRecorder::default(),
            ScriptedTranscriber::new(vec![]),
        );

        let result = h.controller.start().await;
        assert!(matches!(result, Err(FieldvoxError::RecognitionUnavailable(_))));
        assert!(h.controller.session().is_none());
        assert_eq!(h.controller.status(), DialogueStatus::Idle);
    }

    #[tokio::test]
    async fn test_microphone_denied_fails() {
        let h = harness_with(
            settings(10),
            ScriptedSynthesizer::default(),
            CountingRecorder {
                deny: true,
                ..Default::default()
            },
            ScriptedTranscriber::new(vec![]),
        );

        let outcome = h.controller.start().await.unwrap();
        assert!(matches!(
            outcome,
            DialogueOutcome::Failed {
                error: FieldvoxError::PermissionDenied(_),
                ..
            }
        ));
        assert_eq!(h.synth.spoken().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_during_recording() {
        let h = harness_with(
            settings(2_000),
            ScriptedSynthesizer::default(),
            CountingRecorder::default(),
            ScriptedTranscriber::new(vec![ok("a")]),
        );

        let run = {
            let controller = h.controller.clone();
            tokio::spawn(async move { controller.start().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.controller.status(), DialogueStatus::Recording);
        assert!(h.controller.cancel());

        let outcome = run.await.unwrap().unwrap();
        assert!(matches!(
            outcome,
            DialogueOutcome::Failed {
                error: FieldvoxError::Cancelled,
                ..
            }
        ));
        // Recorder released even when cancelled mid-window
        assert_eq!(h.recorder.stops.load(Ordering::SeqCst), 1);
        assert_eq!(h.transcriber.calls.load(Ordering::SeqCst), 0);
        assert!(!h.controller.cancel());
    }

    #[tokio::test]
    async fn test_restart_after_failure() {
        let h = harness(ScriptedTranscriber::new(vec![Err("down".to_string())]));

        let first = h.controller.start().await.unwrap();
        assert!(matches!(first, DialogueOutcome::Failed { .. }));
        let first_id = h.controller.session().unwrap().id;

        // Script exhausted, remaining calls yield None
        let second = h.controller.start().await.unwrap();
        assert!(second.is_completed());
        assert_ne!(h.controller.session().unwrap().id, first_id);
    }

    #[tokio::test]
    async fn test_events_in_question_order() {
        let h = harness(ScriptedTranscriber::new(vec![ok("1"), ok("2"), ok("3")]));
        let mut rx = h.controller.subscribe();

        h.controller.start().await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        assert!(matches!(events.first(), Some(DialogueEvent::SessionStarted { question_count: 3, .. })));
        assert!(matches!(events.last(), Some(DialogueEvent::Completed { answer_count: 3, .. })));

        let answered: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                DialogueEvent::AnswerRecorded { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(answered, vec![0, 1, 2]);

        let id = events[0].session_id();
        assert!(events.iter().all(|e| e.session_id() == id));
    }

    #[tokio::test]
    async fn test_no_questions_fails() {
        let h = harness_with(
            DialogueSettings {
                questions: Vec::new(),
                ..settings(10)
            },
            ScriptedSynthesizer::default(),
            CountingRecorder::default(),
            ScriptedTranscriber::new(vec![]),
        );
        let outcome = h.controller.start().await.unwrap();
        assert!(matches!(
            outcome,
            DialogueOutcome::Failed {
                error: FieldvoxError::Dialogue(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_dropped_start_fails_and_allows_restart() {
        let h = harness_with(
            settings(2_000),
            ScriptedSynthesizer::default(),
            CountingRecorder::default(),
            ScriptedTranscriber::new(vec![ok("a")]),
        );

        let timed_out = tokio::time::timeout(Duration::from_millis(50), h.controller.start()).await;
        assert!(timed_out.is_err());
        assert_eq!(h.controller.status(), DialogueStatus::Failed);
        assert!(!h.device.is_in_use());
        assert!(!h.controller.cancel());

        let second = {
            let controller = h.controller.clone();
            tokio::spawn(async move { controller.start().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.controller.status(), DialogueStatus::Recording);
        assert!(h.controller.cancel());

        let outcome = second.await.unwrap().unwrap();
        assert!(matches!(
            outcome,
            DialogueOutcome::Failed {
                error: FieldvoxError::Cancelled,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_stale_cancel_request_is_cleared() {
        let h = harness(ScriptedTranscriber::new(vec![ok("1"), ok("2"), ok("3")]));
        h.controller.cancel_requested.store(true, Ordering::SeqCst);

        let outcome = h.controller.start().await.unwrap();
        assert!(outcome.is_completed());
    }

    #[tokio::test]
    async fn test_duplicate_question_fields_fail() {
        let h = harness_with(
            DialogueSettings {
                questions: vec![
                    Question::new("crop", "Which crop?"),
                    Question::new("crop", "Which crop last year?"),
                    Question::new("state", "Which state?"),
                ],
                ..settings(10)
            },
            ScriptedSynthesizer::default(),
            CountingRecorder::default(),
            ScriptedTranscriber::new(vec![]),
        );

        let outcome = h.controller.start().await.unwrap();
        let DialogueOutcome::Failed { answers, error, .. } = outcome else {
            panic!("expected failure, got {:?}", outcome);
        };
        assert!(matches!(&error, FieldvoxError::Dialogue(msg) if msg.contains("'crop'")));
        assert!(answers.is_empty());
        assert!(h.synth.spoken().is_empty());
        assert_eq!(h.controller.status(), DialogueStatus::Failed);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = FieldvoxConfig::default();
        config.dialogue.record_duration_ms = 1500;
        config.transcription.timeout_secs = 12;
        let settings = DialogueSettings::from_config(&config);
        assert_eq!(settings.record_duration, Duration::from_millis(1500));
        assert_eq!(settings.transcription_timeout, Duration::from_secs(12));
        assert_eq!(settings.questions.len(), 6);
        assert_eq!(settings.placeholder, "No transcription received");
    }
}
