//! Dialogue state machine with thread-safe transitions.
//!
//! Valid transitions:
//! - Idle | Completed | Failed -> Asking (new session)
//! - Asking -> Recording (question spoken)
//! - Recording -> Transcribing (fixed window elapsed)
//! - Transcribing -> Asking (answer stored, questions remain)
//! - Transcribing -> Completed (answer stored, none remain)
//! - Asking | Recording | Transcribing -> Failed

use std::fmt;
use std::sync::{Arc, Mutex};

use fieldvox_core::error::FieldvoxError;

/// Operational state of a dialogue session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogueStatus {
    /// No session has run yet.
    Idle,
    /// Speaking the current question.
    Asking,
    /// Capturing the fixed-duration answer clip.
    Recording,
    /// Waiting for the transcription service.
    Transcribing,
    /// Every question answered. Terminal until the next start.
    Completed,
    /// Halted on an error. Partial answers retained.
    Failed,
}

impl fmt::Display for DialogueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogueStatus::Idle => write!(f, "Idle"),
            DialogueStatus::Asking => write!(f, "Asking"),
            DialogueStatus::Recording => write!(f, "Recording"),
            DialogueStatus::Transcribing => write!(f, "Transcribing"),
            DialogueStatus::Completed => write!(f, "Completed"),
            DialogueStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl serde::Serialize for DialogueStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl DialogueStatus {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &DialogueStatus) -> bool {
        matches!(
            (self, target),
            (DialogueStatus::Idle, DialogueStatus::Asking)
                | (DialogueStatus::Completed, DialogueStatus::Asking)
                | (DialogueStatus::Failed, DialogueStatus::Asking)
                | (DialogueStatus::Asking, DialogueStatus::Recording)
                | (DialogueStatus::Recording, DialogueStatus::Transcribing)
                | (DialogueStatus::Transcribing, DialogueStatus::Asking)
                | (DialogueStatus::Transcribing, DialogueStatus::Completed)
                // Failure transitions
                | (DialogueStatus::Asking, DialogueStatus::Failed)
                | (DialogueStatus::Recording, DialogueStatus::Failed)
                | (DialogueStatus::Transcribing, DialogueStatus::Failed)
        )
    }

    /// Whether a session currently owns the audio devices.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            DialogueStatus::Asking | DialogueStatus::Recording | DialogueStatus::Transcribing
        )
    }
}

/// Thread-safe state machine for dialogue transitions.
///
/// Clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: Arc<Mutex<DialogueStatus>>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DialogueStatus::Idle)),
        }
    }

    /// Returns the current state.
    pub fn current(&self) -> DialogueStatus {
        *self.state.lock().expect("state mutex poisoned")
    }

    /// Attempt to transition to the target state.
    pub fn transition(&self, target: DialogueStatus) -> Result<(), FieldvoxError> {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if state.can_transition_to(&target) {
            tracing::debug!("Dialogue state: {} -> {}", *state, target);
            *state = target;
            Ok(())
        } else {
            Err(FieldvoxError::Dialogue(format!(
                "Invalid state transition: {} -> {}",
                *state, target
            )))
        }
    }

    /// Atomically claim the machine for a new session.
    ///
    /// Moves to `Asking` and returns the state it replaced, or `None` if a
    /// session is already active.
    pub fn try_begin(&self) -> Option<DialogueStatus> {
        self.try_begin_with(|| {})
    }

    /// Like [`try_begin`](Self::try_begin), running `on_begin` under the
    /// state lock once the claim succeeds.
    pub fn try_begin_with(&self, on_begin: impl FnOnce()) -> Option<DialogueStatus> {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if state.can_transition_to(&DialogueStatus::Asking) && !state.is_active() {
            let previous = *state;
            tracing::debug!("Dialogue state: {} -> {}", previous, DialogueStatus::Asking);
            *state = DialogueStatus::Asking;
            on_begin();
            Some(previous)
        } else {
            None
        }
    }

    /// Run `f` under the state lock if a session is active.
    ///
    /// Returns whether `f` ran.
    pub fn while_active(&self, f: impl FnOnce()) -> bool {
        let state = self.state.lock().expect("state mutex poisoned");
        if state.is_active() {
            f();
            true
        } else {
            false
        }
    }

    /// Undo a `try_begin` whose session never started.
    pub fn restore(&self, previous: DialogueStatus) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        *state = previous;
    }

    /// Move to `Failed` from wherever the session halted.
    pub fn fail(&self) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if !state.can_transition_to(&DialogueStatus::Failed) {
            tracing::warn!("Dialogue state forced to Failed from {}", *state);
        }
        *state = DialogueStatus::Failed;
    }
}

// =============================================================================
// Tests
// =============================================================================
