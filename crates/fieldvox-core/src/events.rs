use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Progress notifications emitted by a dialogue session.
///
/// Consumed by the user-facing status indicator. Events for one session are
/// emitted in strict question order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum DialogueEvent {
    SessionStarted {
        session_id: Uuid,
        question_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// The question was spoken to completion.
    QuestionAsked {
        session_id: Uuid,
        index: usize,
        prompt: String,
    },

    RecordingStarted {
        session_id: Uuid,
        index: usize,
    },

    RecordingStopped {
        session_id: Uuid,
        index: usize,
        bytes: usize,
    },

    AnswerRecorded {
        session_id: Uuid,
        index: usize,
        field: String,
        text: String,
    },

    Completed {
        session_id: Uuid,
        answer_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// The session halted. Answers collected so far are retained.
    Failed {
        session_id: Uuid,
        index: usize,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl DialogueEvent {
    pub fn session_id(&self) -> Uuid {
        match self {
            DialogueEvent::SessionStarted { session_id, .. }
            | DialogueEvent::QuestionAsked { session_id, .. }
            | DialogueEvent::RecordingStarted { session_id, .. }
            | DialogueEvent::RecordingStopped { session_id, .. }
            | DialogueEvent::AnswerRecorded { session_id, .. }
            | DialogueEvent::Completed { session_id, .. }
            | DialogueEvent::Failed { session_id, .. } => *session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_tag() {
        let event = DialogueEvent::QuestionAsked {
            session_id: Uuid::nil(),
            index: 2,
            prompt: "Which state?".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "question_asked");
        assert_eq!(json["index"], 2);
    }

    #[test]
    fn test_event_roundtrip() {
        let event = DialogueEvent::Failed {
            session_id: Uuid::new_v4(),
            index: 1,
            error: "Transcription service error: HTTP 500".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: DialogueEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.session_id(), event.session_id());
    }
}
