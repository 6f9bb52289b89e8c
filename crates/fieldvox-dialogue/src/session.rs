//! Data carried by one guided-interview session.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use fieldvox_core::types::{FieldRecord, Question};

use crate::state::DialogueStatus;

/// A transcribed answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    /// 0-based question index.
    pub index: usize,
    /// Logical field the question asks for.
    pub field: String,
    pub text: String,
}

/// Tracks the data associated with one dialogue session.
#[derive(Debug, Clone, Serialize)]
pub struct DialogueSession {
    /// Unique identifier for this session.
    pub id: Uuid,
    /// When the session was started.
    pub started_at: DateTime<Utc>,
    /// Index of the question being worked on. Equals the question count once
    /// every answer is in.
    pub current_index: usize,
    /// Answers so far, in question order.
    pub answers: Vec<Answer>,
    /// Status at the time this snapshot was taken.
    pub status: DialogueStatus,
}

impl DialogueSession {
    /// Create a new session positioned at the first question.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            current_index: 0,
            answers: Vec::new(),
            status: DialogueStatus::Asking,
        }
    }

    /// Returns the elapsed duration of this session in seconds.
    pub fn elapsed_secs(&self) -> f32 {
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_milliseconds() as f32 / 1000.0
    }

    /// Store the answer for the current question and move to the next.
    pub fn record_answer(&mut self, question: &Question, text: impl Into<String>) -> &Answer {
        self.answers.push(Answer {
            index: self.current_index,
            field: question.field.clone(),
            text: text.into(),
        });
        self.current_index += 1;
        &self.answers[self.answers.len() - 1]
    }

    /// Flat `field -> answer` record in question order.
    pub fn answers_record(&self) -> FieldRecord {
        let mut record = FieldRecord::new();
        for answer in &self.answers {
            record.set(answer.field.clone(), answer.text.clone());
        }
        record
    }
}

impl Default for DialogueSession {
    fn default() -> Self {
        Self::new()
    }
}
