//! Spoken question-and-answer interview engine.
//!
//! A `DialogueController` walks a fixed list of questions, speaking each one,
//! recording a fixed-length answer and storing its transcript. State changes go
//! through the `StateMachine` so that no step can be skipped.

pub mod controller;
pub mod session;
pub mod state;

pub use controller::{DialogueController, DialogueOutcome, DialogueSettings};
pub use session::{Answer, DialogueSession};
pub use state::{DialogueStatus, StateMachine};
