//! Fieldvox Command crate - keyword-anchored field extraction and continuous
//! listening sessions.
//!
//! A single spoken command such as "land area is 5 state is Punjab" is parsed
//! into form fields by [`CommandFieldExtractor`]. [`ListeningSession`]
//! accumulates recognizer fragments and runs the extractor when listening
//! stops.

pub mod extractor;
pub mod listening;

pub use extractor::{extract, CommandFieldExtractor, MissReason};
pub use listening::{Fragment, ListeningSession, ListeningStatus};
