//! Keyword-anchored field extraction from a single spoken command.
//!
//! Spoken commands chain several field statements without punctuation
//! ("land area is 5 state is Punjab"). Extraction runs in two passes per
//! field: find the keyword anchor and its captured run, then cut the run at
//! the earliest schedule keyword that follows it.

use regex::Regex;

use fieldvox_core::types::{ExtractedField, ExtractionResult, Schedule};

/// Linking words allowed between a keyword and its value.
const LINKING_WORDS: &str = "is|was|to";

/// Characters a spoken value may contain: letters, digits, whitespace and
/// light punctuation found in numbers and place names.
const VALUE_CHARS: &str = r"[\w\s.,:;/'°-]";

/// Trailing punctuation speech recognizers append to clauses.
const TRAILING_PUNCTUATION: &[char] = &[',', '.', ';', ':'];

/// A compiled anchor for one schedule entry.
#[derive(Debug, Clone)]
struct Anchor {
    field: String,
    keyword: String,
    regex: Regex,
}

/// Why a schedule entry produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// The keyword does not occur in the transcript.
    KeywordAbsent,
    /// The keyword occurs but nothing usable follows it.
    EmptyValue,
}

/// Extracts field values from a transcript according to a fixed schedule.
///
/// Patterns are compiled once per schedule and reused for every transcript.
#[derive(Debug, Clone)]
pub struct CommandFieldExtractor {
    schedule: Schedule,
    anchors: Vec<Anchor>,
    /// Word-bounded keyword patterns, one per schedule entry, used to bound
    /// values.
    boundaries: Vec<Regex>,
}

impl CommandFieldExtractor {
    pub fn new(schedule: Schedule) -> Self {
        let anchors = schedule
            .specs()
            .iter()
            .map(|spec| Anchor {
                field: spec.target_field.clone(),
                keyword: spec.keyword.clone(),
                regex: compile(&format!(
                    r"(?i){}(?:\s+(?:{})\b)?\s*({}*)",
                    keyword_pattern(&spec.keyword),
                    LINKING_WORDS,
                    VALUE_CHARS
                )),
            })
            .collect();

        let boundaries = schedule
            .specs()
            .iter()
            .map(|spec| compile(&format!("(?i){}", keyword_pattern(&spec.keyword))))
            .collect();

        Self {
            schedule,
            anchors,
            boundaries,
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Extract every field whose keyword appears in `transcript`.
    ///
    /// Pure: the transcript is not modified and absent fields get no entry.
    pub fn extract(&self, transcript: &str) -> ExtractionResult {
        let mut result = ExtractionResult::new();

        for anchor in &self.anchors {
            match self.extract_one(anchor, transcript) {
                Ok(entry) => {
                    tracing::debug!(
                        field = %entry.field,
                        start = entry.start,
                        end = entry.end,
                        "Field extracted"
                    );
                    result.insert(entry);
                }
                Err(reason) => {
                    tracing::debug!(
                        field = %anchor.field,
                        keyword = %anchor.keyword,
                        reason = ?reason,
                        "Field not found in transcript"
                    );
                }
            }
        }

        tracing::info!(
            transcript_len = transcript.len(),
            extracted = result.len(),
            scheduled = self.anchors.len(),
            "Command transcript parsed"
        );
        result
    }

    fn extract_one(&self, anchor: &Anchor, transcript: &str) -> Result<ExtractedField, MissReason> {
        let caps = anchor
            .regex
            .captures(transcript)
            .ok_or(MissReason::KeywordAbsent)?;
        let capture = caps.get(1).ok_or(MissReason::EmptyValue)?;

        let value_start = capture.start();
        let end = self
            .next_keyword_at(transcript, value_start)
            .map_or(capture.end(), |boundary| boundary.min(capture.end()));

        let (start, end) = trim_span(transcript, value_start, end);
        if start >= end {
            return Err(MissReason::EmptyValue);
        }

        Ok(ExtractedField {
            field: anchor.field.clone(),
            value: transcript[start..end].to_string(),
            start,
            end,
        })
    }

    /// Byte offset of the earliest schedule keyword at or after `from`.
    fn next_keyword_at(&self, transcript: &str, from: usize) -> Option<usize> {
        self.boundaries
            .iter()
            .filter_map(|re| re.find_at(transcript, from))
            .map(|m| m.start())
            .min()
    }
}

/// Extract `schedule`'s fields from `transcript` with a one-off extractor.
pub fn extract(transcript: &str, schedule: &Schedule) -> ExtractionResult {
    CommandFieldExtractor::new(schedule.clone()).extract(transcript)
}

/// Regex source for a keyword: escaped words joined by flexible whitespace,
/// word-bounded on sides that start or end with a word character.
fn keyword_pattern(keyword: &str) -> String {
    let body = keyword
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");

    let lead = if keyword.starts_with(|c: char| c.is_alphanumeric()) {
        r"\b"
    } else {
        ""
    };
    let tail = if keyword.ends_with(|c: char| c.is_alphanumeric()) {
        r"\b"
    } else {
        ""
    };
    format!("{}{}{}", lead, body, tail)
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid keyword regex")
}

/// Shrink `[start, end)` past surrounding whitespace and trailing clause
/// punctuation.
fn trim_span(text: &str, start: usize, end: usize) -> (usize, usize) {
    let slice = &text[start..end];
    let lead = slice.len() - slice.trim_start().len();
    let trimmed = slice
        .trim_end()
        .trim_end_matches(TRAILING_PUNCTUATION)
        .trim_end();
    let new_end = start + trimmed.len();
    let new_start = (start + lead).min(new_end);
    (new_start, new_end)
}

// =============================================================================
// Tests
// =============================================================================
