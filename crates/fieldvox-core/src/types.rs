//! Domain types shared across the Fieldvox crates.
//!
//! The field schedule drives both voice paths: the command extractor anchors
//! on its keywords, and the dialogue asks one question per field.

use std::collections::HashSet;
use std::time::Duration;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{FieldvoxError, Result};

// =============================================================================
// Field schedule
// =============================================================================

/// One keyword anchor and the form field it fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Lowercase anchor phrase as spoken, e.g. "land area".
    pub keyword: String,
    /// Logical field id, e.g. "landArea".
    pub target_field: String,
}

impl FieldSpec {
    pub fn new(keyword: impl Into<String>, target_field: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            target_field: target_field.into(),
        }
    }
}

/// An ordered, validated sequence of [`FieldSpec`]s with unique keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schedule {
    specs: Vec<FieldSpec>,
}

impl Schedule {
    /// Build a schedule, normalizing keywords to trimmed lowercase.
    ///
    /// Fails on empty keywords, empty target fields, and duplicate keywords or
    /// target fields.
    pub fn new(specs: Vec<FieldSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut targets = HashSet::new();
        let mut normalized = Vec::with_capacity(specs.len());

        for spec in specs {
            let keyword = spec.keyword.trim().to_lowercase();
            if keyword.is_empty() {
                return Err(FieldvoxError::Config(format!(
                    "empty keyword for field '{}'",
                    spec.target_field
                )));
            }
            if spec.target_field.trim().is_empty() {
                return Err(FieldvoxError::Config(format!(
                    "empty target field for keyword '{}'",
                    keyword
                )));
            }
            if !seen.insert(keyword.clone()) {
                return Err(FieldvoxError::Config(format!(
                    "duplicate keyword '{}' in schedule",
                    keyword
                )));
            }
            let target_field = spec.target_field.trim().to_string();
            if !targets.insert(target_field.clone()) {
                return Err(FieldvoxError::Config(format!(
                    "duplicate target field '{}' in schedule",
                    target_field
                )));
            }
            normalized.push(FieldSpec {
                keyword,
                target_field,
            });
        }

        Ok(Self { specs: normalized })
    }

    /// The farm form: land area, previous crop, coordinates and address.
    pub fn farm_form() -> Self {
        Self {
            specs: default_field_specs(),
        }
    }

    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Target fields in schedule order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.target_field.as_str())
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::farm_form()
    }
}

/// Default keyword → field pairs for the farm form.
pub fn default_field_specs() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("land area", "landArea"),
        FieldSpec::new("previous crop", "previousCrop"),
        FieldSpec::new("latitude", "latitude"),
        FieldSpec::new("longitude", "longitude"),
        FieldSpec::new("state", "state"),
        FieldSpec::new("district", "district"),
    ]
}

// =============================================================================
// Dialogue questions
// =============================================================================

/// A scripted question and the field its answer is recorded under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub field: String,
    pub prompt: String,
}

impl Question {
    pub fn new(field: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            prompt: prompt.into(),
        }
    }
}

/// Returns the first field asked for by more than one question.
///
/// Answers are keyed by field, so a repeated field would overwrite an
/// earlier answer.
pub fn duplicate_question_field(questions: &[Question]) -> Option<&str> {
    let mut seen = HashSet::new();
    questions
        .iter()
        .map(|q| q.field.as_str())
        .find(|field| !seen.insert(*field))
}

/// Default interview for the farm form, one question per field.
pub fn default_questions() -> Vec<Question> {
    vec![
        Question::new("landArea", "What is your land area in acres?"),
        Question::new("previousCrop", "Which crop did you grow last season?"),
        Question::new("latitude", "What is the latitude of your farm?"),
        Question::new("longitude", "What is the longitude of your farm?"),
        Question::new("state", "Which state is your farm in?"),
        Question::new("district", "Which district is your farm in?"),
    ]
}

// =============================================================================
// Extraction results
// =============================================================================

/// A single value pulled out of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedField {
    pub field: String,
    pub value: String,
    /// Byte offset of the trimmed value in the transcript.
    pub start: usize,
    /// Byte offset one past the trimmed value.
    pub end: usize,
}

/// Values extracted from one transcript, in schedule order.
///
/// A field with no entry was not found; it is never defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    entries: Vec<ExtractedField>,
}

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an extracted value. Empty values are ignored.
    pub fn insert(&mut self, entry: ExtractedField) {
        if entry.value.trim().is_empty() {
            return;
        }
        if let Some(existing) = self.entries.iter_mut().find(|e| e.field == entry.field) {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entry(field).map(|e| e.value.as_str())
    }

    pub fn entry(&self, field: &str) -> Option<&ExtractedField> {
        self.entries.iter().find(|e| e.field == field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.entry(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractedField> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Schedule fields that have no value in this result.
    pub fn missing<'a>(&self, schedule: &'a Schedule) -> Vec<&'a str> {
        schedule.fields().filter(|f| !self.contains(f)).collect()
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for e in &self.entries {
            map.serialize_entry(&e.field, &e.value)?;
        }
        map.end()
    }
}

// =============================================================================
// Field record (result sink payload)
// =============================================================================

/// Ordered flat `field → value` mapping handed to the form renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRecord {
    fields: Vec<(String, String)>,
}

impl FieldRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record with every field present and blank, like an empty form.
    pub fn blank<'a>(fields: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|f| (f.to_string(), String::new()))
                .collect(),
        }
    }

    /// Set a field, keeping its original position if it already exists.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    /// Overwrite the fields present in `result`; every other field keeps
    /// its previous value.
    pub fn apply(&mut self, result: &ExtractionResult) -> usize {
        let mut written = 0;
        for entry in result.iter() {
            self.set(entry.field.clone(), entry.value.trim());
            written += 1;
        }
        written
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(f, v)| (f.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Pretty JSON for the display panel.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for FieldRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (f, v) in &self.fields {
            map.serialize_entry(f, v)?;
        }
        map.end()
    }
}

// =============================================================================
// Audio
// =============================================================================

/// One recorded audio sample, as produced by the platform recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    /// MIME type, e.g. "audio/wav" or "audio/webm".
    pub content_type: String,
    pub duration: Duration,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>, duration: Duration) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
            duration,
        }
    }

    /// Suggested upload file name derived from the content type.
    pub fn file_name(&self) -> String {
        let ext = match self.content_type.split(';').next().unwrap_or("").trim() {
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            "audio/webm" => "webm",
            "audio/ogg" => "ogg",
            "audio/mpeg" => "mp3",
            _ => "bin",
        };
        format!("recording.{}", ext)
    }
}
