//! Render request payloads.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use omr_sheet_core::domain::FieldName;
use omr_sheet_core::domain::result::question_map;

/// Printed when a student field is missing from the payload.
pub const UNKNOWN_FIELD: &str = "Unknown";

/// Printed when the payload has no title, or a blank one.
pub const DEFAULT_TITLE: &str = "Sample Quiz";

/// An exam to print sheets for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamDefinition {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuestionDescriptor>,
    #[serde(default, alias = "examId")]
    pub exam_id: Option<String>,
    #[serde(default)]
    pub student: Option<StudentIdentity>,
    /// Roster mode: one sheet per student plus a merged document.
    #[serde(default)]
    pub students: Option<Vec<StudentIdentity>>,
    /// Answers printed pre-filled, keyed `Q<n>`.
    #[serde(default, with = "question_map", skip_serializing_if = "BTreeMap::is_empty")]
    pub marks: BTreeMap<usize, char>,
}

impl ExamDefinition {
    /// The title to print, trimmed, falling back to [`DEFAULT_TITLE`].
    pub fn display_title(&self) -> &str {
        match self.title.trim() {
            "" => DEFAULT_TITLE,
            title => title,
        }
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

/// One question of the exam. Only the count matters to the sheet; the rest is
/// carried so payloads from the quiz store deserialize unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionDescriptor {
    #[serde(default, alias = "question")]
    pub text: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// The identity printed inside the Name, Class and CIN boxes.
///
/// Accepts both the lowercase keys of render payloads and the column headers
/// of roster spreadsheets. Numbers are printed as written, since spreadsheet
/// exports turn CINs and class codes into numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentIdentity {
    #[serde(default = "unknown", alias = "Name", deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(default = "unknown", alias = "Class", deserialize_with = "string_or_number")]
    pub class: String,
    #[serde(default = "unknown", alias = "CIN", deserialize_with = "string_or_number")]
    pub cin: String,
}

impl StudentIdentity {
    /// The value printed in an identity box; empty for non-identity fields.
    pub fn value(&self, field: FieldName) -> &str {
        match field {
            FieldName::StudentName => &self.name,
            FieldName::StudentClass => &self.class,
            FieldName::StudentCin => &self.cin,
            _ => "",
        }
    }
}

impl Default for StudentIdentity {
    fn default() -> Self {
        Self {
            name: unknown(),
            class: unknown(),
            cin: unknown(),
        }
    }
}

fn unknown() -> String {
    UNKNOWN_FIELD.to_string()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Float(f64),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Integer(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
        Raw::Null(()) => unknown(),
    })
}
