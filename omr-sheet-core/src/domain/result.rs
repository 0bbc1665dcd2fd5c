//! Per-page extraction results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::fields::{FieldGroup, FieldName};

/// Everything read from one page.
///
/// Serialises to the extraction payload shape:
///
/// ```json
/// {
///   "exam_info": {"exam_title": "...", "prof_name": "...", "university_name": "...", "exam_id": "..."},
///   "student_info": {"Name": "...", "Class": "...", "CIN": "..."},
///   "checked_options": {"Q1": "B", "Q2": "D"}
/// }
/// ```
///
/// Unanswered questions are absent from `checked_options`. `error` is only
/// present when the page could not be processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub exam_info: BTreeMap<FieldName, String>,
    #[serde(default)]
    pub student_info: BTreeMap<FieldName, String>,
    /// 0-based question index to option letter.
    #[serde(default, with = "question_map")]
    pub checked_options: BTreeMap<usize, char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    /// A result for a page that could not be processed.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Stores recognised text under the group its field belongs to.
    pub fn set_field(&mut self, name: FieldName, text: String) {
        match name.group() {
            FieldGroup::Exam => self.exam_info.insert(name, text),
            FieldGroup::Student => self.student_info.insert(name, text),
        };
    }

    pub fn field(&self, name: FieldName) -> Option<&str> {
        let group = match name.group() {
            FieldGroup::Exam => &self.exam_info,
            FieldGroup::Student => &self.student_info,
        };
        group.get(&name).map(String::as_str)
    }

    /// The option marked for a question, if any.
    pub fn answer(&self, question_index: usize) -> Option<char> {
        self.checked_options.get(&question_index).copied()
    }
}

/// (De)serialises `question index -> letter` as `{"Q<n>": "<letter>"}`.
///
/// Keys are written in numeric order, so `Q10` follows `Q9`.
pub mod question_map {
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    use crate::domain::layout::{parse_question_label, question_label};

    pub fn serialize<S>(map: &BTreeMap<usize, char>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (question_index, letter) in map {
            out.serialize_entry(&question_label(*question_index), letter)?;
        }
        out.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<usize, char>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, char>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(label, letter)| {
                parse_question_label(&label)
                    .map(|index| (index, letter))
                    .ok_or_else(|| D::Error::custom(format!("invalid question label: {label}")))
            })
            .collect()
    }
}
