//! The closed set of text fields printed on an answer sheet.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which half of an [`ExtractionResult`](super::ExtractionResult) a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    /// Exam metadata printed by the sheet's author.
    Exam,
    /// Identity boxes filled in by (or for) the student.
    Student,
}

/// A named text field on the sheet.
///
/// Serialised with the keys used in extraction payloads: the exam metadata
/// fields are snake_case, the identity fields are the captions printed above
/// their boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldName {
    #[serde(rename = "exam_title")]
    ExamTitle,
    #[serde(rename = "prof_name")]
    ProfName,
    #[serde(rename = "university_name")]
    UniversityName,
    #[serde(rename = "exam_id")]
    ExamId,
    #[serde(rename = "Name")]
    StudentName,
    #[serde(rename = "Class")]
    StudentClass,
    #[serde(rename = "CIN")]
    StudentCin,
}

impl FieldName {
    /// Every field, exam metadata first, in sheet order.
    pub const ALL: [FieldName; 7] = [
        FieldName::ExamTitle,
        FieldName::ProfName,
        FieldName::UniversityName,
        FieldName::ExamId,
        FieldName::StudentName,
        FieldName::StudentClass,
        FieldName::StudentCin,
    ];

    /// The identity fields, left to right.
    pub const STUDENT: [FieldName; 3] = [
        FieldName::StudentName,
        FieldName::StudentClass,
        FieldName::StudentCin,
    ];

    /// The key this field uses in extraction payloads.
    pub fn key(self) -> &'static str {
        match self {
            FieldName::ExamTitle => "exam_title",
            FieldName::ProfName => "prof_name",
            FieldName::UniversityName => "university_name",
            FieldName::ExamId => "exam_id",
            FieldName::StudentName => "Name",
            FieldName::StudentClass => "Class",
            FieldName::StudentCin => "CIN",
        }
    }

    pub fn group(self) -> FieldGroup {
        match self {
            FieldName::ExamTitle
            | FieldName::ProfName
            | FieldName::UniversityName
            | FieldName::ExamId => FieldGroup::Exam,
            FieldName::StudentName | FieldName::StudentClass | FieldName::StudentCin => {
                FieldGroup::Student
            }
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FieldName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| format!("unknown field name: {s}"))
    }
}
