//! Scoring extraction results against an answer key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::batch::ExtractResponse;
use crate::core::{OmrError, OmrResult};
use crate::domain::result::question_map;
use crate::domain::{ExtractionResult, FieldName, question_label};

/// Minimum normalised Levenshtein similarity for two exam ids to match.
pub const EXAM_ID_SIMILARITY: f64 = 0.8;

/// The expected answers of one exam.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKey {
    #[serde(default)]
    pub exam_id: String,
    /// Question index to correct letter, keyed `Q<n>` in JSON.
    #[serde(with = "question_map")]
    pub answers: BTreeMap<usize, char>,
}

impl AnswerKey {
    pub fn from_json_file(path: &Path) -> OmrResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let key: AnswerKey = serde_json::from_str(&contents)?;
        if key.answers.is_empty() {
            return Err(OmrError::invalid_input(format!(
                "answer key {} has no answers",
                path.display()
            )));
        }
        Ok(key)
    }
}

/// Uppercases and keeps only ASCII letters and digits.
fn normalize_exam_id(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Whether OCR'd exam-id text refers to the expected exam.
///
/// Both sides are normalised first; they match when equal or when their
/// normalised Levenshtein similarity reaches [`EXAM_ID_SIMILARITY`], which
/// absorbs a misread character or two.
pub fn exam_id_matches(ocr_text: &str, expected: &str) -> bool {
    let (read, expected) = (normalize_exam_id(ocr_text), normalize_exam_id(expected));
    if read.is_empty() || expected.is_empty() {
        return false;
    }
    read == expected || strsim::normalized_levenshtein(&read, &expected) >= EXAM_ID_SIMILARITY
}

/// The verdict on one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionGrade {
    pub question: String,
    pub expected: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given: Option<char>,
    pub correct: bool,
}

/// The score of one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cin: Option<String>,
    pub exam_id_matched: bool,
    pub score: usize,
    pub total: usize,
    pub answers: Vec<QuestionGrade>,
}

/// Grades one result. Unanswered questions count as wrong.
pub fn grade(result: &ExtractionResult, key: &AnswerKey) -> GradeReport {
    let answers: Vec<QuestionGrade> = key
        .answers
        .iter()
        .map(|(&question, &expected)| {
            let given = result.answer(question);
            QuestionGrade {
                question: question_label(question),
                expected,
                given,
                correct: given.is_some_and(|g| g.eq_ignore_ascii_case(&expected)),
            }
        })
        .collect();

    GradeReport {
        cin: result
            .field(FieldName::StudentCin)
            .filter(|cin| !cin.is_empty())
            .map(str::to_string),
        exam_id_matched: exam_id_matches(
            result.field(FieldName::ExamId).unwrap_or_default(),
            &key.exam_id,
        ),
        score: answers.iter().filter(|a| a.correct).count(),
        total: answers.len(),
        answers,
    }
}

/// `{"grades": [...]}`, one report per extraction result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradesResponse {
    pub grades: Vec<GradeReport>,
}

/// Grades every result of an extraction response.
pub fn grade_all(response: &ExtractResponse, key: &AnswerKey) -> GradesResponse {
    let grades = response
        .extracted_data
        .iter()
        .map(|result| {
            if result.is_error() {
                debug!("grading a page that failed extraction");
            }
            grade(result, key)
        })
        .collect();
    GradesResponse { grades }
}
