//! Sheet geometry.
//!
//! [`compute_layout`] is the single mapping from [`LayoutParams`] to every
//! pixel region on the page. The renderer paints from a [`SheetLayout`] and
//! the extractor reads from one; both must be built from the same value or
//! extracted regions silently drift off the printed ones.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::fields::FieldName;
use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::constants::*;
use crate::core::errors::OmrError;

/// Geometric parameters of the answer-sheet template, in page pixels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    pub page_width: i32,
    pub page_height: i32,
    pub questions_per_sheet: usize,
    pub options_per_question: usize,
    /// Questions with an index below this go in the left column.
    pub first_column_cutoff: usize,
    pub bubble_radius: i32,
    pub bubble_spacing: i32,
    pub question_spacing: i32,
    pub left_margin: i32,
    pub top_margin: i32,
    pub column_spacing: i32,
    pub identity_box_width: i32,
    pub identity_box_height: i32,
    pub identity_top: i32,
    pub label_offset_x: i32,
    pub label_offset_y: i32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            page_width: DEFAULT_PAGE_WIDTH,
            page_height: DEFAULT_PAGE_HEIGHT,
            questions_per_sheet: DEFAULT_QUESTIONS_PER_SHEET,
            options_per_question: DEFAULT_OPTIONS_PER_QUESTION,
            first_column_cutoff: DEFAULT_FIRST_COLUMN_CUTOFF,
            bubble_radius: DEFAULT_BUBBLE_RADIUS,
            bubble_spacing: DEFAULT_BUBBLE_SPACING,
            question_spacing: DEFAULT_QUESTION_SPACING,
            left_margin: DEFAULT_LEFT_MARGIN,
            top_margin: DEFAULT_TOP_MARGIN,
            column_spacing: DEFAULT_COLUMN_SPACING,
            identity_box_width: DEFAULT_IDENTITY_BOX_WIDTH,
            identity_box_height: DEFAULT_IDENTITY_BOX_HEIGHT,
            identity_top: DEFAULT_IDENTITY_TOP,
            label_offset_x: DEFAULT_LABEL_OFFSET_X,
            label_offset_y: DEFAULT_LABEL_OFFSET_Y,
        }
    }
}

impl LayoutParams {
    /// Loads parameters from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, OmrError> {
        let contents = std::fs::read_to_string(path)?;
        let params: LayoutParams = serde_json::from_str(&contents)?;
        params.validate()?;
        Ok(params)
    }
}

impl ConfigValidator for LayoutParams {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_positive("page_width", self.page_width)?;
        self.validate_positive("page_height", self.page_height)?;
        self.validate_positive("bubble_radius", self.bubble_radius)?;
        self.validate_positive("identity_box_width", self.identity_box_width)?;
        self.validate_positive("identity_box_height", self.identity_box_height)?;
        for (name, value) in [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("bubble_radius", self.bubble_radius),
            ("identity_box_width", self.identity_box_width),
            ("identity_box_height", self.identity_box_height),
            ("bubble_spacing", self.bubble_spacing),
            ("question_spacing", self.question_spacing),
            ("left_margin", self.left_margin),
            ("top_margin", self.top_margin),
            ("column_spacing", self.column_spacing),
            ("identity_top", self.identity_top),
            ("label_offset_x", self.label_offset_x),
            ("label_offset_y", self.label_offset_y),
        ] {
            self.validate_non_negative(name, value)?;
            if value > MAX_LAYOUT_DISTANCE {
                return Err(ConfigError::ValidationFailed {
                    message: format!("{name} must be at most {MAX_LAYOUT_DISTANCE}, got {value}"),
                });
            }
        }

        if !(1..=MAX_QUESTIONS_PER_SHEET).contains(&self.questions_per_sheet) {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "questions_per_sheet must be between 1 and {MAX_QUESTIONS_PER_SHEET}, got {}",
                    self.questions_per_sheet
                ),
            });
        }
        if !(1..=26).contains(&self.options_per_question) {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "options_per_question must be between 1 and 26, got {}",
                    self.options_per_question
                ),
            });
        }
        if self.first_column_cutoff > self.questions_per_sheet {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "first_column_cutoff {} is outside [0, {}]",
                    self.first_column_cutoff, self.questions_per_sheet
                ),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// A named, half-open, axis-aligned rectangle `[x1, x2) x [y1, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FieldRegion {
    pub name: FieldName,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl FieldRegion {
    fn new(name: FieldName, x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            name,
            x1,
            y1,
            x2,
            y2,
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Returns true if the two rectangles share at least one pixel.
    pub fn overlaps(&self, other: &FieldRegion) -> bool {
        self.x1 < other.x2 && other.x1 < self.x2 && self.y1 < other.y2 && other.y1 < self.y2
    }

    /// Horizontal centre, used to centre captions and printed values.
    pub fn center_x(&self) -> i32 {
        self.x1 + self.width() / 2
    }
}

/// One answer bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BubbleSpec {
    /// 0-based question index.
    pub question_index: usize,
    /// 0-based option index (A = 0).
    pub option_index: usize,
    pub center_x: i32,
    pub center_y: i32,
    pub radius: i32,
}

impl BubbleSpec {
    /// The option letter, `A` for index 0.
    pub fn option_letter(&self) -> char {
        option_letter(self.option_index)
    }

    /// The question label, `Q1` for index 0.
    pub fn question_label(&self) -> String {
        question_label(self.question_index)
    }

    /// The half-open square `[cx-r, cx+r) x [cy-r, cy+r)` bounding the circle.
    pub fn bounding_square(&self) -> (i32, i32, i32, i32) {
        (
            self.center_x - self.radius,
            self.center_y - self.radius,
            self.center_x + self.radius,
            self.center_y + self.radius,
        )
    }

    /// Foreground intensity of a fully inked circle: `π·r²·255`.
    pub fn ideal_intensity(&self) -> f64 {
        let r = f64::from(self.radius);
        std::f64::consts::PI * r * r * 255.0
    }
}

/// Where the `Q<n>` label of a question row is drawn (horizontal centre, top).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct QuestionAnchor {
    pub question_index: usize,
    pub x: i32,
    pub y: i32,
}

/// Every region of the sheet, computed once from [`LayoutParams`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    params: LayoutParams,
    field_regions: Vec<FieldRegion>,
    bubbles: Vec<BubbleSpec>,
    question_anchors: Vec<QuestionAnchor>,
}

/// Computes the sheet layout for the given parameters.
///
/// This is a pure function: the same parameters always produce the same
/// regions, whatever is later printed in them.
///
/// # Errors
///
/// Returns a `ConfigError` if the parameters fail validation or if two
/// text-field regions would overlap.
pub fn compute_layout(params: LayoutParams) -> Result<SheetLayout, ConfigError> {
    params.validate()?;

    let field_regions = field_regions(&params);
    for (i, a) in field_regions.iter().enumerate() {
        if let Some(b) = field_regions[i + 1..].iter().find(|b| a.overlaps(b)) {
            return Err(ConfigError::ValidationFailed {
                message: format!("field regions {} and {} overlap", a.name, b.name),
            });
        }
    }

    Ok(assemble(params, field_regions))
}

fn assemble(params: LayoutParams, field_regions: Vec<FieldRegion>) -> SheetLayout {
    let mut bubbles = Vec::with_capacity(params.questions_per_sheet * params.options_per_question);
    let mut question_anchors = Vec::with_capacity(params.questions_per_sheet);
    for question_index in 0..params.questions_per_sheet {
        let (column_x, row_y) = row_origin(&params, question_index);
        question_anchors.push(QuestionAnchor {
            question_index,
            x: column_x - params.label_offset_x,
            y: row_y + params.label_offset_y,
        });
        bubbles.extend((0..params.options_per_question).map(|option_index| BubbleSpec {
            question_index,
            option_index,
            center_x: column_x + option_index as i32 * params.bubble_spacing,
            center_y: row_y,
            radius: params.bubble_radius,
        }));
    }

    SheetLayout {
        params,
        field_regions,
        bubbles,
        question_anchors,
    }
}

/// Column x and row y of the first bubble of a question.
fn row_origin(params: &LayoutParams, question_index: usize) -> (i32, i32) {
    let (column_x, row) = if question_index < params.first_column_cutoff {
        (params.left_margin, question_index)
    } else {
        (
            params.left_margin + params.column_spacing,
            question_index - params.first_column_cutoff,
        )
    };
    (column_x, params.top_margin + row as i32 * params.question_spacing)
}

fn field_regions(params: &LayoutParams) -> Vec<FieldRegion> {
    let mid = params.page_width / 2;
    let right = params.page_width - params.left_margin;
    let top = params.identity_top;
    let (bw, bh) = (params.identity_box_width, params.identity_box_height);

    FieldName::ALL
        .into_iter()
        .map(|name| match name {
            FieldName::ExamTitle => FieldRegion::new(name, mid - 400, 100, mid + 400, 160),
            FieldName::ProfName => FieldRegion::new(name, mid - 400, 200, mid + 400, 260),
            FieldName::UniversityName => FieldRegion::new(name, mid - 400, 300, mid + 400, 360),
            FieldName::ExamId => FieldRegion::new(name, right - 500, 50, right + 200, 100),
            FieldName::StudentName => FieldRegion::new(name, mid - 700, top, mid - 700 + bw, top + bh),
            FieldName::StudentClass => FieldRegion::new(name, mid - 200, top, mid - 200 + bw, top + bh),
            FieldName::StudentCin => FieldRegion::new(name, mid + 400, top, mid + 400 + bw, top + bh),
        })
        .collect()
}

impl SheetLayout {
    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn field_regions(&self) -> &[FieldRegion] {
        &self.field_regions
    }

    /// The region of a field. Every [`FieldName`] has exactly one.
    pub fn region(&self, name: FieldName) -> &FieldRegion {
        // `field_regions` is built from `FieldName::ALL` in declaration order.
        &self.field_regions[name as usize]
    }

    /// All bubbles, ordered by question then option.
    pub fn bubbles(&self) -> &[BubbleSpec] {
        &self.bubbles
    }

    /// The bubbles of one question in option order; empty if out of range.
    pub fn bubbles_for(&self, question_index: usize) -> &[BubbleSpec] {
        let n = self.params.options_per_question;
        self.bubbles
            .get(question_index * n..(question_index + 1) * n)
            .unwrap_or(&[])
    }

    pub fn question_anchors(&self) -> &[QuestionAnchor] {
        &self.question_anchors
    }

    pub fn question_count(&self) -> usize {
        self.params.questions_per_sheet
    }

    pub fn option_count(&self) -> usize {
        self.params.options_per_question
    }

    /// Page size in pixels as `(width, height)`.
    pub fn page_size(&self) -> (u32, u32) {
        (self.params.page_width as u32, self.params.page_height as u32)
    }
}

impl Default for SheetLayout {
    fn default() -> Self {
        let params = LayoutParams::default();
        let regions = field_regions(&params);
        assemble(params, regions)
    }
}

/// The letter for a 0-based option index (`0 -> 'A'`).
pub fn option_letter(option_index: usize) -> char {
    char::from(b'A' + (option_index % 26) as u8)
}

/// The 0-based option index of a letter, case-insensitive.
pub fn option_index(letter: char) -> Option<usize> {
    let upper = letter.to_ascii_uppercase();
    upper
        .is_ascii_uppercase()
        .then(|| (upper as u8 - b'A') as usize)
}

/// The label for a 0-based question index (`0 -> "Q1"`).
pub fn question_label(question_index: usize) -> String {
    format!("Q{}", question_index + 1)
}

/// The 0-based question index of a `Q<n>` label.
pub fn parse_question_label(label: &str) -> Option<usize> {
    let number: usize = label.strip_prefix('Q')?.parse().ok()?;
    number.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_deterministic() -> Result<(), ConfigError> {
        let a = compute_layout(LayoutParams::default())?;
        let b = compute_layout(LayoutParams::default())?;
        assert_eq!(a, b);
        assert_eq!(a, SheetLayout::default());
        Ok(())
    }

    #[test]
    fn test_column_split_at_cutoff() -> Result<(), ConfigError> {
        let layout = compute_layout(LayoutParams::default())?;

        let q24 = layout.bubbles_for(24)[0];
        assert_eq!(q24.center_x, 500);
        assert_eq!(q24.center_y, 800 + 24 * 80);

        let q25 = layout.bubbles_for(25)[0];
        assert_eq!(q25.center_x, 1500);
        assert_eq!(q25.center_y, 800);
        Ok(())
    }

    #[test]
    fn test_bubble_positions_within_row() -> Result<(), ConfigError> {
        let layout = compute_layout(LayoutParams::default())?;
        let row = layout.bubbles_for(2);
        assert_eq!(row.len(), 4);
        let xs: Vec<i32> = row.iter().map(|b| b.center_x).collect();
        assert_eq!(xs, vec![500, 560, 620, 680]);
        assert!(row.iter().all(|b| b.center_y == 960 && b.radius == 20));
        assert_eq!(row[3].option_letter(), 'D');
        assert_eq!(row[3].question_label(), "Q3");
        assert!(layout.bubbles_for(30).is_empty());
        Ok(())
    }

    #[test]
    fn test_question_anchors() -> Result<(), ConfigError> {
        let layout = compute_layout(LayoutParams::default())?;
        let anchors = layout.question_anchors();
        assert_eq!(anchors.len(), 30);
        assert_eq!((anchors[0].x, anchors[0].y), (420, 810));
        assert_eq!((anchors[26].x, anchors[26].y), (1420, 890));
        Ok(())
    }

    #[test]
    fn test_default_field_regions() -> Result<(), ConfigError> {
        let layout = compute_layout(LayoutParams::default())?;
        let title = layout.region(FieldName::ExamTitle);
        assert_eq!((title.x1, title.y1, title.x2, title.y2), (650, 100, 1450, 160));
        let exam_id = layout.region(FieldName::ExamId);
        assert_eq!((exam_id.x1, exam_id.y1, exam_id.x2, exam_id.y2), (1100, 50, 1800, 100));
        let cin = layout.region(FieldName::StudentCin);
        assert_eq!((cin.x1, cin.y1, cin.x2, cin.y2), (1450, 500, 1850, 570));
        for name in FieldName::ALL {
            assert_eq!(layout.region(name).name, name);
        }
        Ok(())
    }

    #[test]
    fn test_default_regions_do_not_overlap() -> Result<(), ConfigError> {
        let layout = compute_layout(LayoutParams::default())?;
        let regions = layout.field_regions();
        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                assert!(!a.overlaps(b), "{} overlaps {}", a.name, b.name);
            }
        }
        Ok(())
    }

    #[test]
    fn test_overlapping_identity_boxes_are_rejected() {
        let params = LayoutParams {
            identity_top: 120,
            ..LayoutParams::default()
        };
        assert!(matches!(
            compute_layout(params),
            Err(ConfigError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_invalid_parameters() {
        let cases = [
            LayoutParams {
                bubble_radius: -1,
                ..LayoutParams::default()
            },
            LayoutParams {
                options_per_question: 0,
                ..LayoutParams::default()
            },
            LayoutParams {
                first_column_cutoff: 31,
                ..LayoutParams::default()
            },
            LayoutParams {
                question_spacing: -80,
                ..LayoutParams::default()
            },
        ];
        for params in cases {
            assert!(compute_layout(params).is_err());
        }
    }

    #[test]
    fn test_oversized_parameters_are_rejected() {
        let spacing = compute_layout(LayoutParams {
            question_spacing: i32::MAX,
            ..LayoutParams::default()
        });
        assert!(matches!(spacing, Err(ConfigError::ValidationFailed { .. })));

        let page = compute_layout(LayoutParams {
            page_width: i32::MAX,
            ..LayoutParams::default()
        });
        assert!(matches!(page, Err(ConfigError::ValidationFailed { .. })));

        let identity = compute_layout(LayoutParams {
            identity_top: i32::MAX - 10,
            identity_box_height: i32::MAX,
            ..LayoutParams::default()
        });
        assert!(identity.is_err());

        let rows = compute_layout(LayoutParams {
            questions_per_sheet: usize::MAX,
            first_column_cutoff: 25,
            ..LayoutParams::default()
        });
        assert!(rows.is_err());
    }

    #[test]
    fn test_largest_accepted_parameters_compute() -> Result<(), ConfigError> {
        let layout = compute_layout(LayoutParams {
            page_width: MAX_LAYOUT_DISTANCE,
            page_height: MAX_LAYOUT_DISTANCE,
            questions_per_sheet: MAX_QUESTIONS_PER_SHEET,
            options_per_question: 26,
            first_column_cutoff: 0,
            bubble_radius: MAX_LAYOUT_DISTANCE,
            bubble_spacing: MAX_LAYOUT_DISTANCE,
            question_spacing: MAX_LAYOUT_DISTANCE,
            left_margin: MAX_LAYOUT_DISTANCE,
            top_margin: MAX_LAYOUT_DISTANCE,
            column_spacing: MAX_LAYOUT_DISTANCE,
            identity_box_width: 10,
            identity_box_height: 10,
            identity_top: MAX_LAYOUT_DISTANCE,
            label_offset_x: MAX_LAYOUT_DISTANCE,
            label_offset_y: MAX_LAYOUT_DISTANCE,
        })?;
        assert_eq!(layout.bubbles().len(), MAX_QUESTIONS_PER_SHEET * 26);
        Ok(())
    }

    #[test]
    fn test_cutoff_bounds_are_inclusive() -> Result<(), ConfigError> {
        let all_right = compute_layout(LayoutParams {
            first_column_cutoff: 0,
            ..LayoutParams::default()
        })?;
        assert_eq!(all_right.bubbles_for(0)[0].center_x, 1500);

        let all_left = compute_layout(LayoutParams {
            first_column_cutoff: 30,
            ..LayoutParams::default()
        })?;
        assert_eq!(all_left.bubbles_for(29)[0].center_x, 500);
        Ok(())
    }

    #[test]
    fn test_params_deserialize_with_defaults() -> Result<(), serde_json::Error> {
        let params: LayoutParams = serde_json::from_str(r#"{"bubble_radius": 18}"#)?;
        assert_eq!(params.bubble_radius, 18);
        assert_eq!(params.page_width, 2100);
        assert_eq!(params.first_column_cutoff, 25);
        Ok(())
    }

    #[test]
    fn test_labels() {
        assert_eq!(option_letter(0), 'A');
        assert_eq!(option_letter(3), 'D');
        assert_eq!(option_index('c'), Some(2));
        assert_eq!(option_index('?'), None);
        assert_eq!(question_label(9), "Q10");
        assert_eq!(parse_question_label("Q10"), Some(9));
        assert_eq!(parse_question_label("Q0"), None);
        assert_eq!(parse_question_label("10"), None);
    }

    #[test]
    fn test_ideal_intensity() {
        let bubble = BubbleSpec {
            question_index: 0,
            option_index: 0,
            center_x: 0,
            center_y: 0,
            radius: 20,
        };
        let expected = std::f64::consts::PI * 400.0 * 255.0;
        assert!((bubble.ideal_intensity() - expected).abs() < 1e-9);
        assert_eq!(bubble.bounding_square(), (-20, -20, 20, 20));
    }
}
