//! Constants of the answer-sheet template.
//!
//! The page is A4 at roughly 254 DPI (2100 x 2970 px). Every other value is a
//! pixel distance on that page, or a classification threshold.

/// Default page width in pixels.
pub const DEFAULT_PAGE_WIDTH: i32 = 2100;

/// Default page height in pixels.
pub const DEFAULT_PAGE_HEIGHT: i32 = 2970;

/// Number of question rows on one sheet.
pub const DEFAULT_QUESTIONS_PER_SHEET: usize = 30;

/// Number of options (A, B, C, D) per question.
pub const DEFAULT_OPTIONS_PER_QUESTION: usize = 4;

/// Questions with an index below this value go in the left column.
pub const DEFAULT_FIRST_COLUMN_CUTOFF: usize = 25;

/// Bubble radius in pixels.
pub const DEFAULT_BUBBLE_RADIUS: i32 = 20;

/// Horizontal distance between bubble centres in a row.
pub const DEFAULT_BUBBLE_SPACING: i32 = 60;

/// Vertical distance between question rows.
pub const DEFAULT_QUESTION_SPACING: i32 = 80;

/// X of the first bubble of the left column.
pub const DEFAULT_LEFT_MARGIN: i32 = 500;

/// Y of the first question row.
pub const DEFAULT_TOP_MARGIN: i32 = 800;

/// Horizontal distance between the left and right columns.
pub const DEFAULT_COLUMN_SPACING: i32 = 1000;

/// Width of each student identity box.
pub const DEFAULT_IDENTITY_BOX_WIDTH: i32 = 400;

/// Height of each student identity box.
pub const DEFAULT_IDENTITY_BOX_HEIGHT: i32 = 70;

/// Y of the top edge of the identity boxes.
pub const DEFAULT_IDENTITY_TOP: i32 = 500;

/// Distance from a column's first bubble back to its `Q<n>` label.
pub const DEFAULT_LABEL_OFFSET_X: i32 = 80;

/// Distance from a row's centre line down to the top of its `Q<n>` label.
pub const DEFAULT_LABEL_OFFSET_Y: i32 = 10;

/// Upper bound for every pixel distance in a layout.
///
/// With at most [`MAX_QUESTIONS_PER_SHEET`] rows, every coordinate derived
/// from parameters within this bound fits in an `i32`.
pub const MAX_LAYOUT_DISTANCE: i32 = 20_000;

/// Upper bound for the number of question rows on one sheet.
pub const MAX_QUESTIONS_PER_SHEET: usize = 1_000;

/// Gray level at or below which a pixel counts as ink.
pub const DEFAULT_BINARIZE_THRESHOLD: u8 = 128;

/// Fill ratio a bubble must strictly exceed to count as marked.
pub const DEFAULT_FILL_THRESHOLD: f64 = 0.5;

/// Characters stripped from recognised text (frame lines and quote artifacts).
pub const OCR_DENYLIST: [char; 6] = ['|', '"', '\'', '`', '\\', '/'];

/// Physical page size of the generated document, in millimetres.
pub const A4_SIZE_MM: (f32, f32) = (210.0, 297.0);

/// Rasterisation density for paginated documents.
///
/// 254 DPI maps the 210 mm page width onto the 2100 px template width.
pub const DEFAULT_DOCUMENT_DPI: f32 = 254.0;
