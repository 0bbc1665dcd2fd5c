//! Domain types shared by the rendering and extraction pipelines.

pub mod fields;
pub mod layout;
pub mod result;

pub use fields::{FieldGroup, FieldName};
pub use layout::{
    BubbleSpec, FieldRegion, LayoutParams, QuestionAnchor, SheetLayout, compute_layout,
    option_index, option_letter, parse_question_label, question_label,
};
pub use result::ExtractionResult;

/// A decoded page: 8-bit RGB, height x width x 3.
pub type RasterPage = image::RgbImage;
