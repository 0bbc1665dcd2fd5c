//! # OMR Sheet Core
//!
//! Core types and pixel processing for printable multiple-choice answer
//! sheets.
//!
//! This crate provides:
//! - Error handling types
//! - The sheet geometry shared by rendering and extraction
//! - Extraction results
//! - Bubble classification
//!
//! ## Modules
//!
//! * [`core`] - Errors, configuration validation and template constants
//! * [`domain`] - Sheet layout, field names and extraction results
//! * [`processors`] - Binarisation and bubble fill classification
//! * [`utils`] - Image cropping helpers

pub mod core;
pub mod domain;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::{ConfigError, ConfigValidator, OmrError, OmrResult};
    pub use crate::domain::{
        BubbleSpec, ExtractionResult, FieldName, FieldRegion, LayoutParams, RasterPage,
        SheetLayout, compute_layout,
    };
    pub use crate::processors::BubbleClassifier;
}
