//! The core module of the sheet pipelines.
//!
//! Errors, configuration validation and the template constants live in
//! `omr-sheet-core` and are re-exported here so the pipelines can name them
//! as `crate::core::*`.

pub use omr_sheet_core::core::*;
