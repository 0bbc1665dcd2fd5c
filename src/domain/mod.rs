//! Domain types shared by rendering and extraction.
//!
//! Re-exported from `omr-sheet-core`: the sheet layout, field names and
//! extraction results.

pub use omr_sheet_core::domain::*;
