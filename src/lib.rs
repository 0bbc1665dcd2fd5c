//! # OMR Sheet
//!
//! Printable multiple-choice answer sheets and the machinery to read them back.
//!
//! ## Features
//!
//! - Sheet rendering to PNG and PDF, one per student or as a merged roster
//! - Extraction of exam metadata, student identity and marked answers from
//!   scanned images, PDFs and ZIP/RAR archives of either
//! - Grading of extraction results against an answer key
//!
//! Rendering and extraction share a single [`domain::SheetLayout`], so every
//! bubble and field is read from exactly where it was printed.
//!
//! ## Modules
//!
//! * [`core`] - Error handling, configuration validation and constants
//! * [`domain`] - Sheet layout, field names and extraction results
//! * [`render`] - Painting sheets and writing them to disk
//! * [`ingest`] - Turning images, documents and archives into raster pages
//! * [`extract`] - Reading fields and answers off a page
//! * [`batch`] - Extraction over every page of every input
//! * [`grading`] - Scoring results against an answer key
//! * [`utils`] - Image loading and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use omr_sheet::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = Arc::new(compute_layout(LayoutParams::default())?);
//!
//! let extractor = FieldExtractor::new(
//!     layout,
//!     Box::new(TesseractRecognizer::default()),
//!     ExtractorConfig::default(),
//! )?;
//! let batch = BatchAggregator::new(PageIngestor::default(), extractor);
//! let response = batch.run_response(&["scans.zip".into()])?;
//! println!("{}", serde_json::to_string(&response)?);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod core;
pub mod domain;
pub mod extract;
pub mod grading;
pub mod ingest;
pub mod render;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::batch::{BatchAggregator, ExtractResponse, ExtractedPage};
    pub use crate::core::{ConfigError, ConfigValidator, OmrError, OmrResult};
    pub use crate::domain::{
        ExtractionResult, FieldName, LayoutParams, RasterPage, SheetLayout, compute_layout,
    };
    pub use crate::extract::{
        BlankRecognizer, ExtractorConfig, FieldExtractor, TesseractRecognizer, TextRecognizer,
    };
    pub use crate::grading::{AnswerKey, GradeReport, grade};
    pub use crate::ingest::{IngestConfig, PageIngestor, PageSource};
    pub use crate::render::{ExamDefinition, RenderConfig, SheetRenderer};
    pub use crate::utils::{init_tracing, load_image};
}
