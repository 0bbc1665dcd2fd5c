//! The core module of the sheet pipelines.
//!
//! This module contains:
//! - Error handling
//! - Configuration validation
//! - Template constants

pub mod config;
pub mod constants;
pub mod errors;

pub use config::{ConfigError, ConfigValidator};
pub use constants::*;
pub use errors::{OmrError, OmrResult, ProcessingStage, SimpleError};
