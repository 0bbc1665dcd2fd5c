//! Error types for sheet rendering and extraction.
//!
//! This module defines the errors that can occur while rendering answer sheets,
//! ingesting scanned pages and extracting fields from them. Stage-specific
//! constructors attach a [`ProcessingStage`] and a short context string to an
//! underlying error so that log lines and error payloads say where things failed.

use thiserror::Error;

use super::config::ConfigError;

/// Enum representing the stage of the sheet pipeline in which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Painting the sheet or writing its image/document.
    Render,
    /// Unpacking an archive into the working directory.
    Archive,
    /// Parsing or rasterising a paginated document.
    Document,
    /// Running text recognition on a field region.
    Recognition,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Render => write!(f, "render"),
            ProcessingStage::Archive => write!(f, "archive extraction"),
            ProcessingStage::Document => write!(f, "document rasterisation"),
            ProcessingStage::Recognition => write!(f, "text recognition"),
        }
    }
}

/// Enum representing the errors that can occur in the sheet pipelines.
#[derive(Error, Debug)]
pub enum OmrError {
    /// Error occurred while decoding or encoding an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// A top-level input (or archive member) has an extension no ingestor handles.
    #[error("Unsupported file format: {path}")]
    UnsupportedFormat {
        /// The offending path, as given.
        path: String,
    },

    /// Error occurred during one of the processing stages.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialisation error.
    #[error("json")]
    Json(#[from] serde_json::Error),
}

impl OmrError {
    /// Creates an `OmrError` for a processing stage.
    ///
    /// # Arguments
    ///
    /// * `kind` - The stage of processing where the error occurred.
    /// * `context` - Additional context about the error.
    /// * `error` - The underlying error that caused this error.
    pub fn processing_error(
        kind: ProcessingStage,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an `OmrError` for sheet rendering.
    pub fn render(context: &str, error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::processing_error(ProcessingStage::Render, context, error)
    }

    /// Creates an `OmrError` for archive extraction.
    pub fn archive(context: &str, error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::processing_error(ProcessingStage::Archive, context, error)
    }

    /// Creates an `OmrError` for paginated-document rasterisation.
    pub fn document(context: &str, error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::processing_error(ProcessingStage::Document, context, error)
    }

    /// Creates an `OmrError` for text recognition.
    pub fn recognition(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::processing_error(ProcessingStage::Recognition, context, error)
    }

    /// Creates an `OmrError` for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an `OmrError` for an unsupported file extension.
    pub fn unsupported_format(path: impl Into<String>) -> Self {
        Self::UnsupportedFormat { path: path.into() }
    }

    /// Renders the error and its source chain as one line.
    ///
    /// Error payloads handed back to callers are single strings, so the
    /// `source()` chain is flattened with `": "` separators.
    pub fn to_report_string(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

/// A simple string error used as the `source` of processing errors whose cause
/// is a message rather than a typed error (e.g. a failed external tool).
#[derive(Debug, Clone)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    /// Creates a new error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SimpleError {}

/// Result alias used across the workspace.
pub type OmrResult<T> = Result<T, OmrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_message() {
        let err = OmrError::unsupported_format("notes.txt");
        assert_eq!(err.to_string(), "Unsupported file format: notes.txt");
    }

    #[test]
    fn test_report_string_flattens_sources() {
        let err = OmrError::archive("sheets.zip", SimpleError::new("unar not found"));
        assert_eq!(
            err.to_report_string(),
            "archive extraction failed: sheets.zip: unar not found"
        );
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err: OmrError = ConfigError::InvalidConfig {
            message: "bubble radius must be positive".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "invalid configuration: bubble radius must be positive"
        );
    }
}
