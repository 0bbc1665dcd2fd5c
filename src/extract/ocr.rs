//! Text recognition backends.

use image::{GrayImage, ImageFormat};
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

use crate::core::{OCR_DENYLIST, OmrError, OmrResult, SimpleError};

/// Reads the text in a binarised field crop.
pub trait TextRecognizer: Send + Sync {
    /// Returns the raw recognised text; cleanup is the caller's job.
    fn recognize(&self, image: &GrayImage) -> OmrResult<String>;

    /// A short name for logs.
    fn name(&self) -> &str;
}

/// Runs the `tesseract` command line tool on each crop.
///
/// The crop is piped to tesseract as PNG on stdin and the text read back from
/// stdout. Page segmentation mode 6 treats the crop as a single uniform block
/// of text, which suits the one-line fields of the sheet.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    program: PathBuf,
    psm: u8,
    language: Option<String>,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("tesseract"),
            psm: 6,
            language: None,
        }
    }
}

impl TesseractRecognizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    fn encode(image: &GrayImage) -> OmrResult<Vec<u8>> {
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, ImageFormat::Png)
            .map_err(OmrError::ImageLoad)?;
        Ok(bytes.into_inner())
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &GrayImage) -> OmrResult<String> {
        let png = Self::encode(image)?;
        let context = self.program.display().to_string();

        let mut command = Command::new(&self.program);
        command.arg("stdin").arg("stdout").arg("--psm").arg(self.psm.to_string());
        if let Some(language) = &self.language {
            command.arg("-l").arg(language);
        }
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| OmrError::recognition(&context, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&png)
                .map_err(|e| OmrError::recognition(&context, e))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|e| OmrError::recognition(&context, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OmrError::recognition(
                &context,
                SimpleError::new(format!("exited with {}: {}", output.status, stderr.trim())),
            ));
        }
        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("tesseract read {:?}", text);
        Ok(text)
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// Recognises nothing. Used for bubble-only extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankRecognizer;

impl TextRecognizer for BlankRecognizer {
    fn recognize(&self, _image: &GrayImage) -> OmrResult<String> {
        Ok(String::new())
    }

    fn name(&self) -> &str {
        "blank"
    }
}

/// Strips frame-line and quote artifacts from recognised text and trims it.
pub fn clean_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| !OCR_DENYLIST.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("| Amina Benali |\n"), "Amina Benali");
        assert_eq!(clean_text("\"ZTR24517M'"), "ZTR24517M");
        assert_eq!(clean_text("a/b\\c`d"), "abcd");
        assert_eq!(clean_text(" |/ "), "");
    }

    #[test]
    fn test_missing_tesseract_is_a_recognition_error() {
        let recognizer = TesseractRecognizer::new("/nonexistent/tesseract");
        let err = recognizer.recognize(&GrayImage::new(4, 4)).unwrap_err();
        assert!(err.to_string().starts_with("text recognition failed"), "{err}");
    }

    #[test]
    fn test_blank_recognizer() -> OmrResult<()> {
        assert_eq!(BlankRecognizer.recognize(&GrayImage::new(4, 4))?, "");
        Ok(())
    }
}
