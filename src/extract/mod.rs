//! Reading fields and answers off a raster page.

pub mod ocr;

use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::{
    ConfigError, ConfigValidator, DEFAULT_BINARIZE_THRESHOLD, DEFAULT_FILL_THRESHOLD,
};
use crate::domain::{ExtractionResult, FieldRegion, RasterPage, SheetLayout};
use omr_sheet_core::processors::{BubbleClassifier, binarize_inverted};
use omr_sheet_core::utils::crop_clamped;

pub use ocr::{BlankRecognizer, TesseractRecognizer, TextRecognizer, clean_text};

/// Configuration for [`FieldExtractor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Gray level at or below which a pixel counts as ink.
    pub binarize_threshold: u8,
    /// Fill ratio a bubble must strictly exceed to count as marked.
    pub fill_threshold: f64,
    /// Resample pages whose size differs from the layout's page size.
    pub resize_to_layout: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binarize_threshold: DEFAULT_BINARIZE_THRESHOLD,
            fill_threshold: DEFAULT_FILL_THRESHOLD,
            resize_to_layout: false,
        }
    }
}

impl ConfigValidator for ExtractorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_ratio_threshold("fill_threshold", self.fill_threshold)
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Extracts text fields and marked answers from pages printed with one layout.
pub struct FieldExtractor {
    layout: Arc<SheetLayout>,
    recognizer: Box<dyn TextRecognizer>,
    classifier: BubbleClassifier,
    config: ExtractorConfig,
}

impl FieldExtractor {
    pub fn new(
        layout: Arc<SheetLayout>,
        recognizer: Box<dyn TextRecognizer>,
        config: ExtractorConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let classifier = BubbleClassifier::new(config.binarize_threshold, config.fill_threshold)?;
        Ok(Self {
            layout,
            recognizer,
            classifier,
            config,
        })
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    /// Reads every field and answer on `page`.
    ///
    /// Never fails: an empty page gives a result with `error` set, and
    /// unreadable fields or bubbles are left empty or absent.
    pub fn extract(&self, page: &RasterPage) -> ExtractionResult {
        if page.width() == 0 || page.height() == 0 {
            return ExtractionResult::failed("page has no pixels");
        }

        let page = self.fit_to_layout(page);
        let mut result = ExtractionResult::default();
        for region in self.layout.field_regions() {
            result.set_field(region.name, self.read_field(&page, region));
        }
        result.checked_options = self.read_answers(&page);
        result
    }

    /// Recognised and cleaned text of one field, `""` if unreadable.
    pub fn read_field(&self, page: &RasterPage, region: &FieldRegion) -> String {
        let Some(crop) = crop_clamped(page, (region.x1, region.y1, region.x2, region.y2)) else {
            debug!("field {} lies outside the page", region.name);
            return String::new();
        };
        let binary = binarize_inverted(&crop, self.config.binarize_threshold);
        match self.recognizer.recognize(&binary) {
            Ok(raw) => clean_text(&raw),
            Err(e) => {
                warn!(
                    "{} failed on field {}: {}",
                    self.recognizer.name(),
                    region.name,
                    e.to_report_string()
                );
                String::new()
            }
        }
    }

    /// Marked option per question. Unanswered questions are absent.
    pub fn read_answers(&self, page: &RasterPage) -> BTreeMap<usize, char> {
        (0..self.layout.question_count())
            .filter_map(|question| {
                self.classifier
                    .classify_question(page, self.layout.bubbles_for(question))
                    .map(|letter| (question, letter))
            })
            .collect()
    }

    fn fit_to_layout<'a>(&self, page: &'a RasterPage) -> Cow<'a, RasterPage> {
        let (width, height) = self.layout.page_size();
        if !self.config.resize_to_layout || page.dimensions() == (width, height) {
            return Cow::Borrowed(page);
        }
        debug!(
            "Resizing page from {}x{} to {width}x{height}",
            page.width(),
            page.height()
        );
        Cow::Owned(imageops::resize(page, width, height, FilterType::Triangle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OmrError, OmrResult, SimpleError};
    use crate::domain::{FieldName, LayoutParams, compute_layout};
    use image::{GrayImage, Rgb, RgbImage};
    use imageproc::drawing::draw_filled_circle_mut;
    use std::sync::Mutex;

    /// Returns a fixed reply and records the size of every crop it sees.
    struct ScriptedRecognizer {
        reply: Option<String>,
        seen: Mutex<Vec<(u32, u32)>>,
    }

    impl ScriptedRecognizer {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextRecognizer for Arc<ScriptedRecognizer> {
        fn recognize(&self, image: &GrayImage) -> OmrResult<String> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(image.dimensions());
            }
            self.reply.clone().ok_or_else(|| {
                OmrError::recognition("scripted", SimpleError::new("no text today"))
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn layout() -> Arc<SheetLayout> {
        Arc::new(compute_layout(LayoutParams::default()).unwrap_or_default())
    }

    fn blank_page() -> RgbImage {
        RgbImage::from_pixel(2100, 2970, Rgb([255, 255, 255]))
    }

    fn mark(page: &mut RgbImage, layout: &SheetLayout, question: usize, option: usize) {
        let bubble = layout.bubbles_for(question)[option];
        draw_filled_circle_mut(
            page,
            (bubble.center_x, bubble.center_y),
            bubble.radius,
            Rgb([0, 0, 0]),
        );
    }

    #[test]
    fn test_reads_marks() -> Result<(), ConfigError> {
        let layout = layout();
        let extractor =
            FieldExtractor::new(layout.clone(), Box::new(BlankRecognizer), ExtractorConfig::default())?;
        let mut page = blank_page();
        mark(&mut page, &layout, 0, 1);
        mark(&mut page, &layout, 1, 3);
        mark(&mut page, &layout, 27, 2);

        let result = extractor.extract(&page);
        assert_eq!(result.checked_options, BTreeMap::from([(0, 'B'), (1, 'D'), (27, 'C')]));
        assert!(result.error.is_none());
        Ok(())
    }

    #[test]
    fn test_text_is_cleaned_and_grouped() -> Result<(), ConfigError> {
        let recognizer = Arc::new(ScriptedRecognizer::replying("| Amina /\n"));
        let extractor =
            FieldExtractor::new(layout(), Box::new(recognizer.clone()), ExtractorConfig::default())?;

        let result = extractor.extract(&blank_page());
        assert_eq!(result.exam_info.len(), 4);
        assert_eq!(result.student_info.len(), 3);
        assert_eq!(result.field(FieldName::StudentCin), Some("Amina"));
        assert!(result.checked_options.is_empty());

        let seen = recognizer.seen.lock().map(|s| s.clone()).unwrap_or_default();
        assert_eq!(seen.len(), 7);
        assert!(seen.contains(&(800, 60)));
        assert!(seen.contains(&(400, 70)));
        Ok(())
    }

    #[test]
    fn test_recognizer_failure_leaves_field_empty() -> Result<(), ConfigError> {
        let recognizer = Arc::new(ScriptedRecognizer::failing());
        let extractor =
            FieldExtractor::new(layout(), Box::new(recognizer), ExtractorConfig::default())?;

        let result = extractor.extract(&blank_page());
        assert!(result.exam_info.values().all(String::is_empty));
        assert!(result.error.is_none());
        Ok(())
    }

    #[test]
    fn test_empty_page_is_an_error_result() -> Result<(), ConfigError> {
        let extractor =
            FieldExtractor::new(layout(), Box::new(BlankRecognizer), ExtractorConfig::default())?;
        let result = extractor.extract(&RgbImage::new(0, 0));
        assert!(result.is_error());
        assert!(result.exam_info.is_empty() && result.checked_options.is_empty());
        Ok(())
    }

    #[test]
    fn test_small_page_yields_empty_fields() -> Result<(), ConfigError> {
        let recognizer = Arc::new(ScriptedRecognizer::replying("text"));
        let extractor =
            FieldExtractor::new(layout(), Box::new(recognizer.clone()), ExtractorConfig::default())?;

        let result = extractor.extract(&RgbImage::from_pixel(300, 300, Rgb([255, 255, 255])));
        assert_eq!(result.field(FieldName::ExamTitle), Some(""));
        assert!(result.checked_options.is_empty());
        Ok(())
    }

    #[test]
    fn test_resize_to_layout() -> Result<(), ConfigError> {
        let layout = layout();
        let mut page = blank_page();
        mark(&mut page, &layout, 3, 0);
        let half = imageops::resize(&page, 1050, 1485, FilterType::Triangle);

        let config = ExtractorConfig {
            resize_to_layout: true,
            ..ExtractorConfig::default()
        };
        let extractor = FieldExtractor::new(layout.clone(), Box::new(BlankRecognizer), config)?;
        assert_eq!(extractor.extract(&half).answer(3), Some('A'));

        let strict =
            FieldExtractor::new(layout, Box::new(BlankRecognizer), ExtractorConfig::default())?;
        assert_eq!(strict.extract(&half).answer(3), None);
        Ok(())
    }

    #[test]
    fn test_config_rejects_bad_threshold() {
        let config = ExtractorConfig {
            fill_threshold: -0.1,
            ..ExtractorConfig::default()
        };
        assert!(FieldExtractor::new(layout(), Box::new(BlankRecognizer), config).is_err());
    }
}
