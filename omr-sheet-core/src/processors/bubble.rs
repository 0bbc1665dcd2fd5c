//! Bubble fill classification.

use image::RgbImage;
use tracing::debug;

use super::binarize::{binarize_inverted, intensity_sum};
use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::constants::{DEFAULT_BINARIZE_THRESHOLD, DEFAULT_FILL_THRESHOLD};
use crate::domain::layout::BubbleSpec;
use crate::utils::crop::crop_clamped;

/// Decides which bubble, if any, is marked on a question row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleClassifier {
    binarize_threshold: u8,
    fill_threshold: f64,
}

impl Default for BubbleClassifier {
    fn default() -> Self {
        Self {
            binarize_threshold: DEFAULT_BINARIZE_THRESHOLD,
            fill_threshold: DEFAULT_FILL_THRESHOLD,
        }
    }
}

impl BubbleClassifier {
    pub fn new(binarize_threshold: u8, fill_threshold: f64) -> Result<Self, ConfigError> {
        let classifier = Self {
            binarize_threshold,
            fill_threshold,
        };
        classifier.validate()?;
        Ok(classifier)
    }

    /// Ink in the bubble's bounding square relative to a fully inked circle.
    ///
    /// Returns `None` when the square lies entirely off the page. The ratio
    /// can exceed 1.0 since the square is larger than the circle.
    pub fn fill_ratio(&self, page: &RgbImage, bubble: &BubbleSpec) -> Option<f64> {
        let crop = crop_clamped(page, bubble.bounding_square())?;
        let bin = binarize_inverted(&crop, self.binarize_threshold);
        Some(intensity_sum(&bin) as f64 / bubble.ideal_intensity())
    }

    /// A bubble is marked when its ratio strictly exceeds the threshold.
    pub fn is_marked(&self, ratio: f64) -> bool {
        ratio > self.fill_threshold
    }

    /// The letter of the first marked bubble of a row, in option order.
    ///
    /// Later options are not examined once one is marked, so a row with
    /// several marks reports the earliest.
    pub fn classify_question(&self, page: &RgbImage, row: &[BubbleSpec]) -> Option<char> {
        for bubble in row {
            let Some(ratio) = self.fill_ratio(page, bubble) else {
                debug!(
                    question = bubble.question_index,
                    option = bubble.option_index,
                    "bubble lies outside the page, skipping"
                );
                continue;
            };
            if self.is_marked(ratio) {
                return Some(bubble.option_letter());
            }
        }
        None
    }
}

impl ConfigValidator for BubbleClassifier {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_ratio_threshold("fill_threshold", self.fill_threshold)
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}
