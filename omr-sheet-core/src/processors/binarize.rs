//! Fixed-threshold binarisation.

use image::{GrayImage, Luma, RgbImage, imageops};

/// Converts to grayscale and applies an inverted global threshold.
///
/// Pixels at or below `threshold` (ink) become 255, everything else 0, so
/// the sum of the output measures how much ink the region holds.
pub fn binarize_inverted(img: &RgbImage, threshold: u8) -> GrayImage {
    let mut gray = imageops::grayscale(img);
    for Luma([p]) in gray.pixels_mut() {
        *p = if *p <= threshold { 255 } else { 0 };
    }
    gray
}

/// Sum of all pixel intensities.
pub fn intensity_sum(img: &GrayImage) -> u64 {
    img.as_raw().iter().map(|&p| u64::from(p)).sum()
}
