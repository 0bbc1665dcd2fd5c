//! Pixel processors used by the extraction pipeline.

pub mod binarize;
pub mod bubble;

pub use binarize::{binarize_inverted, intensity_sum};
pub use bubble::BubbleClassifier;
