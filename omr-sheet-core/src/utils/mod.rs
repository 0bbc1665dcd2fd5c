//! Utility functions for images.

pub mod crop;

pub use crop::{clamp_rect, crop_clamped};
