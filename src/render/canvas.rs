//! Drawing primitives for the sheet canvas.

use ab_glyph::{Font, FontVec, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_text_mut,
};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{debug, info, warn};

pub const INK: Rgb<u8> = Rgb([0, 0, 0]);

pub const PAPER: Rgb<u8> = Rgb([255, 255, 255]);

const SYSTEM_FONT_PATHS: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Times New Roman Bold.ttf",
    "C:\\Windows\\Fonts\\timesbd.ttf",
];

/// Loads a font from the specified path.
pub fn load_font_file(font_path: &Path) -> Result<FontVec, Box<dyn std::error::Error + Send + Sync>> {
    let font_data = std::fs::read(font_path)?;
    let font = FontVec::try_from_vec(font_data)
        .map_err(|_| format!("Failed to parse font file: {}", font_path.display()))?;
    Ok(font)
}

/// Attempts to load a system font from common locations.
pub fn load_system_font() -> Option<FontVec> {
    for path in &SYSTEM_FONT_PATHS {
        if let Ok(font_data) = std::fs::read(path)
            && let Ok(font) = FontVec::try_from_vec(font_data)
        {
            info!("Loaded system font: {}", path);
            return Some(font);
        }
    }
    None
}

/// Resolves the font used for sheet text.
///
/// An explicit path is tried first, then the system fonts. Without any font,
/// sheets are still drawn but carry no text.
pub fn resolve_font(font_path: Option<&Path>) -> Option<FontVec> {
    if let Some(path) = font_path {
        match load_font_file(path) {
            Ok(font) => {
                info!("Using custom font: {}", path.display());
                return Some(font);
            }
            Err(e) => warn!(
                "Failed to load custom font {}: {}. Falling back to system font.",
                path.display(),
                e
            ),
        }
    }
    let font = load_system_font();
    if font.is_none() {
        warn!("No font found, sheet text will be skipped");
    }
    font
}

/// Width of a line of text at the given pixel size.
pub fn measure_text_width(text: &str, font: &FontVec, scale: f32) -> f32 {
    let scaled_font = font.as_scaled(scale);
    text.chars()
        .map(|ch| scaled_font.h_advance(scaled_font.glyph_id(ch)))
        .sum()
}

/// Draws text horizontally centred on `center_x`, with `top` as its top edge.
pub fn draw_centered_text(
    img: &mut RgbImage,
    font: &FontVec,
    text: &str,
    (center_x, top): (i32, i32),
    scale: f32,
) {
    if text.is_empty() {
        return;
    }
    let width = measure_text_width(text, font, scale);
    let x = center_x - (width / 2.0).round() as i32;
    draw_text_mut(img, INK, x, top, scale, font, text);
}

/// Draws a rectangle outline `thickness` pixels wide, centred on its edges.
///
/// `(x1, y1)` and `(x2, y2)` are opposite corners, both on the outline.
pub fn draw_thick_rect(img: &mut RgbImage, (x1, y1, x2, y2): (i32, i32, i32, i32), thickness: i32) {
    let half = thickness / 2;
    for i in 0..thickness {
        let offset = i - half;
        let width = x2 - x1 + 1 - 2 * offset;
        let height = y2 - y1 + 1 - 2 * offset;
        if width <= 0 || height <= 0 {
            debug!("rectangle collapsed at offset {offset}, stopping");
            break;
        }
        let rect = Rect::at(x1 + offset, y1 + offset).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(img, rect, INK);
    }
}

/// Draws a circle outline whose outer edge lies on `radius`.
pub fn draw_ring(img: &mut RgbImage, center: (i32, i32), radius: i32, thickness: i32) {
    for i in 0..thickness.min(radius + 1) {
        draw_hollow_circle_mut(img, center, radius - i, INK);
    }
}

/// Draws a solid disc, as a pencil mark fills a bubble.
pub fn draw_disc(img: &mut RgbImage, center: (i32, i32), radius: i32) {
    draw_filled_circle_mut(img, center, radius, INK);
}
