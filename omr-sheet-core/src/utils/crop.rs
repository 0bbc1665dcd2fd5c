//! Clamped rectangle cropping.

use image::{RgbImage, imageops};

/// Intersection of the half-open rectangle `[x1, x2) x [y1, y2)` with an
/// image of the given size, as `(x, y, width, height)`.
///
/// Returns `None` when the intersection is empty.
pub fn clamp_rect(
    (x1, y1, x2, y2): (i32, i32, i32, i32),
    width: u32,
    height: u32,
) -> Option<(u32, u32, u32, u32)> {
    let clamp_x = |v: i32| v.clamp(0, width.min(i32::MAX as u32) as i32) as u32;
    let clamp_y = |v: i32| v.clamp(0, height.min(i32::MAX as u32) as i32) as u32;
    let (left, right) = (clamp_x(x1), clamp_x(x2));
    let (top, bottom) = (clamp_y(y1), clamp_y(y2));
    if right <= left || bottom <= top {
        return None;
    }
    Some((left, top, right - left, bottom - top))
}

/// Crops a rectangle out of a page, clipped to the page bounds.
///
/// Returns `None` if nothing of the rectangle lies on the page.
pub fn crop_clamped(img: &RgbImage, rect: (i32, i32, i32, i32)) -> Option<RgbImage> {
    let (x, y, w, h) = clamp_rect(rect, img.width(), img.height())?;
    Some(imageops::crop_imm(img, x, y, w, h).to_image())
}
