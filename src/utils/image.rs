//! Image loading and saving.
//!
//! Scans arrive with whatever extension the scanner or the user chose, so
//! decoding falls back to content sniffing when the extension-based decoder
//! rejects the bytes.

use image::{DynamicImage, ImageError, ImageReader, RgbImage};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::core::OmrError;

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Errors
///
/// Returns `OmrError::ImageLoad` if the file cannot be read or decoded,
/// even after retrying with the format guessed from its content.
pub fn load_image(path: &Path) -> Result<RgbImage, OmrError> {
    load_dynamic_image(path)
        .map(|img| img.to_rgb8())
        .map_err(OmrError::ImageLoad)
}

fn load_dynamic_image(path: &Path) -> Result<DynamicImage, ImageError> {
    match image::open(path) {
        Ok(img) => Ok(img),
        Err(err) if should_retry(&err) => {
            tracing::warn!(
                "Standard decode failed for {} ({err}). Retrying with format sniffing.",
                path.display()
            );
            decode_with_guessed_format(path)
        }
        Err(err) => Err(err),
    }
}

fn should_retry(err: &ImageError) -> bool {
    matches!(err, ImageError::Decoding(_) | ImageError::Unsupported(_))
}

fn decode_with_guessed_format(path: &Path) -> Result<DynamicImage, ImageError> {
    let file = File::open(path)?;
    let reader = ImageReader::new(BufReader::new(file)).with_guessed_format()?;
    reader.decode()
}

/// Encodes a page as PNG into memory.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, OmrError> {
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png)
        .map_err(OmrError::ImageLoad)?;
    Ok(bytes.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_load_image_with_lying_extension() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("scan.jpg");
        let img = RgbImage::from_pixel(8, 6, Rgb([200, 10, 10]));
        std::fs::write(&path, encode_png(&img)?)?;

        let loaded = load_image(&path)?;
        assert_eq!(loaded.dimensions(), (8, 6));
        assert_eq!(loaded.get_pixel(0, 0), &Rgb([200, 10, 10]));
        Ok(())
    }

    #[test]
    fn test_load_garbage_fails() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image at all")?;

        assert!(matches!(load_image(&path), Err(OmrError::ImageLoad(_))));
        Ok(())
    }
}
