//! PDF rasterisation using the pure Rust `hayro` library.

use hayro::Pdf;
use image::RgbImage;
use std::path::Path;
use std::sync::Arc;

use crate::core::{OmrError, OmrResult, SimpleError};

/// An opened PDF whose pages can be rendered one at a time.
pub struct PdfDocument {
    pdf: Pdf,
}

impl PdfDocument {
    /// Opens a PDF file from the given path.
    pub fn open(path: &Path) -> OmrResult<Self> {
        let data = std::fs::read(path)?;
        let pdf = Pdf::new(Arc::new(data)).map_err(|e| {
            OmrError::document(
                &path.display().to_string(),
                SimpleError::new(format!("failed to parse PDF: {e:?}")),
            )
        })?;
        Ok(Self { pdf })
    }

    /// Returns the number of pages in the PDF.
    pub fn page_count(&self) -> usize {
        self.pdf.pages().len()
    }

    /// Renders a page (0-based) at `dpi`, flattened on white.
    pub fn render_page(&self, index: usize, dpi: f32) -> OmrResult<RgbImage> {
        use hayro::RenderSettings;

        let context = format!("page {}", index + 1);
        let page = self
            .pdf
            .pages()
            .get(index)
            .ok_or_else(|| OmrError::document(&context, SimpleError::new("page not found")))?;

        let media_box = page.media_box();
        let width = (media_box.x1 - media_box.x0) as f32;
        let height = (media_box.y1 - media_box.y0) as f32;
        if width <= 0.0 || height <= 0.0 {
            return Err(OmrError::document(
                &context,
                SimpleError::new(format!("invalid page size: {width}x{height}")),
            ));
        }

        let scale = dpi / 72.0;
        let settings = RenderSettings {
            x_scale: scale,
            y_scale: scale,
            ..Default::default()
        };
        let interpreter_settings = hayro::InterpreterSettings::default();
        let pixmap = hayro::render(page, &interpreter_settings, &settings);

        let rgb_data = flatten_on_white(pixmap.data_as_u8_slice());
        RgbImage::from_raw(u32::from(pixmap.width()), u32::from(pixmap.height()), rgb_data)
            .ok_or_else(|| {
                OmrError::document(&context, SimpleError::new("pixmap size mismatch"))
            })
    }
}

/// Composites premultiplied RGBA over a white background.
fn flatten_on_white(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let uncovered = 255 - px[3];
        rgb.extend(px[..3].iter().map(|c| c.saturating_add(uncovered)));
    }
    rgb
}
