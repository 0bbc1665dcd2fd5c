//! Single-image sources.

use std::path::Path;

use crate::core::{OmrError, OmrResult};
use crate::domain::RasterPage;
use crate::utils::load_image;

/// Decodes one image file into a page.
///
/// A file that decodes to zero width or height is reported as an error
/// rather than handed on as an empty page.
pub fn load_page(path: &Path) -> OmrResult<RasterPage> {
    let page = load_image(path)?;
    if page.width() == 0 || page.height() == 0 {
        return Err(OmrError::invalid_input(format!(
            "{} decodes to an empty image",
            path.display()
        )));
    }
    Ok(page)
}
