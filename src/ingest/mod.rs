//! Turning source artifacts into raster pages.
//!
//! A source is a single image, a PDF, or a ZIP/RAR archive holding any mix of
//! those (archives may nest). [`PageIngestor::for_each_page`] hands pages to a
//! visitor one at a time, so a page is fully processed before the next one is
//! decoded.
//!
//! Only an unsupported top-level extension is returned as an error. Anything
//! that goes wrong further down (an undecodable image, an unreadable PDF page,
//! a corrupt archive) is delivered to the visitor in place of the page.

pub mod archive;
pub mod image;
pub mod pdf;

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::{
    ConfigError, ConfigValidator, DEFAULT_DOCUMENT_DPI, OmrError, OmrResult, SimpleError,
};
use crate::domain::RasterPage;

/// Archive container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Rar,
}

/// What a source path holds, judged by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Image,
    Document,
    Archive(ArchiveKind),
}

impl InputKind {
    /// Classifies a path by its (case-insensitive) extension.
    ///
    /// # Errors
    ///
    /// `OmrError::UnsupportedFormat` for anything other than png, jpg, jpeg,
    /// pdf, zip or rar.
    pub fn classify(path: &Path) -> OmrResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("png" | "jpg" | "jpeg") => Ok(Self::Image),
            Some("pdf") => Ok(Self::Document),
            Some("zip") => Ok(Self::Archive(ArchiveKind::Zip)),
            Some("rar") => Ok(Self::Archive(ArchiveKind::Rar)),
            _ => Err(OmrError::unsupported_format(path.display().to_string())),
        }
    }
}

/// Where a page came from.
///
/// For archive members `path` is the archive path joined with the member's
/// name inside it, not the temporary location it was extracted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSource {
    pub path: PathBuf,
    /// 1-based page number within a paginated document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

impl PageSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            page: None,
        }
    }

    pub fn page(path: impl Into<PathBuf>, page: usize) -> Self {
        Self {
            path: path.into(),
            page: Some(page),
        }
    }
}

impl fmt::Display for PageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(f, "{} (page {page})", self.path.display()),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

/// Settings for [`PageIngestor`].
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    /// Rasterisation density for PDF pages.
    pub dpi: f32,
    /// Program used to unpack RAR archives.
    pub unar_program: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DOCUMENT_DPI,
            unar_program: PathBuf::from("unar"),
        }
    }
}

impl ConfigValidator for IngestConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(ConfigError::InvalidConfig {
                message: format!("dpi must be positive, got {}", self.dpi),
            });
        }
        if self.unar_program.as_os_str().is_empty() {
            return Err(ConfigError::InvalidConfig {
                message: "unar_program must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Reads every page out of a source artifact.
#[derive(Debug, Clone, Default)]
pub struct PageIngestor {
    config: IngestConfig,
}

impl PageIngestor {
    pub fn new(config: IngestConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Delivers every page of `path` to `visit`, in order.
    ///
    /// # Errors
    ///
    /// Only when `path` itself has an unsupported extension. All later
    /// failures reach `visit` as an `Err` page.
    pub fn for_each_page<F>(&self, path: &Path, visit: &mut F) -> OmrResult<()>
    where
        F: FnMut(PageSource, OmrResult<RasterPage>),
    {
        let kind = InputKind::classify(path)?;
        self.ingest(path, path, kind, visit);
        Ok(())
    }

    /// Collects every page of `path`.
    pub fn pages(&self, path: &Path) -> OmrResult<Vec<(PageSource, OmrResult<RasterPage>)>> {
        let mut pages = Vec::new();
        self.for_each_page(path, &mut |source, page| pages.push((source, page)))?;
        Ok(pages)
    }

    fn ingest<F>(&self, path: &Path, shown: &Path, kind: InputKind, visit: &mut F)
    where
        F: FnMut(PageSource, OmrResult<RasterPage>),
    {
        debug!("Ingesting {} as {:?}", shown.display(), kind);
        match kind {
            InputKind::Image => visit(PageSource::file(shown), image::load_page(path)),
            InputKind::Document => self.ingest_document(path, shown, visit),
            InputKind::Archive(archive_kind) => {
                self.ingest_archive(path, shown, archive_kind, visit)
            }
        }
    }

    fn ingest_document<F>(&self, path: &Path, shown: &Path, visit: &mut F)
    where
        F: FnMut(PageSource, OmrResult<RasterPage>),
    {
        let doc = match pdf::PdfDocument::open(path) {
            Ok(doc) => doc,
            Err(e) => return visit(PageSource::file(shown), Err(e)),
        };
        let page_count = doc.page_count();
        if page_count == 0 {
            return visit(
                PageSource::file(shown),
                Err(OmrError::document(
                    &shown.display().to_string(),
                    SimpleError::new("document has no pages"),
                )),
            );
        }
        for index in 0..page_count {
            let page = doc.render_page(index, self.config.dpi);
            visit(PageSource::page(shown, index + 1), page);
        }
    }

    fn ingest_archive<F>(&self, path: &Path, shown: &Path, kind: ArchiveKind, visit: &mut F)
    where
        F: FnMut(PageSource, OmrResult<RasterPage>),
    {
        let work_dir = match archive::extract_archive(path, kind, &self.config.unar_program) {
            Ok(dir) => dir,
            Err(e) => return visit(PageSource::file(shown), Err(e)),
        };
        let members = match archive::walk_files(work_dir.path()) {
            Ok(members) => members,
            Err(e) => {
                let context = shown.display().to_string();
                return visit(PageSource::file(shown), Err(OmrError::archive(&context, e)));
            }
        };

        for (member_path, relative) in members {
            let member_shown = shown.join(&relative);
            match InputKind::classify(&member_path) {
                Ok(member_kind) => self.ingest(&member_path, &member_shown, member_kind, visit),
                Err(_) => warn!(
                    "Skipping unsupported archive member: {}",
                    member_shown.display()
                ),
            }
        }
        // `work_dir` is dropped here, removing the extracted files.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{Rgb, RgbImage};
    use std::fs::File;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
        crate::utils::encode_png(&img).unwrap_or_default()
    }

    #[test]
    fn test_classify() {
        let cases = [
            ("scan.PNG", InputKind::Image),
            ("scan.jpeg", InputKind::Image),
            ("scan.Jpg", InputKind::Image),
            ("batch.pdf", InputKind::Document),
            ("batch.zip", InputKind::Archive(ArchiveKind::Zip)),
            ("batch.RAR", InputKind::Archive(ArchiveKind::Rar)),
        ];
        for (name, expected) in cases {
            assert_eq!(InputKind::classify(Path::new(name)).ok(), Some(expected), "{name}");
        }
    }

    #[test]
    fn test_classify_rejects_other_formats() {
        for name in ["notes.txt", "scan.tiff", "no_extension"] {
            let err = InputKind::classify(Path::new(name)).unwrap_err();
            assert_eq!(err.to_string(), format!("Unsupported file format: {name}"));
        }
    }

    #[test]
    fn test_unsupported_top_level_visits_nothing() {
        let ingestor = PageIngestor::default();
        let mut visited = 0;
        let result = ingestor.for_each_page(Path::new("answers.txt"), &mut |_, _| visited += 1);
        assert!(matches!(result, Err(OmrError::UnsupportedFormat { .. })));
        assert_eq!(visited, 0);
    }

    #[test]
    fn test_single_image() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sheet.png");
        std::fs::write(&path, png_bytes(10, 12))?;

        let pages = PageIngestor::default().pages(&path)?;
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].0, PageSource::file(&path));
        assert_eq!(pages[0].1.as_ref().map(|p| p.dimensions()).ok(), Some((10, 12)));
        Ok(())
    }

    #[test]
    fn test_archive_members_nested_and_unsupported() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;

        let inner_path = dir.path().join("inner.zip");
        let mut inner = zip::ZipWriter::new(File::create(&inner_path)?);
        inner.start_file("deep.png", SimpleFileOptions::default())?;
        inner.write_all(&png_bytes(4, 4))?;
        inner.finish()?;

        let outer_path = dir.path().join("outer.zip");
        let mut outer = zip::ZipWriter::new(File::create(&outer_path)?);
        outer.start_file("page.png", SimpleFileOptions::default())?;
        outer.write_all(&png_bytes(5, 5))?;
        outer.start_file("readme.txt", SimpleFileOptions::default())?;
        outer.write_all(b"ignored")?;
        outer.start_file("nested/inner.zip", SimpleFileOptions::default())?;
        outer.write_all(&std::fs::read(&inner_path)?)?;
        outer.finish()?;

        let pages = PageIngestor::default().pages(&outer_path)?;
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|(_, page)| page.is_ok()));

        let mut sources: Vec<PathBuf> = pages.into_iter().map(|(s, _)| s.path).collect();
        sources.sort();
        assert_eq!(
            sources,
            vec![
                outer_path.join("nested/inner.zip/deep.png"),
                outer_path.join("page.png"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_corrupt_archive_is_delivered_as_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.zip");
        std::fs::write(&path, b"garbage")?;

        let pages = PageIngestor::default().pages(&path)?;
        assert_eq!(pages.len(), 1);
        assert!(pages[0].1.is_err());
        Ok(())
    }

    #[test]
    fn test_rejects_bad_dpi() {
        let config = IngestConfig {
            dpi: 0.0,
            ..IngestConfig::default()
        };
        assert!(PageIngestor::new(config).is_err());
    }

    #[test]
    fn test_ingest_config_validation() {
        assert!(IngestConfig::get_defaults().validate().is_ok());
        let nan = IngestConfig {
            dpi: f32::NAN,
            ..IngestConfig::default()
        };
        assert!(nan.validate().is_err());
        let no_unar = IngestConfig {
            unar_program: PathBuf::new(),
            ..IngestConfig::default()
        };
        assert!(matches!(
            no_unar.validate(),
            Err(ConfigError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_page_source_display() {
        assert_eq!(PageSource::page("a.pdf", 2).to_string(), "a.pdf (page 2)");
        assert_eq!(PageSource::file("a.png").to_string(), "a.png");
    }
}
