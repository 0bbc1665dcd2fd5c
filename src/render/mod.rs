//! Painting answer sheets and writing them out as image and document.
//!
//! A sheet is painted from the shared [`SheetLayout`], so everything the
//! extractor later reads sits exactly where it was drawn. Each sheet is saved
//! as `omr_sheet_<exam_id>[_<cin>].png` plus a one-page PDF of the same stem.
//! In roster mode every student gets a sheet pair and all pages are also
//! merged into `student_sheets_merged.pdf`.

pub mod canvas;
pub mod definition;
pub mod document;
pub mod exam_id;

use ab_glyph::FontVec;
use image::RgbImage;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::{OmrError, OmrResult};
use crate::domain::{FieldName, SheetLayout, option_index, question_label};
use canvas::{PAPER, draw_centered_text, draw_disc, draw_ring, draw_thick_rect};
use document::{PdfPage, write_pdf};

pub use definition::{ExamDefinition, QuestionDescriptor, StudentIdentity};
pub use exam_id::{generate_exam_id, new_exam_id};

const TITLE_FONT_SIZE: f32 = 60.0;
const INFO_FONT_SIZE: f32 = 40.0;
const OPTION_FONT_SIZE: f32 = 30.0;

const BUBBLE_THICKNESS: i32 = 2;
const BOX_THICKNESS: i32 = 2;
const BORDER_THICKNESS: i32 = 3;
const BORDER_INSET: i32 = 50;

const SHEET_HEADING: &str = "ANSWER SHEET";
const MERGED_FILE_NAME: &str = "student_sheets_merged.pdf";

/// Where rendered sheets go and how they are addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub output_dir: PathBuf,
    /// Prefix of the public URL returned for each document.
    pub url_prefix: String,
    /// Font for all sheet text. System fonts are tried when unset.
    pub font_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("public/generated-sheets"),
            url_prefix: "/generated-sheets".to_string(),
            font_path: None,
        }
    }
}

/// What goes on one sheet.
#[derive(Debug, Clone, Copy)]
pub struct SheetContent<'a> {
    pub title: &'a str,
    pub exam_id: &'a str,
    pub student: Option<&'a StudentIdentity>,
    pub question_count: usize,
    /// Bubbles to print filled, question index to letter.
    pub marks: &'a BTreeMap<usize, char>,
}

/// Files written for one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedSheet {
    pub cin: Option<String>,
    pub image_path: Option<PathBuf>,
    pub pdf_path: Option<PathBuf>,
    pub url: Option<String>,
    /// Set when the image or document could not be written.
    pub error: Option<String>,
}

/// The result of rendering an exam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    pub exam_id: String,
    pub sheets: Vec<RenderedSheet>,
    /// Roster mode only: the merged document of every sheet.
    pub merged: Option<RenderedSheet>,
}

impl RenderOutcome {
    /// The JSON response for this outcome.
    pub fn response(&self) -> RenderResponse {
        match &self.merged {
            None => {
                let sheet = self.sheets.first().cloned().unwrap_or_default();
                RenderResponse {
                    exam_id: self.exam_id.clone(),
                    omr_sheet_url: sheet.url,
                    sheets: None,
                    error: sheet.error,
                }
            }
            Some(merged) => RenderResponse {
                exam_id: self.exam_id.clone(),
                omr_sheet_url: merged.url.clone(),
                sheets: Some(
                    self.sheets
                        .iter()
                        .map(|sheet| SheetEntry {
                            cin: sheet.cin.clone().unwrap_or_default(),
                            omr_sheet_url: sheet.url.clone(),
                            error: sheet.error.clone(),
                        })
                        .collect(),
                ),
                error: merged.error.clone(),
            },
        }
    }
}

/// `{exam_id, omrSheetUrl, sheets?, error?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderResponse {
    pub exam_id: String,
    #[serde(rename = "omrSheetUrl", skip_serializing_if = "Option::is_none")]
    pub omr_sheet_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheets: Option<Vec<SheetEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetEntry {
    pub cin: String,
    #[serde(rename = "omrSheetUrl", skip_serializing_if = "Option::is_none")]
    pub omr_sheet_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Paints sheets from a layout and writes them to disk.
pub struct SheetRenderer {
    layout: Arc<SheetLayout>,
    font: Option<FontVec>,
    config: RenderConfig,
}

impl SheetRenderer {
    /// Creates a renderer, resolving the font from the configuration.
    pub fn new(layout: Arc<SheetLayout>, config: RenderConfig) -> Self {
        let font = canvas::resolve_font(config.font_path.as_deref());
        Self {
            layout,
            font,
            config,
        }
    }

    /// Creates a renderer that draws geometry only.
    pub fn without_text(layout: Arc<SheetLayout>, config: RenderConfig) -> Self {
        Self {
            layout,
            font: None,
            config,
        }
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    /// Paints one sheet.
    ///
    /// # Errors
    ///
    /// `OmrError::InvalidInput` if there are more questions than the layout
    /// holds, or a mark names a question or option that is not on the sheet.
    pub fn paint(&self, content: &SheetContent<'_>) -> OmrResult<RgbImage> {
        self.check_content(content)?;

        let params = self.layout.params();
        let (width, height) = (params.page_width, params.page_height);
        let (page_width, page_height) = self.layout.page_size();
        let mut img = RgbImage::from_pixel(page_width, page_height, PAPER);

        self.text(&mut img, content.title, (width / 2, 100), TITLE_FONT_SIZE);
        self.text(
            &mut img,
            content.exam_id,
            (width - params.left_margin, 50),
            INFO_FONT_SIZE,
        );
        self.text(&mut img, SHEET_HEADING, (width / 2, 200), TITLE_FONT_SIZE);

        for field in FieldName::STUDENT {
            let region = self.layout.region(field);
            draw_thick_rect(
                &mut img,
                (region.x1, region.y1, region.x2, region.y2),
                BOX_THICKNESS,
            );
            let center_x = region.center_x();
            self.text(&mut img, field.key(), (center_x, region.y1 - 40), INFO_FONT_SIZE);
            if let Some(student) = content.student {
                let top = region.y1 - 10 + region.height() / 2;
                self.text(&mut img, student.value(field), (center_x, top), INFO_FONT_SIZE);
            }
        }

        for anchor in &self.layout.question_anchors()[..content.question_count] {
            let question = anchor.question_index;
            let label = question_label(question);
            self.text(&mut img, &label, (anchor.x, anchor.y), OPTION_FONT_SIZE);

            let marked = content.marks.get(&question).copied().and_then(option_index);
            for bubble in self.layout.bubbles_for(question) {
                let center = (bubble.center_x, bubble.center_y);
                if marked == Some(bubble.option_index) {
                    draw_disc(&mut img, center, bubble.radius);
                } else {
                    draw_ring(&mut img, center, bubble.radius, BUBBLE_THICKNESS);
                }
                let letter = bubble.option_letter().to_string();
                let letter_anchor = (bubble.center_x + 4, bubble.center_y + 22);
                self.text(&mut img, &letter, letter_anchor, OPTION_FONT_SIZE);
            }
        }

        draw_thick_rect(
            &mut img,
            (
                BORDER_INSET,
                BORDER_INSET,
                width - BORDER_INSET,
                height - BORDER_INSET,
            ),
            BORDER_THICKNESS,
        );
        Ok(img)
    }

    /// Renders every sheet of an exam and writes the files.
    ///
    /// Invalid content is an error. Failing to write a file is not: the
    /// affected sheet carries the error in the outcome, and its document is
    /// skipped when its image could not be written.
    pub fn render(&self, exam: &ExamDefinition) -> OmrResult<RenderOutcome> {
        let title = exam.display_title();
        let exam_id = match exam.exam_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => new_exam_id(title),
        };
        info!("Rendering {} ({} questions)", exam_id, exam.question_count());

        if let Err(e) = std::fs::create_dir_all(&self.config.output_dir) {
            warn!(
                "Could not create {}: {}",
                self.config.output_dir.display(),
                e
            );
        }

        let content = |student| SheetContent {
            title,
            exam_id: &exam_id,
            student,
            question_count: exam.question_count(),
            marks: &exam.marks,
        };

        let roster = exam.students.as_deref().filter(|students| !students.is_empty());
        let Some(students) = roster else {
            let student = exam.student.as_ref();
            let raster = self.paint(&content(student))?;
            let stem = sheet_stem(&exam_id, student.map(|s| s.cin.as_str()));
            let (mut sheet, _) = self.write_sheet(&stem, &raster);
            sheet.cin = student.map(|s| s.cin.clone());
            return Ok(RenderOutcome {
                exam_id,
                sheets: vec![sheet],
                merged: None,
            });
        };

        let mut sheets = Vec::with_capacity(students.len());
        let mut pages = Vec::with_capacity(students.len());
        for student in students {
            let raster = self.paint(&content(Some(student)))?;
            let stem = sheet_stem(&exam_id, Some(&student.cin));
            let (mut sheet, page) = self.write_sheet(&stem, &raster);
            sheet.cin = Some(student.cin.clone());
            sheets.push(sheet);
            pages.extend(page);
        }
        let merged = self.write_document(MERGED_FILE_NAME, &pages);

        Ok(RenderOutcome {
            exam_id,
            sheets,
            merged: Some(merged),
        })
    }

    fn check_content(&self, content: &SheetContent<'_>) -> OmrResult<()> {
        let capacity = self.layout.question_count();
        if content.question_count > capacity {
            return Err(OmrError::invalid_input(format!(
                "exam has {} questions but the sheet holds {capacity}",
                content.question_count
            )));
        }
        for (&question, &letter) in content.marks {
            if question >= content.question_count {
                return Err(OmrError::invalid_input(format!(
                    "mark for {} but the exam has {} questions",
                    question_label(question),
                    content.question_count
                )));
            }
            if !option_index(letter).is_some_and(|option| option < self.layout.option_count()) {
                return Err(OmrError::invalid_input(format!(
                    "mark {letter:?} for {} is not an option on the sheet",
                    question_label(question)
                )));
            }
        }
        Ok(())
    }

    fn text(&self, img: &mut RgbImage, text: &str, anchor: (i32, i32), size: f32) {
        if let Some(font) = &self.font {
            draw_centered_text(img, font, text, anchor, size);
        }
    }

    /// Writes the image and its one-page document. The document page is
    /// returned for merging when the image was written.
    fn write_sheet(&self, stem: &str, raster: &RgbImage) -> (RenderedSheet, Option<PdfPage>) {
        let image_path = self.config.output_dir.join(format!("{stem}.png"));
        if let Err(e) = raster.save(&image_path) {
            let err = OmrError::render(&image_path.display().to_string(), e);
            warn!("Skipping document for {stem}: {}", err.to_report_string());
            return (
                RenderedSheet {
                    error: Some(err.to_report_string()),
                    ..RenderedSheet::default()
                },
                None,
            );
        }
        info!("Image saved: {}", image_path.display());

        let page = match PdfPage::from_raster(raster) {
            Ok(page) => page,
            Err(e) => {
                return (
                    RenderedSheet {
                        image_path: Some(image_path),
                        error: Some(e.to_report_string()),
                        ..RenderedSheet::default()
                    },
                    None,
                );
            }
        };
        let mut sheet = self.write_document(&format!("{stem}.pdf"), std::slice::from_ref(&page));
        sheet.image_path = Some(image_path);
        (sheet, Some(page))
    }

    fn write_document(&self, file_name: &str, pages: &[PdfPage]) -> RenderedSheet {
        let pdf_path = self.config.output_dir.join(file_name);
        match write_pdf(pages, &pdf_path) {
            Ok(()) => {
                info!("PDF saved: {}", pdf_path.display());
                RenderedSheet {
                    url: Some(public_url(&self.config.url_prefix, file_name)),
                    pdf_path: Some(pdf_path),
                    ..RenderedSheet::default()
                }
            }
            Err(e) => {
                warn!("Could not write {}: {}", pdf_path.display(), e.to_report_string());
                RenderedSheet {
                    error: Some(e.to_report_string()),
                    ..RenderedSheet::default()
                }
            }
        }
    }
}

/// `omr_sheet_<exam_id>[_<cin>]`, with characters unsafe in file names replaced.
pub fn sheet_stem(exam_id: &str, cin: Option<&str>) -> String {
    let stem = match cin {
        Some(cin) => format!("omr_sheet_{exam_id}_{cin}"),
        None => format!("omr_sheet_{exam_id}"),
    };
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn public_url(prefix: &str, file_name: &str) -> String {
    format!("{}/{file_name}", prefix.trim_end_matches('/'))
}
