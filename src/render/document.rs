//! Paginated output: one A4 page per sheet raster.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::io::Write;
use std::path::Path;

use crate::core::{A4_SIZE_MM, OmrError, OmrResult};

const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// A raster ready to be embedded as a page image.
///
/// Pixels are held zlib-compressed, so a roster of sheets can be kept for the
/// merged document without holding every raw raster in memory.
#[derive(Debug, Clone)]
pub struct PdfPage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PdfPage {
    pub fn from_raster(img: &RgbImage) -> OmrResult<Self> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(img.as_raw())?;
        Ok(Self {
            width: img.width(),
            height: img.height(),
            data: encoder.finish()?,
        })
    }
}

/// Writes a document with one 210 x 297 mm page per raster, each image
/// stretched over its whole page.
pub fn write_pdf(pages: &[PdfPage], path: &Path) -> OmrResult<()> {
    if pages.is_empty() {
        return Err(OmrError::invalid_input("a document needs at least one page"));
    }

    let (page_width, page_height) = (
        A4_SIZE_MM.0 * POINTS_PER_MM,
        A4_SIZE_MM.1 * POINTS_PER_MM,
    );

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(pages.len());

    for page in pages {
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(page.width),
                "Height" => i64::from(page.height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "FlateDecode",
            },
            page.data.clone(),
        )
        .with_compression(false);
        let image_id = doc.add_object(image);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(page_width),
                        Object::Real(0.0),
                        Object::Real(0.0),
                        Object::Real(page_height),
                        Object::Real(0.0),
                        Object::Real(0.0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| OmrError::render("encoding page content", e))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let resources_id = doc.add_object(dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(page_width),
                Object::Real(page_height),
            ],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| OmrError::render("serialising document", e))?;
    std::fs::write(path, bytes)?;
    Ok(())
}
