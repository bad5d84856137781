//! Image → PDF conversion and combined-document composition.
//!
//! Each image becomes a single-page PDF whose page is sized exactly to the
//! image (one pixel = one PDF unit), with the image embedded as a JPEG
//! stream (`DCTDecode`) so the PDF carries the compressed bytes directly
//! instead of a re-encoded bitmap. JPEG-sourced conversions additionally
//! collect a [`MergePage`] so the registry can later build one combined
//! document from the whole batch.
//!
//! Composition uses `lopdf` directly: the documents built here are flat
//! (pages + image XObjects, no fonts, no outline), which keeps the writer
//! small and the output byte-stable for tests.

use crate::config::ConversionKind;
use crate::error::{FileError, PixshiftError};
use crate::output::{Artifact, MergePage, TransformOutput};
use crate::pipeline::image::{decode, encode_rgb_jpeg};
use crate::pipeline::transform::FileTransform;
use crate::validate::CandidateFile;
use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use tracing::debug;

/// Converts each image to a single-page PDF artifact; JPEG sources also
/// collect a page for the combined document.
pub struct ImageToPdfTransform {
    jpeg_quality: u8,
    collect_merge_pages: bool,
}

impl ImageToPdfTransform {
    pub fn new(kind: ConversionKind, jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality,
            collect_merge_pages: kind.supports_merge(),
        }
    }
}

#[async_trait]
impl FileTransform for ImageToPdfTransform {
    async fn transform(&self, file: &CandidateFile) -> Result<TransformOutput, FileError> {
        let img = decode(file)?;
        let (width, height) = (img.width(), img.height());

        // Flatten to RGB JPEG once; both the single-page PDF and the merge
        // page embed the same bytes.
        let jpeg = encode_rgb_jpeg(&img, self.jpeg_quality).map_err(|e| {
            FileError::EncodeFailed {
                name: file.name.clone(),
                detail: e.to_string(),
            }
        })?;

        let page = MergePage {
            jpeg: jpeg.into(),
            width,
            height,
        };

        let pdf = compose_pdf(std::slice::from_ref(&page)).map_err(|e| {
            FileError::EncodeFailed {
                name: file.name.clone(),
                detail: e.to_string(),
            }
        })?;

        let filename = format!("{}.pdf", file.stem());
        debug!(
            "Converted '{}' → '{}' ({} bytes, page {}x{})",
            file.name,
            filename,
            pdf.len(),
            width,
            height
        );

        let artifact = Artifact::new(filename, pdf, "application/pdf")
            .with_dimensions(width, height);

        Ok(TransformOutput {
            artifacts: vec![artifact],
            merge_page: self.collect_merge_pages.then_some(page),
        })
    }
}

/// Build a PDF with one page per [`MergePage`].
///
/// Page 1 takes the first page's dimensions; every subsequent page is sized
/// to its own dimensions, orientation decided per page from width vs height
/// — a wide image yields a landscape page, a tall or square one portrait.
/// There is no global orientation decision.
pub fn compose_pdf(pages: &[MergePage]) -> Result<Vec<u8>, PixshiftError> {
    if pages.is_empty() {
        return Err(PixshiftError::NothingToMerge);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for (i, page) in pages.iter().enumerate() {
        debug!(
            page = i + 1,
            width = page.width,
            height = page.height,
            orientation = ?page.dimensions().orientation(),
            "Composing page"
        );

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => page.width as i64,
                "Height" => page.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            page.jpeg.to_vec(),
        ));

        let image_name = format!("Im{i}");

        // Scale the unit image square up to the page, then paint it at the
        // origin: q <w> 0 0 <h> 0 0 cm /ImN Do Q
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        (page.width as i64).into(),
                        0.into(),
                        0.into(),
                        (page.height as i64).into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(image_name.clone().into_bytes())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| PixshiftError::PdfComposeFailed(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let mut xobjects = Dictionary::new();
        xobjects.set(image_name.into_bytes(), Object::Reference(image_id));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                (page.width as i64).into(),
                (page.height as i64).into(),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! { "XObject" => xobjects },
        });
        kids.push(page_id.into());
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
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| PixshiftError::PdfComposeFailed(e.to_string()))?;
    Ok(buf)
}
