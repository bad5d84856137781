//! Raster format conversion: decode a source image, re-encode to the target.
//!
//! The decode step sniffs the actual container format from the bytes rather
//! than trusting the extension — the validator only checked the *name*, and
//! a mislabelled file should fail here as a per-file error, not poison the
//! output with a wrongly-tagged artifact.

use crate::config::TargetFormat;
use crate::error::FileError;
use crate::output::{Artifact, TransformOutput};
use crate::pipeline::transform::FileTransform;
use crate::validate::CandidateFile;
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Converts each image file to a single image artifact in the target format.
pub struct ImageConvertTransform {
    target: TargetFormat,
    jpeg_quality: u8,
}

impl ImageConvertTransform {
    /// `target` must be one of the raster formats (JPEG, PNG, WebP).
    pub fn new(target: TargetFormat, jpeg_quality: u8) -> Self {
        debug_assert!(matches!(
            target,
            TargetFormat::Jpeg | TargetFormat::Png | TargetFormat::Webp
        ));
        Self {
            target,
            jpeg_quality,
        }
    }
}

#[async_trait]
impl FileTransform for ImageConvertTransform {
    async fn transform(&self, file: &CandidateFile) -> Result<TransformOutput, FileError> {
        let img = decode(file)?;
        let (width, height) = (img.width(), img.height());

        let encoded = encode(&img, self.target, self.jpeg_quality).map_err(|e| {
            FileError::EncodeFailed {
                name: file.name.clone(),
                detail: e.to_string(),
            }
        })?;

        let filename = format!("{}.{}", file.stem(), self.target.extension());
        debug!(
            "Converted '{}' → '{}' ({} bytes, {}x{})",
            file.name,
            filename,
            encoded.len(),
            width,
            height
        );

        let artifact = Artifact::new(filename, encoded, mime_type(self.target))
            .with_dimensions(width, height);
        Ok(TransformOutput::single(artifact))
    }
}

/// Decode a candidate's bytes, sniffing the real format.
pub(crate) fn decode(file: &CandidateFile) -> Result<DynamicImage, FileError> {
    image::load_from_memory(&file.data).map_err(|e| FileError::DecodeFailed {
        name: file.name.clone(),
        detail: e.to_string(),
    })
}

/// Encode to the target raster format.
///
/// JPEG has no alpha channel, so the image is flattened to RGB first; PNG
/// and WebP keep whatever channels the decode produced.
fn encode(
    img: &DynamicImage,
    target: TargetFormat,
    jpeg_quality: u8,
) -> image::ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    match target {
        TargetFormat::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality);
            encoder.encode_image(&img.to_rgb8())?;
        }
        TargetFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        }
        TargetFormat::Webp => {
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::WebP)?;
        }
        // Guarded by the constructor.
        _ => unreachable!("not a raster target"),
    }
    Ok(buf)
}

/// Encode to RGB JPEG regardless of source channels. Shared with the PDF
/// pipeline, which embeds pages as JPEG streams.
pub(crate) fn encode_rgb_jpeg(img: &DynamicImage, quality: u8) -> image::ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode_image(&img.to_rgb8())?;
    Ok(buf)
}

fn mime_type(target: TargetFormat) -> &'static str {
    match target {
        TargetFormat::Jpeg => "image/jpeg",
        TargetFormat::Png => "image/png",
        TargetFormat::Webp => "image/webp",
        TargetFormat::Pdf => "application/pdf",
        TargetFormat::Gif => "image/gif",
        TargetFormat::Text => "text/plain",
    }
}
