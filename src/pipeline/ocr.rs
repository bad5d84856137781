//! Text extraction: preprocess an image, hand it to an OCR engine, clean up
//! the result.
//!
//! Recognition itself is an external collaborator behind [`OcrEngine`] — a
//! tesseract binding, a hosted API, whatever the embedder has. This module
//! owns what surrounds it: the contrast/threshold preprocessing that makes
//! scanned text legible to most engines, and the deterministic cleanup of
//! the recognised text ([`crate::pipeline::textclean`]).

use crate::error::FileError;
use crate::output::{Artifact, TransformOutput};
use crate::pipeline::image::decode;
use crate::pipeline::textclean::clean_text;
use crate::pipeline::transform::FileTransform;
use crate::validate::CandidateFile;
use async_trait::async_trait;
use image::{DynamicImage, GrayImage};
use std::sync::Arc;
use tracing::debug;

/// Recognises text in a preprocessed grayscale image.
///
/// The image handed in is already binarized; engines should not apply their
/// own thresholding on top.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(
        &self,
        image: &GrayImage,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// Converts each image file into one plain-text artifact.
pub struct OcrTransform {
    engine: Arc<dyn OcrEngine>,
    clean: bool,
}

impl OcrTransform {
    pub fn new(engine: Arc<dyn OcrEngine>, clean: bool) -> Self {
        Self { engine, clean }
    }
}

#[async_trait]
impl FileTransform for OcrTransform {
    async fn transform(&self, file: &CandidateFile) -> Result<TransformOutput, FileError> {
        let img = decode(file)?;
        let prepared = preprocess(&img);

        let raw = self
            .engine
            .recognize(&prepared)
            .await
            .map_err(|e| FileError::RecognitionFailed {
                name: file.name.clone(),
                detail: e.to_string(),
            })?;

        let text = if self.clean { clean_text(&raw) } else { raw.trim().to_string() };
        if text.is_empty() {
            return Err(FileError::EmptyText {
                name: file.name.clone(),
            });
        }

        let filename = format!("{}_extracted.txt", file.stem());
        debug!(
            "Recognised {} characters from '{}' → '{}'",
            text.len(),
            file.name,
            filename
        );

        let artifact = Artifact::new(filename, text.into_bytes(), "text/plain");
        Ok(TransformOutput::single(artifact))
    }
}

/// Contrast factor applied after grayscale conversion.
const CONTRAST_FACTOR: f32 = 1.5;
/// Luminance cutoff for binarization.
const BINARIZE_THRESHOLD: u8 = 128;

/// Prepare an image for recognition: grayscale, contrast stretch around the
/// midpoint, then hard binarization.
///
/// The stretch maps each luminance v to `v * 1.5 - 64` (the intercept keeps
/// mid-gray fixed), clamped to the byte range; anything at or above 128 then
/// becomes white, the rest black.
pub fn preprocess(img: &DynamicImage) -> GrayImage {
    let mut gray = img.to_luma8();
    let intercept = BINARIZE_THRESHOLD as f32 * (1.0 - CONTRAST_FACTOR);

    for pixel in gray.pixels_mut() {
        let stretched = (pixel[0] as f32 * CONTRAST_FACTOR + intercept).clamp(0.0, 255.0) as u8;
        pixel[0] = if stretched >= BINARIZE_THRESHOLD { 255 } else { 0 };
    }
    gray
}
