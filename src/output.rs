//! Output types: produced artifacts, per-file results, and batch statistics.

use crate::error::FileError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Pixel dimensions of a produced image or document page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelDimensions {
    pub width: u32,
    pub height: u32,
}

impl PixelDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Page orientation derived from these dimensions.
    ///
    /// Landscape only when strictly wider than tall; a square page defaults
    /// to portrait. Decided per page, never once for a whole document.
    pub fn orientation(&self) -> PageOrientation {
        if self.width > self.height {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        }
    }
}

/// Orientation of one document page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageOrientation {
    Portrait,
    Landscape,
}

/// One produced output of a conversion: a filename, a retrievable byte
/// handle, and optional dimensions for document composition.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Suggested output filename, e.g. `photo.pdf` or `scan_extracted.txt`.
    pub filename: String,
    /// Produced bytes. Cheap to clone; released when the owning registry
    /// is cleared.
    pub data: Bytes,
    /// MIME type of `data`, used for the data-URI handle.
    pub mime_type: &'static str,
    /// Pixel dimensions, when the artifact is an image or an image-derived
    /// page.
    pub dimensions: Option<PixelDimensions>,
}

impl Artifact {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>, mime_type: &'static str) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
            mime_type,
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some(PixelDimensions::new(width, height));
        self
    }

    /// Size of the artifact in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Render the artifact as a `data:` URI for hosts that embed outputs
    /// directly (the browser-style retrieval handle).
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

/// One page collected for the combined-document merge.
///
/// Holds the page image as RGB JPEG (the embedding format of the combined
/// PDF) plus its dimensions; kept separately from the per-file artifacts
/// because the merge consumes page images, not the single-page PDFs.
#[derive(Debug, Clone)]
pub struct MergePage {
    pub jpeg: Bytes,
    pub width: u32,
    pub height: u32,
}

impl MergePage {
    pub fn dimensions(&self) -> PixelDimensions {
        PixelDimensions::new(self.width, self.height)
    }
}

/// Everything one file's transform produced.
#[derive(Debug, Default)]
pub struct TransformOutput {
    /// Zero or more artifacts, in production order.
    pub artifacts: Vec<Artifact>,
    /// A page for the combined document, when the conversion collects one.
    pub merge_page: Option<MergePage>,
}

impl TransformOutput {
    /// A single artifact, no merge page.
    pub fn single(artifact: Artifact) -> Self {
        Self {
            artifacts: vec![artifact],
            merge_page: None,
        }
    }
}

/// Outcome of one file in a batch, success or failure.
#[derive(Debug)]
pub struct FileResult {
    /// 0-based position of the source file in the validated batch.
    pub index: usize,
    /// Source filename.
    pub source_name: String,
    /// Number of artifacts this file produced (0 on failure).
    pub artifact_count: usize,
    /// Wall-clock duration of the transform in milliseconds.
    pub duration_ms: u64,
    /// The recorded failure, when the transform failed. The batch continued
    /// regardless.
    pub error: Option<FileError>,
}

/// Statistics for a completed batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStats {
    /// Files in the validated batch.
    pub total_files: usize,
    /// Files whose transform succeeded.
    pub converted_files: usize,
    /// Files whose transform failed (isolated, batch continued).
    pub failed_files: usize,
    /// Artifacts appended to the registry by this run.
    pub artifacts_produced: usize,
    /// Total wall-clock duration in milliseconds.
    pub total_duration_ms: u64,
}

/// Result of a completed batch: per-file results plus aggregate stats.
///
/// Returned `Ok` even when some files failed — check
/// [`BatchStats::failed_files`]. A batch where *nothing* succeeded is a
/// fatal [`crate::error::PixshiftError::NoArtifactsProduced`] instead.
#[derive(Debug)]
pub struct BatchOutcome {
    pub results: Vec<FileResult>,
    pub stats: BatchStats,
}

impl BatchOutcome {
    /// Failures recorded during the run, in batch order.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &FileError)> {
        self.results
            .iter()
            .filter_map(|r| r.error.as_ref().map(|e| (r.source_name.as_str(), e)))
    }
}
