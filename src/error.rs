//! Error types for the pixshift library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PixshiftError`] — **Fatal**: the batch operation cannot proceed or
//!   produced nothing usable (empty batch, every file failed, an operation
//!   invoked out of order). Returned as `Err(PixshiftError)` from the
//!   top-level entry points.
//!
//! * [`FileError`] — **Non-fatal**: a single file's conversion failed
//!   (corrupt image data, encode glitch, no text recognised) but the rest
//!   of the batch is fine. Stored inside [`crate::output::FileResult`] so
//!   callers can inspect partial success rather than losing the whole
//!   batch to one bad file.
//!
//! Validation rejections are not errors at all: [`crate::validate`] reports
//! them as structured data so callers can render per-file feedback.

use crate::session::Step;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pixshift library.
///
/// Per-file failures use [`FileError`] and are stored in
/// [`crate::output::FileResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum PixshiftError {
    // ── Batch outcomes ────────────────────────────────────────────────────
    /// The validated batch contained zero files. Distinct from a batch that
    /// was attempted and produced nothing — see [`Self::NoArtifactsProduced`].
    #[error("No files to convert: the validated batch is empty")]
    EmptyBatch,

    /// Every file in the batch was attempted and none produced an artifact.
    #[error("No files could be converted ({attempted} attempted).\nFirst error: {first_error}")]
    NoArtifactsProduced {
        attempted: usize,
        first_error: String,
    },

    // ── Precondition failures ─────────────────────────────────────────────
    /// A session operation was invoked while the wizard was on the wrong step.
    #[error("Operation requires step {expected:?} but session is at {actual:?}")]
    StepOutOfOrder { expected: Step, actual: Step },

    /// Retrieval was requested before any conversion produced artifacts.
    #[error("No artifacts available: run a conversion first")]
    NoArtifacts,

    /// Merge was requested but no pages were collected for merging.
    #[error("Nothing to merge: no pages were collected")]
    NothingToMerge,

    /// Merge was requested for a conversion pair that does not support it.
    #[error("Merge is only available for JPEG → PDF conversions, not {kind}")]
    MergeUnsupported { kind: String },

    /// No artifact with the given filename exists in the registry.
    #[error("No artifact named '{filename}'")]
    ArtifactNotFound { filename: String },

    // ── Document composition ──────────────────────────────────────────────
    /// The PDF writer failed while composing a document.
    #[error("PDF composition failed: {0}")]
    PdfComposeFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single file in a batch.
///
/// Stored alongside [`crate::output::FileResult`] when a file fails.
/// The overall batch continues unless ALL files fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The file's bytes could not be decoded as the expected media format.
    #[error("'{name}': decode failed: {detail}")]
    DecodeFailed { name: String, detail: String },

    /// Re-encoding to the target format failed.
    #[error("'{name}': encode failed: {detail}")]
    EncodeFailed { name: String, detail: String },

    /// A frame could not be captured from the frame source.
    #[error("frame capture failed at {timestamp:.2}s: {detail}")]
    FrameCaptureFailed { timestamp: f64, detail: String },

    /// The frame source yielded no frames inside the capture window.
    #[error("'{name}': no frames captured inside the clip window")]
    NoFramesCaptured { name: String },

    /// The OCR engine reported an error.
    #[error("'{name}': text recognition failed: {detail}")]
    RecognitionFailed { name: String, detail: String },

    /// Recognition succeeded but found no text in the image.
    #[error("'{name}': no text found in the image")]
    EmptyText { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_artifacts_display() {
        let e = PixshiftError::NoArtifactsProduced {
            attempted: 3,
            first_error: "'a.jpg': decode failed: bad header".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("3 attempted"), "got: {msg}");
        assert!(msg.contains("a.jpg"));
    }

    #[test]
    fn step_out_of_order_display() {
        let e = PixshiftError::StepOutOfOrder {
            expected: Step::Review,
            actual: Step::Selection,
        };
        assert!(e.to_string().contains("Review"));
        assert!(e.to_string().contains("Selection"));
    }

    #[test]
    fn merge_unsupported_display() {
        let e = PixshiftError::MergeUnsupported {
            kind: "png → webp".into(),
        };
        assert!(e.to_string().contains("png → webp"));
    }

    #[test]
    fn file_error_display() {
        let e = FileError::DecodeFailed {
            name: "photo.jpg".into(),
            detail: "unexpected EOF".into(),
        };
        assert!(e.to_string().contains("photo.jpg"));
        assert!(e.to_string().contains("unexpected EOF"));
    }

    #[test]
    fn frame_capture_display() {
        let e = FileError::FrameCaptureFailed {
            timestamp: 1.5,
            detail: "seek out of range".into(),
        };
        assert!(e.to_string().contains("1.50s"));
    }
}
