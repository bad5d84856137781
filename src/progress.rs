//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline processes each file.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a WebSocket, a DOM progress bar, or a
//! terminal spinner — without the library knowing anything about how the
//! host application renders progress. The trait is `Send + Sync` so callers
//! may share one callback across tasks; the pipeline itself only ever fires
//! events from its single sequential flow.

use std::sync::Arc;

/// Called by the batch pipeline as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Files are processed strictly one at a time, so for
/// a given batch the events arrive in order: `on_batch_start`, then for each
/// file `on_file_start` followed by `on_file_complete` or `on_file_error`,
/// then `on_batch_complete`.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any file is processed.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file's transform begins.
    ///
    /// `index` is 0-based into the validated batch.
    fn on_file_start(&self, index: usize, total_files: usize) {
        let _ = (index, total_files);
    }

    /// Called when a file converts successfully.
    fn on_file_complete(&self, index: usize, total_files: usize, artifact_count: usize) {
        let _ = (index, total_files, artifact_count);
    }

    /// Called when a file's transform fails. The batch continues.
    fn on_file_error(&self, index: usize, total_files: usize, error: &str) {
        let _ = (index, total_files, error);
    }

    /// Fractional progress (0.0–1.0) inside a single long-running encode,
    /// fired per captured frame during GIF rendering.
    fn on_encode_progress(&self, fraction: f64) {
        let _ = fraction;
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
