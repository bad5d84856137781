//! The batch driver: run one transform over a validated batch.
//!
//! Files are processed strictly one at a time, in admission order. A file
//! that fails is recorded and skipped — the batch always runs to the end —
//! but a batch where *every* file fails is reported as a fatal error, since
//! the caller has nothing to retrieve.
//!
//! Artifacts and merge pages land in the caller's [`ArtifactRegistry`] as
//! they are produced, so a crash or cancellation partway through still
//! leaves the completed files retrievable.

use crate::config::ConversionConfig;
use crate::error::PixshiftError;
use crate::output::{BatchOutcome, BatchStats, FileResult};
use crate::pipeline::transform::FileTransform;
use crate::registry::ArtifactRegistry;
use crate::validate::ValidatedBatch;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert every file in `batch` with `transform`, appending outputs to
/// `registry`.
///
/// Returns `Ok` with per-file results as long as at least one file produced
/// an artifact; partial failure is data, not an error. Fails with
/// [`PixshiftError::EmptyBatch`] before any work when the batch has no
/// files, and with [`PixshiftError::NoArtifactsProduced`] after the run when
/// every file failed.
pub async fn run_batch(
    batch: &ValidatedBatch,
    transform: &dyn FileTransform,
    config: &ConversionConfig,
    registry: &mut ArtifactRegistry,
) -> Result<BatchOutcome, PixshiftError> {
    if batch.is_empty() {
        return Err(PixshiftError::EmptyBatch);
    }

    let total = batch.len();
    let progress = config.progress_callback.as_deref();
    info!(files = total, kind = %config.kind, "Starting batch conversion");
    if let Some(cb) = progress {
        cb.on_batch_start(total);
    }

    let batch_start = Instant::now();
    let mut results: Vec<FileResult> = Vec::with_capacity(total);
    let mut artifacts_produced = 0usize;
    let mut first_error: Option<String> = None;

    for (index, file) in batch.files().iter().enumerate() {
        debug!(index, name = %file.name, "Converting file");
        if let Some(cb) = progress {
            cb.on_file_start(index, total);
        }

        let file_start = Instant::now();
        let outcome = transform.transform(file).await;
        let duration_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                let count = output.artifacts.len();
                for artifact in output.artifacts {
                    registry.add(artifact);
                }
                if let Some(page) = output.merge_page {
                    registry.add_merge_page(page);
                }
                artifacts_produced += count;

                if let Some(cb) = progress {
                    cb.on_file_complete(index, total, count);
                }
                results.push(FileResult {
                    index,
                    source_name: file.name.clone(),
                    artifact_count: count,
                    duration_ms,
                    error: None,
                });
            }
            Err(e) => {
                warn!(index, name = %file.name, error = %e, "File conversion failed");
                if let Some(cb) = progress {
                    cb.on_file_error(index, total, &e.to_string());
                }
                if first_error.is_none() {
                    first_error = Some(e.to_string());
                }
                results.push(FileResult {
                    index,
                    source_name: file.name.clone(),
                    artifact_count: 0,
                    duration_ms,
                    error: Some(e),
                });
            }
        }
    }

    let converted = results.iter().filter(|r| r.error.is_none()).count();
    let failed = total - converted;

    if let Some(cb) = progress {
        cb.on_batch_complete(total, converted);
    }

    if artifacts_produced == 0 {
        return Err(PixshiftError::NoArtifactsProduced {
            attempted: total,
            first_error: first_error.unwrap_or_else(|| "unknown".into()),
        });
    }

    let stats = BatchStats {
        total_files: total,
        converted_files: converted,
        failed_files: failed,
        artifacts_produced,
        total_duration_ms: batch_start.elapsed().as_millis() as u64,
    };
    info!(
        converted,
        failed,
        artifacts = artifacts_produced,
        duration_ms = stats.total_duration_ms,
        "Batch conversion finished"
    );

    Ok(BatchOutcome { results, stats })
}
