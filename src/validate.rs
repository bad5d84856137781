//! File selection validation: filter a raw selection against batch limits.
//!
//! Validation never fails: every excluded file is reported as a structured
//! [`Rejection`] so the caller can render per-file feedback while still
//! processing whatever was admitted. Admission order is selection order and
//! becomes the processing order of the batch.
//!
//! ## Check precedence
//!
//! For each candidate, in this exact order: extension → per-file size →
//! aggregate size → count. The ordering matters in boundary cases: it
//! decides *which* files are admitted, not just how many. A batch whose
//! running total crosses the aggregate limit at file 6 keeps files 1–5 and
//! stops — file 7 is not reconsidered even if it alone would fit. Stopping
//! on aggregate overflow (rather than skipping just the offending file)
//! mirrors the shipped behaviour this crate reproduces.

use crate::config::SelectionLimits;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A user-selected file before validation.
///
/// The byte handle is cheap to clone ([`Bytes`]); the pipeline never copies
/// file contents when passing candidates between stages.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    /// Original filename, used for extension checks and output naming.
    pub name: String,
    /// Raw file contents.
    pub data: Bytes,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// File size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Lowercased extension, if the name has one.
    pub fn extension(&self) -> Option<String> {
        self.name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
    }

    /// Filename without its extension, for output naming.
    pub fn stem(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.name)
    }
}

/// Why a candidate file was excluded from the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionCause {
    /// Extension not in the accepted set for this conversion.
    WrongExtension,
    /// Single file exceeds the per-file size limit.
    TooLarge,
    /// Admitting this file would push the batch past the aggregate limit.
    /// Admission stops here.
    BatchTooLarge,
    /// The batch already holds the maximum number of files.
    BatchFull,
}

/// One excluded file, with the cause, for user-facing feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub filename: String,
    pub cause: RejectionCause,
}

/// The ordered subset of a selection that passed validation.
///
/// Invariants (checked in tests, guaranteed by [`validate`]): every member's
/// extension is accepted, every member fits the per-file limit, the total
/// fits the aggregate limit (inclusive), and the length fits the count limit.
#[derive(Debug, Clone, Default)]
pub struct ValidatedBatch {
    files: Vec<CandidateFile>,
}

impl ValidatedBatch {
    /// Files in admission (= processing) order.
    pub fn files(&self) -> &[CandidateFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum of member sizes in bytes.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size()).sum()
    }

    /// Drop all members. Used by session reset.
    pub fn clear(&mut self) {
        self.files.clear();
    }
}

/// Filter `candidates` against `limits` for the given accepted extensions.
///
/// Returns the admitted batch and one [`Rejection`] per excluded file.
/// Files that were never examined because admission stopped early (aggregate
/// overflow or a full batch) are still reported, as `BatchTooLarge` /
/// `BatchFull` respectively, so the caller can tell the user about every
/// file it ignored.
pub fn validate(
    candidates: Vec<CandidateFile>,
    limits: &SelectionLimits,
    accepted_extensions: &[&str],
) -> (ValidatedBatch, Vec<Rejection>) {
    let mut admitted: Vec<CandidateFile> = Vec::new();
    let mut rejections: Vec<Rejection> = Vec::new();
    let mut total_size: u64 = 0;
    // Set when admission stops: every remaining candidate gets this cause.
    let mut stop_cause: Option<RejectionCause> = None;

    let mut iter = candidates.into_iter();
    for file in iter.by_ref() {
        match file.extension() {
            Some(ext) if accepted_extensions.contains(&ext.as_str()) => {}
            _ => {
                debug!("Rejected '{}': extension not accepted", file.name);
                rejections.push(Rejection {
                    filename: file.name,
                    cause: RejectionCause::WrongExtension,
                });
                continue;
            }
        }

        if file.size() > limits.max_file_size {
            debug!("Rejected '{}': {} bytes over per-file limit", file.name, file.size());
            rejections.push(Rejection {
                filename: file.name,
                cause: RejectionCause::TooLarge,
            });
            continue;
        }

        // Inclusive boundary: a total of exactly max_total_size is admitted.
        if total_size + file.size() > limits.max_total_size {
            debug!(
                "Rejected '{}': batch total would reach {} bytes; stopping admission",
                file.name,
                total_size + file.size()
            );
            rejections.push(Rejection {
                filename: file.name,
                cause: RejectionCause::BatchTooLarge,
            });
            stop_cause = Some(RejectionCause::BatchTooLarge);
            break;
        }

        total_size += file.size();
        admitted.push(file);

        if admitted.len() >= limits.max_files {
            stop_cause = Some(RejectionCause::BatchFull);
            break;
        }
    }

    // Everything after the stop point was ignored; report it.
    if let Some(cause) = stop_cause {
        for file in iter {
            rejections.push(Rejection {
                filename: file.name,
                cause,
            });
        }
    }

    debug!(
        admitted = admitted.len(),
        rejected = rejections.len(),
        total_bytes = total_size,
        "Validated file selection"
    );

    (ValidatedBatch { files: admitted }, rejections)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    fn file(name: &str, size: u64) -> CandidateFile {
        CandidateFile::new(name, vec![0u8; size as usize])
    }

    fn limits(max_files: usize, max_file: u64, max_total: u64) -> SelectionLimits {
        SelectionLimits {
            max_files,
            max_file_size: max_file,
            max_total_size: max_total,
        }
    }

    #[test]
    fn admits_valid_files_in_order() {
        let (batch, rejected) = validate(
            vec![file("a.jpg", 10), file("b.jpeg", 20), file("c.JPG", 30)],
            &limits(10, MB, 60 * MB),
            &["jpg", "jpeg"],
        );
        assert_eq!(rejected, vec![]);
        let names: Vec<_> = batch.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpeg", "c.JPG"]);
        assert_eq!(batch.total_size(), 60);
    }

    #[test]
    fn rejects_wrong_extension_and_continues() {
        let (batch, rejected) = validate(
            vec![file("a.png", 10), file("b.jpg", 10)],
            &limits(10, MB, 60 * MB),
            &["jpg", "jpeg"],
        );
        assert_eq!(batch.len(), 1);
        assert_eq!(
            rejected,
            vec![Rejection {
                filename: "a.png".into(),
                cause: RejectionCause::WrongExtension,
            }]
        );
    }

    #[test]
    fn missing_extension_is_wrong_extension() {
        let (batch, rejected) = validate(
            vec![file("noext", 10)],
            &limits(10, MB, 60 * MB),
            &["jpg"],
        );
        assert!(batch.is_empty());
        assert_eq!(rejected[0].cause, RejectionCause::WrongExtension);
    }

    #[test]
    fn rejects_oversized_file_and_continues() {
        let (batch, rejected) = validate(
            vec![file("big.jpg", 2 * MB), file("ok.jpg", 10)],
            &limits(10, MB, 60 * MB),
            &["jpg"],
        );
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.files()[0].name, "ok.jpg");
        assert_eq!(rejected[0].cause, RejectionCause::TooLarge);
    }

    // The fail-fast fixture: six 10MB files exactly fill the 60MB cap
    // (inclusive boundary); the seventh is rejected even though it alone
    // would fit, because the sixth admission already met the cap and the
    // seventh crosses it.
    #[test]
    fn aggregate_cutoff_is_fail_fast_and_inclusive() {
        let mut files: Vec<_> = (1..=6).map(|i| file(&format!("f{i}.jpg"), 10 * MB)).collect();
        files.push(file("f7.jpg", MB));

        let (batch, rejected) = validate(files, &limits(10, 10 * MB, 60 * MB), &["jpg"]);

        assert_eq!(batch.len(), 6);
        assert_eq!(batch.total_size(), 60 * MB);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].filename, "f7.jpg");
        assert_eq!(rejected[0].cause, RejectionCause::BatchTooLarge);
    }

    #[test]
    fn aggregate_overflow_stops_admission_of_later_smaller_files() {
        let (batch, rejected) = validate(
            vec![
                file("a.jpg", 50 * MB),
                file("b.jpg", 20 * MB), // crosses 60MB → stop
                file("c.jpg", 1),       // would fit, but admission has stopped
            ],
            &limits(10, 50 * MB, 60 * MB),
            &["jpg"],
        );
        assert_eq!(batch.len(), 1);
        assert_eq!(rejected.len(), 2);
        assert!(rejected.iter().all(|r| r.cause == RejectionCause::BatchTooLarge));
    }

    #[test]
    fn count_limit_stops_admission() {
        let files: Vec<_> = (0..5).map(|i| file(&format!("f{i}.jpg"), 10)).collect();
        let (batch, rejected) = validate(files, &limits(3, MB, 60 * MB), &["jpg"]);

        assert_eq!(batch.len(), 3);
        assert_eq!(rejected.len(), 2);
        assert!(rejected.iter().all(|r| r.cause == RejectionCause::BatchFull));
    }

    #[test]
    fn batch_invariants_hold() {
        let files: Vec<_> = (0..20)
            .map(|i| file(&format!("f{i}.jpg"), (i as u64 % 3) * MB + 1))
            .collect();
        let lim = limits(10, 2 * MB, 8 * MB);
        let (batch, _) = validate(files, &lim, &["jpg"]);

        assert!(batch.len() <= lim.max_files);
        assert!(batch.total_size() <= lim.max_total_size);
        for f in batch.files() {
            assert!(f.size() <= lim.max_file_size);
            assert_eq!(f.extension().as_deref(), Some("jpg"));
        }
    }

    #[test]
    fn stem_strips_only_last_extension() {
        let f = file("archive.tar.jpg", 1);
        assert_eq!(f.stem(), "archive.tar");
        assert_eq!(f.extension().as_deref(), Some("jpg"));
    }
}
