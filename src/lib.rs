//! # pixshift
//!
//! Batch media conversion with per-file failure isolation: validate a file
//! selection against batch limits, run one conversion kind over every
//! admitted file, and retrieve the outputs individually, merged, or in bulk.
//!
//! ## Pipeline
//!
//! ```text
//! ┌────────────┐   ┌──────────┐   ┌────────────┐   ┌───────────────┐
//! │ Selection  │──▶│ Validate │──▶│ Transform  │──▶│   Registry    │
//! │ (files)    │   │ (limits) │   │ (per file) │   │ (retrieve /   │
//! └────────────┘   └──────────┘   └────────────┘   │  merge /      │
//!                        │                         │  export)      │
//!                   rejections                     └───────────────┘
//!                 (user feedback)
//! ```
//!
//! Files are processed strictly one at a time, in admission order. A file
//! that fails to convert is recorded and skipped; the batch always runs to
//! completion, and only a batch that produces *nothing* is an error.
//!
//! ## Conversion kinds
//!
//! * Raster ↔ raster: JPEG, PNG, WebP ([`pipeline::image`])
//! * Image → single-page PDF, with JPEG sources collecting pages for one
//!   combined document ([`pipeline::document`])
//! * Video clip → animated GIF, frames supplied by a host
//!   [`pipeline::animate::FrameSource`]
//! * Image → recognised text via a host [`pipeline::ocr::OcrEngine`]
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pixshift::{
//!     ConversionConfig, ConversionKind, ConversionSession, SourceFormat, TargetFormat,
//! };
//!
//! # async fn run() -> Result<(), pixshift::PixshiftError> {
//! let kind = ConversionKind::new(SourceFormat::Jpeg, TargetFormat::Pdf)?;
//! let mut session = ConversionSession::new(ConversionConfig::for_kind(kind));
//!
//! let files = vec![/* pixshift::CandidateFile values */];
//! session.load_selection(files)?;
//! let outcome = session.convert().await?;
//! println!("{} of {} converted", outcome.stats.converted_files, outcome.stats.total_files);
//!
//! let combined = session.merged_document()?;
//! session.export_all(std::path::Path::new("out")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! For hosts that forward artifacts as they are produced, see
//! [`stream::convert_stream`].

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod session;
pub mod stream;
pub mod validate;

pub use config::{
    ConversionConfig, ConversionConfigBuilder, ConversionKind, GifSettings, SelectionLimits,
    SourceFormat, TargetFormat,
};
pub use convert::run_batch;
pub use error::{FileError, PixshiftError};
pub use output::{
    Artifact, BatchOutcome, BatchStats, FileResult, MergePage, PageOrientation, PixelDimensions,
    TransformOutput,
};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use registry::{ArtifactRegistry, MERGED_DOCUMENT_NAME};
pub use session::{ConversionSession, Step, StepNavigator};
pub use stream::{convert_stream, ArtifactStream};
pub use validate::{validate, CandidateFile, Rejection, RejectionCause, ValidatedBatch};
