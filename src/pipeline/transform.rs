//! The per-file transform seam of the batch pipeline.
//!
//! A transform receives one validated file and produces the file's outputs,
//! suspending as needed on decode, draw, or encode completion. The batch
//! driver invokes transforms strictly one at a time; a transform never sees
//! more than one file in flight.

use crate::error::FileError;
use crate::output::TransformOutput;
use crate::validate::CandidateFile;
use async_trait::async_trait;

/// An asynchronous, possibly-suspending conversion of one file.
///
/// Implementations must be `Send + Sync`; the driver holds the transform
/// across await points. Returning `Err` marks this file as failed and the
/// batch moves on — a transform never aborts the batch.
#[async_trait]
pub trait FileTransform: Send + Sync {
    async fn transform(&self, file: &CandidateFile) -> Result<TransformOutput, FileError>;
}
