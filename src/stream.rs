//! Streaming conversion: artifacts as they are produced.
//!
//! The registry-based flow ([`crate::convert::run_batch`]) holds every
//! artifact until the batch finishes. For hosts that forward outputs as they
//! arrive — an HTTP response, a channel to a UI — [`convert_stream`] yields
//! each artifact the moment its transform completes, still one file at a
//! time and in batch order.
//!
//! Streaming trades away the merge: combined-document pages are not
//! collected, because the merge needs the whole batch before it can compose
//! anything. Use the registry flow when the combined PDF matters.

use crate::error::FileError;
use crate::output::Artifact;
use crate::pipeline::transform::FileTransform;
use crate::validate::ValidatedBatch;
use futures::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;

/// A stream of per-file conversion results, in batch order.
///
/// A failed file yields one `Err` item and the stream continues with the
/// next file; a file may yield several `Ok` items if its transform produces
/// several artifacts.
pub type ArtifactStream = Pin<Box<dyn Stream<Item = Result<Artifact, FileError>> + Send>>;

/// Convert `batch` with `transform`, yielding artifacts as they complete.
///
/// File contents are shared by handle, so building the stream does not copy
/// payloads out of the batch.
pub fn convert_stream(batch: &ValidatedBatch, transform: Arc<dyn FileTransform>) -> ArtifactStream {
    let files = batch.files().to_vec();

    Box::pin(
        stream::iter(files)
            .then(move |file| {
                let transform = Arc::clone(&transform);
                async move {
                    match transform.transform(&file).await {
                        Ok(output) => {
                            let items: Vec<Result<Artifact, FileError>> =
                                output.artifacts.into_iter().map(Ok).collect();
                            stream::iter(items)
                        }
                        Err(e) => stream::iter(vec![Err(e)]),
                    }
                }
            })
            .flatten(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::TransformOutput;
    use crate::validate::{validate, CandidateFile};
    use async_trait::async_trait;

    struct MarkerTransform;

    #[async_trait]
    impl FileTransform for MarkerTransform {
        async fn transform(&self, file: &CandidateFile) -> Result<TransformOutput, FileError> {
            if file.data.as_ref() == b"FAIL" {
                return Err(FileError::DecodeFailed {
                    name: file.name.clone(),
                    detail: "marker".into(),
                });
            }
            Ok(TransformOutput::single(Artifact::new(
                format!("{}.out", file.stem()),
                file.data.clone(),
                "application/octet-stream",
            )))
        }
    }

    #[tokio::test]
    async fn yields_results_in_batch_order_with_failures_inline() {
        let (batch, _) = validate(
            vec![
                CandidateFile::new("a.jpg", &b"AA"[..]),
                CandidateFile::new("b.jpg", &b"FAIL"[..]),
                CandidateFile::new("c.jpg", &b"CC"[..]),
            ],
            &Default::default(),
            &["jpg"],
        );

        let results: Vec<_> = convert_stream(&batch, Arc::new(MarkerTransform))
            .collect()
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().filename, "a.out");
        assert!(matches!(
            results[1],
            Err(FileError::DecodeFailed { ref name, .. }) if name == "b.jpg"
        ));
        assert_eq!(results[2].as_ref().unwrap().filename, "c.out");
    }

    #[tokio::test]
    async fn empty_batch_yields_an_empty_stream() {
        let (batch, _) = validate(vec![], &Default::default(), &["jpg"]);
        let results: Vec<_> = convert_stream(&batch, Arc::new(MarkerTransform))
            .collect()
            .await;
        assert!(results.is_empty());
    }
}
