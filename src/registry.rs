//! The artifact registry: accumulated outputs of a conversion session.
//!
//! The registry owns everything a batch run produced — per-file artifacts in
//! production order, plus any pages collected for the combined-document
//! merge. Retrieval goes through the registry rather than the batch outcome
//! so a host can convert once and pull outputs any number of times: one file
//! by name, the combined PDF, or everything in bulk.
//!
//! Byte handles inside the registry are [`bytes::Bytes`]; clearing the
//! registry drops the handles and releases the payloads (unless a caller
//! still holds a clone).

use crate::config::ConversionKind;
use crate::error::PixshiftError;
use crate::output::{Artifact, MergePage};
use crate::pipeline::document::compose_pdf;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Filename of the combined document produced by [`ArtifactRegistry::merge_document`].
pub const MERGED_DOCUMENT_NAME: &str = "Merged_Images.pdf";

/// Accumulates artifacts and merge pages across a batch run.
#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    artifacts: Vec<Artifact>,
    merge_pages: Vec<MergePage>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an artifact. Order of insertion is the order of retrieval.
    pub fn add(&mut self, artifact: Artifact) {
        debug!(
            "Registered artifact '{}' ({} bytes)",
            artifact.filename,
            artifact.len()
        );
        self.artifacts.push(artifact);
    }

    /// Append a page for the combined document.
    pub fn add_merge_page(&mut self, page: MergePage) {
        self.merge_pages.push(page);
    }

    /// All artifacts in production order.
    pub fn list(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Look up one artifact by its output filename.
    pub fn get(&self, filename: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.filename == filename)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Pages collected for the combined document.
    pub fn merge_page_count(&self) -> usize {
        self.merge_pages.len()
    }

    /// Drop all artifacts and merge pages, releasing their byte handles.
    pub fn clear(&mut self) {
        debug!(
            artifacts = self.artifacts.len(),
            merge_pages = self.merge_pages.len(),
            "Clearing registry"
        );
        self.artifacts.clear();
        self.merge_pages.clear();
    }

    /// Write every artifact to `dir`, pausing `stagger` between successive
    /// writes.
    ///
    /// Writes happen in registry order, each through a temporary file that is
    /// renamed into place, so a crash mid-export never leaves a truncated
    /// artifact under its final name. Returns the written paths in order.
    ///
    /// Fails with [`PixshiftError::NoArtifacts`] when the registry is empty;
    /// a write failure aborts the export at that artifact.
    pub async fn export_all(
        &self,
        dir: &Path,
        stagger: Duration,
    ) -> Result<Vec<PathBuf>, PixshiftError> {
        if self.artifacts.is_empty() {
            return Err(PixshiftError::NoArtifacts);
        }

        info!(
            count = self.artifacts.len(),
            dir = %dir.display(),
            "Exporting all artifacts"
        );

        let mut written = Vec::with_capacity(self.artifacts.len());
        for (i, artifact) in self.artifacts.iter().enumerate() {
            if i > 0 && !stagger.is_zero() {
                tokio::time::sleep(stagger).await;
            }

            let path = dir.join(&artifact.filename);
            write_atomically(&path, &artifact.data)
                .await
                .map_err(|source| PixshiftError::OutputWriteFailed {
                    path: path.clone(),
                    source,
                })?;
            debug!("Wrote '{}'", path.display());
            written.push(path);
        }

        Ok(written)
    }

    /// Compose the combined document from the collected merge pages.
    ///
    /// Only available for conversion pairs that collect pages
    /// ([`ConversionKind::supports_merge`]); page order is batch order, and
    /// each page keeps its own dimensions and orientation. The composed
    /// artifact is returned but NOT added to the registry — callers decide
    /// whether it joins the bulk export.
    pub fn merge_document(&self, kind: ConversionKind) -> Result<Artifact, PixshiftError> {
        if !kind.supports_merge() {
            return Err(PixshiftError::MergeUnsupported {
                kind: kind.to_string(),
            });
        }
        if self.merge_pages.is_empty() {
            return Err(PixshiftError::NothingToMerge);
        }

        let pdf = compose_pdf(&self.merge_pages)?;
        info!(
            pages = self.merge_pages.len(),
            bytes = pdf.len(),
            "Composed combined document"
        );

        // The first page's dimensions identify the document, matching how
        // page 1 anchors the composed PDF.
        let first = &self.merge_pages[0];
        Ok(Artifact::new(MERGED_DOCUMENT_NAME, pdf, "application/pdf")
            .with_dimensions(first.width, first.height))
    }
}

/// Write `data` to `path` via a sibling temp file and rename.
async fn write_atomically(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, data).await?;
    tokio::fs::rename(&tmp, path).await
}
