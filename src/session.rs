//! The conversion session: a three-step wizard over the whole library.
//!
//! A session walks Selection → Review → Results, mirroring the flow a host
//! UI presents: pick files, confirm what was admitted, convert and retrieve.
//! Operations are gated on the current step — converting before a selection
//! was reviewed, or retrieving before a conversion ran, is a
//! [`PixshiftError::StepOutOfOrder`], not silent misbehaviour.
//!
//! The session owns the validated batch, the rejection feedback, and the
//! artifact registry; [`ConversionSession::reset`] returns all of it to the
//! initial state so one session can run any number of batches.

use crate::config::{ConversionConfig, SourceFormat, TargetFormat};
use crate::convert::run_batch;
use crate::error::PixshiftError;
use crate::output::{Artifact, BatchOutcome};
use crate::pipeline::animate::{ClipToGifTransform, FrameSourceOpener};
use crate::pipeline::document::ImageToPdfTransform;
use crate::pipeline::image::ImageConvertTransform;
use crate::pipeline::ocr::{OcrEngine, OcrTransform};
use crate::pipeline::transform::FileTransform;
use crate::registry::ArtifactRegistry;
use crate::validate::{validate, CandidateFile, Rejection, ValidatedBatch};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// The wizard step a session is currently on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// Accepting a file selection.
    Selection,
    /// A non-empty batch was admitted; awaiting confirmation.
    Review,
    /// A conversion was started; artifacts are retrievable.
    Results,
}

/// Tracks and gates the wizard step.
#[derive(Debug, Clone, Copy)]
pub struct StepNavigator {
    current: Step,
}

impl StepNavigator {
    pub fn new() -> Self {
        Self {
            current: Step::Selection,
        }
    }

    pub fn current(&self) -> Step {
        self.current
    }

    /// Move to `step` unconditionally.
    pub fn go_to(&mut self, step: Step) {
        debug!(from = ?self.current, to = ?step, "Step change");
        self.current = step;
    }

    /// Fail unless the session is on `expected`.
    pub fn require(&self, expected: Step) -> Result<(), PixshiftError> {
        if self.current == expected {
            Ok(())
        } else {
            Err(PixshiftError::StepOutOfOrder {
                expected,
                actual: self.current,
            })
        }
    }
}

impl Default for StepNavigator {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete conversion session: selection, review, conversion, retrieval.
pub struct ConversionSession {
    config: ConversionConfig,
    navigator: StepNavigator,
    batch: ValidatedBatch,
    rejections: Vec<Rejection>,
    registry: ArtifactRegistry,
    frame_opener: Option<Arc<dyn FrameSourceOpener>>,
    ocr_engine: Option<Arc<dyn OcrEngine>>,
}

impl ConversionSession {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            navigator: StepNavigator::new(),
            batch: ValidatedBatch::default(),
            rejections: Vec::new(),
            registry: ArtifactRegistry::new(),
            frame_opener: None,
            ocr_engine: None,
        }
    }

    /// Provide the frame source opener; required for video → GIF sessions.
    pub fn with_frame_opener(mut self, opener: Arc<dyn FrameSourceOpener>) -> Self {
        self.frame_opener = Some(opener);
        self
    }

    /// Provide the OCR engine; required for image → text sessions.
    pub fn with_ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr_engine = Some(engine);
        self
    }

    pub fn step(&self) -> Step {
        self.navigator.current()
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// The admitted batch.
    pub fn batch(&self) -> &ValidatedBatch {
        &self.batch
    }

    /// Rejections from the last selection, for per-file user feedback.
    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }

    pub fn registry(&self) -> &ArtifactRegistry {
        &self.registry
    }

    /// Validate a file selection against the session's limits.
    ///
    /// Admitted files become the session batch; every excluded file is
    /// recorded (and returned) as a rejection. When at least one file was
    /// admitted the session advances to Review; an entirely-rejected
    /// selection stays on Selection so the user can pick again.
    pub fn load_selection(
        &mut self,
        candidates: Vec<CandidateFile>,
    ) -> Result<&[Rejection], PixshiftError> {
        self.navigator.require(Step::Selection)?;

        let accepted = self.config.kind.from.accepted_extensions();
        let (batch, rejections) = validate(candidates, &self.config.limits, accepted);

        info!(
            admitted = batch.len(),
            rejected = rejections.len(),
            "Selection loaded"
        );
        self.batch = batch;
        self.rejections = rejections;

        if !self.batch.is_empty() {
            self.navigator.go_to(Step::Review);
        }
        Ok(&self.rejections)
    }

    /// Convert the reviewed batch.
    ///
    /// Advances to Results before the run starts, so artifacts that landed
    /// in the registry are retrievable even if the run ends in
    /// [`PixshiftError::NoArtifactsProduced`].
    pub async fn convert(&mut self) -> Result<BatchOutcome, PixshiftError> {
        self.navigator.require(Step::Review)?;
        let transform = self.build_transform()?;
        self.navigator.go_to(Step::Results);
        run_batch(&self.batch, transform.as_ref(), &self.config, &mut self.registry).await
    }

    /// One artifact by output filename.
    pub fn artifact(&self, filename: &str) -> Result<&Artifact, PixshiftError> {
        self.navigator.require(Step::Results)?;
        self.registry
            .get(filename)
            .ok_or_else(|| PixshiftError::ArtifactNotFound {
                filename: filename.to_string(),
            })
    }

    /// The combined document composed from the collected merge pages.
    pub fn merged_document(&self) -> Result<Artifact, PixshiftError> {
        self.navigator.require(Step::Results)?;
        self.registry.merge_document(self.config.kind)
    }

    /// Write every artifact to `dir`, spacing writes by the configured
    /// stagger delay.
    pub async fn export_all(&self, dir: &Path) -> Result<Vec<PathBuf>, PixshiftError> {
        self.navigator.require(Step::Results)?;
        let stagger = Duration::from_millis(self.config.stagger_delay_ms);
        self.registry.export_all(dir, stagger).await
    }

    /// Return the session to its initial state: empty batch, no rejections,
    /// empty registry, back on Selection. Idempotent.
    pub fn reset(&mut self) {
        info!("Session reset");
        self.batch.clear();
        self.rejections.clear();
        self.registry.clear();
        self.navigator.go_to(Step::Selection);
    }

    /// Select the transform for the configured conversion pair.
    fn build_transform(&self) -> Result<Box<dyn FileTransform>, PixshiftError> {
        let kind = self.config.kind;
        let transform: Box<dyn FileTransform> = match kind.to {
            TargetFormat::Jpeg | TargetFormat::Png | TargetFormat::Webp => Box::new(
                ImageConvertTransform::new(kind.to, self.config.jpeg_quality),
            ),
            TargetFormat::Pdf => Box::new(ImageToPdfTransform::new(kind, self.config.jpeg_quality)),
            TargetFormat::Gif => {
                debug_assert_eq!(kind.from, SourceFormat::Video);
                let opener = self.frame_opener.clone().ok_or_else(|| {
                    PixshiftError::InvalidConfig(
                        "video → gif conversion requires a frame source opener".into(),
                    )
                })?;
                let mut t = ClipToGifTransform::new(opener, self.config.gif.clone());
                if let Some(cb) = &self.config.progress_callback {
                    t = t.with_progress(Arc::clone(cb));
                }
                Box::new(t)
            }
            TargetFormat::Text => {
                let engine = self.ocr_engine.clone().ok_or_else(|| {
                    PixshiftError::InvalidConfig(
                        "image → text conversion requires an OCR engine".into(),
                    )
                })?;
                Box::new(OcrTransform::new(engine, self.config.clean_ocr_text))
            }
        };
        Ok(transform)
    }
}
