//! Per-file transforms for batch conversion.
//!
//! Each submodule implements exactly one conversion kind behind the
//! [`transform::FileTransform`] trait. Keeping the kinds separate makes each
//! independently testable and lets the batch driver ([`crate::convert`])
//! stay ignorant of what a transform actually does.
//!
//! ## Data Flow
//!
//! ```text
//! CandidateFile ──▶ transform ──▶ TransformOutput ──▶ ArtifactRegistry
//!  (validated)      (decode /      (artifacts +        (accumulate,
//!                    re-encode)     merge page)         retrieve, merge)
//! ```
//!
//! 1. [`image`]    — decode and re-encode between raster formats
//! 2. [`document`] — image → single-page PDF, plus combined-PDF composition
//! 3. [`animate`]  — frame-window capture → animated GIF
//! 4. [`ocr`]      — preprocess + recognise text via an external engine
//! 5. [`textclean`] — deterministic cleanup rules for recognised text

pub mod animate;
pub mod document;
pub mod image;
pub mod ocr;
pub mod textclean;
pub mod transform;
