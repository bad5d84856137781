//! Configuration types for batch media conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across a session, serialise the plain-data
//! parts for logging, and diff two runs to understand why their outputs
//! differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::PixshiftError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source media format of a conversion session.
///
/// Determines which file extensions the validator admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    /// JPEG images (`.jpg` and `.jpeg` both accepted).
    Jpeg,
    /// PNG images.
    Png,
    /// WebP images.
    Webp,
    /// Video clips (`.mp4`, `.webm`, `.mov`).
    Video,
}

impl SourceFormat {
    /// File extensions (lowercase, no dot) this source format admits.
    pub fn accepted_extensions(&self) -> &'static [&'static str] {
        match self {
            SourceFormat::Jpeg => &["jpg", "jpeg"],
            SourceFormat::Png => &["png"],
            SourceFormat::Webp => &["webp"],
            SourceFormat::Video => &["mp4", "webm", "mov"],
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceFormat::Jpeg => "jpg",
            SourceFormat::Png => "png",
            SourceFormat::Webp => "webp",
            SourceFormat::Video => "video",
        };
        f.write_str(s)
    }
}

/// Target format of a conversion session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetFormat {
    Jpeg,
    Png,
    Webp,
    /// One single-page PDF per image; JPEG sources additionally collect
    /// pages for a combined document (see [`crate::registry`]).
    Pdf,
    /// Animated GIF from a captured frame window.
    Gif,
    /// Plain-text OCR output.
    Text,
}

impl TargetFormat {
    /// Output file extension (no dot).
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpg",
            TargetFormat::Png => "png",
            TargetFormat::Webp => "webp",
            TargetFormat::Pdf => "pdf",
            TargetFormat::Gif => "gif",
            TargetFormat::Text => "txt",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A source/target format pair selected for one conversion session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionKind {
    pub from: SourceFormat,
    pub to: TargetFormat,
}

impl ConversionKind {
    /// Build a conversion pair, rejecting combinations no transform exists for.
    ///
    /// Video sources can only become GIFs; image sources can become any
    /// image format, a PDF, or recognised text.
    pub fn new(from: SourceFormat, to: TargetFormat) -> Result<Self, PixshiftError> {
        let valid = match (from, to) {
            (SourceFormat::Video, TargetFormat::Gif) => true,
            (SourceFormat::Video, _) => false,
            (_, TargetFormat::Gif) => false,
            _ => true,
        };
        if !valid {
            return Err(PixshiftError::InvalidConfig(format!(
                "No transform exists for {from} → {to}"
            )));
        }
        Ok(Self { from, to })
    }

    /// Whether this pair supports merging all outputs into one combined
    /// document. Only JPEG → PDF qualifies.
    pub fn supports_merge(&self) -> bool {
        self.from == SourceFormat::Jpeg && self.to == TargetFormat::Pdf
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}

/// Limits applied to a raw file selection before any processing.
///
/// Immutable for the duration of a conversion session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionLimits {
    /// Maximum number of files admitted to one batch. Default: 10.
    pub max_files: usize,

    /// Maximum size of any single file in bytes. Default: 10 MiB.
    pub max_file_size: u64,

    /// Maximum aggregate size of the admitted batch in bytes. Default: 60 MiB.
    ///
    /// The boundary is inclusive: a batch summing to exactly this value is
    /// admitted. Crossing it stops admission entirely (fail-fast) — see
    /// [`crate::validate::validate`].
    pub max_total_size: u64,
}

impl Default for SelectionLimits {
    fn default() -> Self {
        Self {
            max_files: 10,
            max_file_size: 10 * 1024 * 1024,
            max_total_size: 60 * 1024 * 1024,
        }
    }
}

/// Settings for the frame-capture → GIF pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GifSettings {
    /// Length of the captured clip window in seconds. Default: 5.0.
    ///
    /// Capture stops early when the source ends before the window does.
    pub window_secs: f64,

    /// Interval between captured frames in milliseconds. Default: 100.
    ///
    /// Doubles as the per-frame display delay in the encoded GIF, so
    /// playback runs at capture speed.
    pub frame_interval_ms: u64,

    /// Divisor applied to the source dimensions. Default: 2.
    ///
    /// Halving each dimension quarters the pixel count per frame; GIF
    /// payload size grows quickly with resolution and a 5-second clip at
    /// full HD would be tens of megabytes.
    pub scale_divisor: u32,
}

impl Default for GifSettings {
    fn default() -> Self {
        Self {
            window_secs: 5.0,
            frame_interval_ms: 100,
            scale_divisor: 2,
        }
    }
}

/// Configuration for a batch conversion session.
///
/// Built via [`ConversionConfig::builder()`].
///
/// # Example
/// ```rust
/// use pixshift::{ConversionConfig, ConversionKind, SourceFormat, TargetFormat};
///
/// let kind = ConversionKind::new(SourceFormat::Jpeg, TargetFormat::Pdf).unwrap();
/// let config = ConversionConfig::builder(kind)
///     .max_files(5)
///     .jpeg_quality(85)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// The source/target pair this session converts.
    pub kind: ConversionKind,

    /// Limits applied by the validator before processing.
    pub limits: SelectionLimits,

    /// JPEG encode quality, 1–100. Default: 90.
    ///
    /// 90 keeps photographic detail while roughly halving file size versus
    /// quality 100. Values below ~70 show visible blocking on text and
    /// line art.
    pub jpeg_quality: u8,

    /// Frame-capture settings, used only when `kind.to` is GIF.
    pub gif: GifSettings,

    /// Delay inserted before each successive artifact write during bulk
    /// retrieval, in milliseconds. Default: 200.
    ///
    /// Host environments that hand artifacts to a browser throttle or drop
    /// near-simultaneous bulk downloads; spacing them out avoids that. This
    /// is a timing accommodation, not a correctness requirement — tune
    /// freely.
    pub stagger_delay_ms: u64,

    /// Apply the deterministic cleanup pass to recognised text. Default: true.
    ///
    /// See [`crate::pipeline::textclean`] for the rules.
    pub clean_ocr_text: bool,

    /// Progress callback fired per file and per encoded frame.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("kind", &self.kind)
            .field("limits", &self.limits)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("gif", &self.gif)
            .field("stagger_delay_ms", &self.stagger_delay_ms)
            .field("clean_ocr_text", &self.clean_ocr_text)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for the given conversion pair.
    pub fn builder(kind: ConversionKind) -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: ConversionConfig {
                kind,
                limits: SelectionLimits::default(),
                jpeg_quality: 90,
                gif: GifSettings::default(),
                stagger_delay_ms: 200,
                clean_ocr_text: true,
                progress_callback: None,
            },
        }
    }

    /// Convenience: default configuration for a conversion pair.
    pub fn for_kind(kind: ConversionKind) -> Self {
        Self::builder(kind)
            .build()
            .expect("default configuration is valid")
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn limits(mut self, limits: SelectionLimits) -> Self {
        self.config.limits = limits;
        self
    }

    pub fn max_files(mut self, n: usize) -> Self {
        self.config.limits.max_files = n.max(1);
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.limits.max_file_size = bytes;
        self
    }

    pub fn max_total_size(mut self, bytes: u64) -> Self {
        self.config.limits.max_total_size = bytes;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn gif(mut self, settings: GifSettings) -> Self {
        self.config.gif = settings;
        self
    }

    pub fn stagger_delay_ms(mut self, ms: u64) -> Self {
        self.config.stagger_delay_ms = ms;
        self
    }

    pub fn clean_ocr_text(mut self, v: bool) -> Self {
        self.config.clean_ocr_text = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, PixshiftError> {
        let c = &self.config;
        if c.limits.max_file_size > c.limits.max_total_size {
            return Err(PixshiftError::InvalidConfig(format!(
                "max_file_size ({}) exceeds max_total_size ({})",
                c.limits.max_file_size, c.limits.max_total_size
            )));
        }
        if c.gif.window_secs <= 0.0 {
            return Err(PixshiftError::InvalidConfig(
                "GIF window must be positive".into(),
            ));
        }
        if c.gif.frame_interval_ms == 0 {
            return Err(PixshiftError::InvalidConfig(
                "GIF frame interval must be ≥ 1ms".into(),
            ));
        }
        if c.gif.scale_divisor == 0 {
            return Err(PixshiftError::InvalidConfig(
                "GIF scale divisor must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_extensions_cover_both_spellings() {
        assert_eq!(SourceFormat::Jpeg.accepted_extensions(), &["jpg", "jpeg"]);
    }

    #[test]
    fn video_only_converts_to_gif() {
        assert!(ConversionKind::new(SourceFormat::Video, TargetFormat::Gif).is_ok());
        assert!(ConversionKind::new(SourceFormat::Video, TargetFormat::Pdf).is_err());
        assert!(ConversionKind::new(SourceFormat::Png, TargetFormat::Gif).is_err());
    }

    #[test]
    fn merge_only_for_jpeg_to_pdf() {
        let jpeg_pdf = ConversionKind::new(SourceFormat::Jpeg, TargetFormat::Pdf).unwrap();
        assert!(jpeg_pdf.supports_merge());

        let png_pdf = ConversionKind::new(SourceFormat::Png, TargetFormat::Pdf).unwrap();
        assert!(!png_pdf.supports_merge());

        let jpeg_webp = ConversionKind::new(SourceFormat::Jpeg, TargetFormat::Webp).unwrap();
        assert!(!jpeg_webp.supports_merge());
    }

    #[test]
    fn default_limits_match_product_constants() {
        let limits = SelectionLimits::default();
        assert_eq!(limits.max_files, 10);
        assert_eq!(limits.max_file_size, 10 * 1024 * 1024);
        assert_eq!(limits.max_total_size, 60 * 1024 * 1024);
    }

    #[test]
    fn builder_clamps_quality() {
        let kind = ConversionKind::new(SourceFormat::Png, TargetFormat::Jpeg).unwrap();
        let config = ConversionConfig::builder(kind).jpeg_quality(150).build().unwrap();
        assert_eq!(config.jpeg_quality, 100);
    }

    #[test]
    fn builder_rejects_zero_frame_interval() {
        let kind = ConversionKind::new(SourceFormat::Video, TargetFormat::Gif).unwrap();
        let result = ConversionConfig::builder(kind)
            .gif(GifSettings {
                frame_interval_ms: 0,
                ..GifSettings::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_rejects_inverted_size_limits() {
        let kind = ConversionKind::new(SourceFormat::Jpeg, TargetFormat::Png).unwrap();
        let result = ConversionConfig::builder(kind)
            .max_file_size(100)
            .max_total_size(50)
            .build();
        assert!(result.is_err());
    }
}
