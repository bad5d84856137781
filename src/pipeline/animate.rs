//! Frame-window capture → animated GIF.
//!
//! The decode side of this pipeline is an external collaborator: a
//! [`FrameSource`] hands back one frame per requested timestamp (a browser
//! `<video>` element behind a seek callback, an ffmpeg wrapper, or a
//! pre-extracted frame sequence). This module owns the capture loop and the
//! GIF encode, mirroring the seek → draw → store sequence of the original
//! recorder: step through the clip window at a fixed interval, scale each
//! frame down, give every frame the same display delay so playback runs at
//! capture speed.
//!
//! Capture is strictly sequential — the next seek is not issued until the
//! current frame resolved. One frame in flight bounds peak memory to a
//! single decoded frame plus the growing GIF payload.

use crate::config::GifSettings;
use crate::error::FileError;
use crate::output::{Artifact, TransformOutput};
use crate::pipeline::transform::FileTransform;
use crate::progress::ProgressCallback;
use crate::validate::CandidateFile;
use async_trait::async_trait;
use image::codecs::gif::{GifEncoder, Repeat};
use image::imageops::FilterType;
use image::{Delay, Frame, RgbaImage};
use tracing::{debug, warn};

/// Yields decoded frames for arbitrary timestamps within a clip.
///
/// Implementations may suspend on seek/decode completion. `frame_at` is
/// called with strictly increasing timestamps during one capture.
#[async_trait]
pub trait FrameSource: Send {
    /// Native frame dimensions in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Total clip duration in seconds.
    fn duration_secs(&self) -> f64;

    /// Decode the frame at (or nearest before) `timestamp_secs`.
    async fn frame_at(&mut self, timestamp_secs: f64) -> Result<RgbaImage, FileError>;
}

/// Opens a [`FrameSource`] for a candidate file.
///
/// The opener is the host's seam: it knows how to turn raw clip bytes into
/// something seekable. The library ships [`ImageSequenceSource`] for
/// pre-extracted frame directories; video containers need a host decoder.
#[async_trait]
pub trait FrameSourceOpener: Send + Sync {
    async fn open(&self, file: &CandidateFile) -> Result<Box<dyn FrameSource>, FileError>;
}

/// Converts each clip file into one animated GIF artifact.
pub struct ClipToGifTransform {
    opener: std::sync::Arc<dyn FrameSourceOpener>,
    settings: GifSettings,
    /// Clip-window start within the source, in seconds.
    start_secs: f64,
    progress: Option<ProgressCallback>,
}

impl ClipToGifTransform {
    pub fn new(opener: std::sync::Arc<dyn FrameSourceOpener>, settings: GifSettings) -> Self {
        Self {
            opener,
            settings,
            start_secs: 0.0,
            progress: None,
        }
    }

    /// Start the capture window at `secs` instead of the clip start.
    pub fn with_start(mut self, secs: f64) -> Self {
        self.start_secs = secs.max(0.0);
        self
    }

    /// Report per-frame render progress (0.0–1.0) through `cb`.
    pub fn with_progress(mut self, cb: ProgressCallback) -> Self {
        self.progress = Some(cb);
        self
    }
}

#[async_trait]
impl FileTransform for ClipToGifTransform {
    async fn transform(&self, file: &CandidateFile) -> Result<TransformOutput, FileError> {
        let mut source = self.opener.open(file).await?;

        let gif = capture_gif(
            source.as_mut(),
            &self.settings,
            self.start_secs,
            self.progress.as_ref(),
        )
        .await
        .map_err(|e| match e {
            FileError::NoFramesCaptured { .. } => FileError::NoFramesCaptured {
                name: file.name.clone(),
            },
            other => other,
        })?;

        let (src_w, src_h) = source.dimensions();
        let divisor = self.settings.scale_divisor.max(1);
        let filename = format!("{}.gif", file.stem());
        debug!("Rendered '{}' → '{}' ({} bytes)", file.name, filename, gif.len());

        let artifact = Artifact::new(filename, gif, "image/gif")
            .with_dimensions((src_w / divisor).max(1), (src_h / divisor).max(1));
        Ok(TransformOutput::single(artifact))
    }
}

/// Drive the capture loop over `source` and encode the collected frames.
///
/// Steps from `start_secs` in `frame_interval_ms` increments until either
/// the clip window or the source ends, scaling each frame by the configured
/// divisor. Returns the encoded GIF bytes.
pub async fn capture_gif(
    source: &mut dyn FrameSource,
    settings: &GifSettings,
    start_secs: f64,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<u8>, FileError> {
    let (src_w, src_h) = source.dimensions();
    let divisor = settings.scale_divisor.max(1);
    let (out_w, out_h) = ((src_w / divisor).max(1), (src_h / divisor).max(1));

    let interval_secs = settings.frame_interval_ms as f64 / 1000.0;
    let window_end = (start_secs + settings.window_secs).min(source.duration_secs());
    let expected = ((window_end - start_secs) / interval_secs).ceil().max(0.0) as usize;

    let mut frames: Vec<Frame> = Vec::with_capacity(expected);
    let mut timestamp = start_secs;

    while timestamp < window_end {
        let raw = source.frame_at(timestamp).await?;
        let scaled = if divisor > 1 {
            image::imageops::resize(&raw, out_w, out_h, FilterType::Triangle)
        } else {
            raw
        };

        frames.push(Frame::from_parts(
            scaled,
            0,
            0,
            Delay::from_numer_denom_ms(settings.frame_interval_ms as u32, 1),
        ));

        if let Some(cb) = progress {
            let fraction = frames.len() as f64 / expected.max(1) as f64;
            cb.on_encode_progress(fraction.min(1.0));
        }

        timestamp += interval_secs;
    }

    if frames.is_empty() {
        warn!("Clip window [{:.2}s, {:.2}s) contains no frames", start_secs, window_end);
        return Err(FileError::NoFramesCaptured {
            name: String::new(),
        });
    }

    debug!("Captured {} frames at {}x{}", frames.len(), out_w, out_h);
    encode_frames(frames)
}

/// Encode captured frames as an infinitely-looping GIF.
fn encode_frames(frames: Vec<Frame>) -> Result<Vec<u8>, FileError> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| encode_err(e))?;
        for frame in frames {
            encoder.encode_frame(frame).map_err(|e| encode_err(e))?;
        }
    }
    Ok(buf)
}

fn encode_err(e: image::ImageError) -> FileError {
    FileError::EncodeFailed {
        name: String::new(),
        detail: e.to_string(),
    }
}

/// A [`FrameSource`] over pre-extracted frames on the file system.
///
/// Reads every decodable image in a directory in lexicographic filename
/// order and serves them at a fixed frame rate. Lets hosts without a video
/// decoder (the CLI included) exercise the full GIF pipeline.
pub struct ImageSequenceSource {
    frames: Vec<RgbaImage>,
    fps: f64,
}

impl ImageSequenceSource {
    /// Load all frames from `dir`, sorted by filename, served at `fps`.
    pub fn from_dir(dir: &std::path::Path, fps: f64) -> std::io::Result<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        let mut frames = Vec::new();
        for path in paths {
            match image::open(&path) {
                Ok(img) => frames.push(img.to_rgba8()),
                Err(e) => warn!("Skipping '{}': {}", path.display(), e),
            }
        }

        Ok(Self {
            frames,
            fps: fps.max(0.001),
        })
    }

    /// Build directly from decoded frames (used in tests and by hosts that
    /// already hold frames in memory).
    pub fn from_frames(frames: Vec<RgbaImage>, fps: f64) -> Self {
        Self {
            frames,
            fps: fps.max(0.001),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait]
impl FrameSource for ImageSequenceSource {
    fn dimensions(&self) -> (u32, u32) {
        self.frames
            .first()
            .map(|f| f.dimensions())
            .unwrap_or((0, 0))
    }

    fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 / self.fps
    }

    async fn frame_at(&mut self, timestamp_secs: f64) -> Result<RgbaImage, FileError> {
        let index = (timestamp_secs * self.fps).floor() as usize;
        self.frames
            .get(index)
            .cloned()
            .ok_or_else(|| FileError::FrameCaptureFailed {
                timestamp: timestamp_secs,
                detail: format!("frame index {index} out of range"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::BatchProgressCallback;
    use image::Rgba;
    use std::sync::{Arc, Mutex};

    fn solid_frames(n: usize, width: u32, height: u32) -> Vec<RgbaImage> {
        (0..n)
            .map(|i| RgbaImage::from_pixel(width, height, Rgba([(i * 10) as u8, 0, 0, 255])))
            .collect()
    }

    struct FractionRecorder {
        fractions: Mutex<Vec<f64>>,
    }

    impl BatchProgressCallback for FractionRecorder {
        fn on_encode_progress(&self, fraction: f64) {
            self.fractions.lock().unwrap().push(fraction);
        }
    }

    #[tokio::test]
    async fn captures_window_and_encodes_gif() {
        // 30 frames at 10 fps = 3s clip; 5s window is clamped to the clip.
        let mut source = ImageSequenceSource::from_frames(solid_frames(30, 16, 12), 10.0);
        let settings = GifSettings::default();

        let gif = capture_gif(&mut source, &settings, 0.0, None).await.unwrap();

        // GIF89a magic
        assert_eq!(&gif[..6], b"GIF89a");
    }

    #[tokio::test]
    async fn scales_frames_by_divisor() {
        let opener = SequenceOpener {
            frames: solid_frames(5, 20, 10),
            fps: 10.0,
        };
        let transform = ClipToGifTransform::new(Arc::new(opener), GifSettings::default());
        let out = transform
            .transform(&CandidateFile::new("clip.mp4", Vec::new()))
            .await
            .unwrap();

        let dims = out.artifacts[0].dimensions.unwrap();
        assert_eq!((dims.width, dims.height), (10, 5));
        assert_eq!(out.artifacts[0].filename, "clip.gif");
    }

    #[tokio::test]
    async fn window_start_past_clip_end_yields_no_frames() {
        let mut source = ImageSequenceSource::from_frames(solid_frames(10, 8, 8), 10.0);
        let err = capture_gif(&mut source, &GifSettings::default(), 60.0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::NoFramesCaptured { .. }));
    }

    #[tokio::test]
    async fn reports_monotonic_render_progress() {
        let recorder = Arc::new(FractionRecorder {
            fractions: Mutex::new(Vec::new()),
        });
        let cb: ProgressCallback = recorder.clone();

        let mut source = ImageSequenceSource::from_frames(solid_frames(20, 8, 8), 10.0);
        let settings = GifSettings {
            window_secs: 1.0,
            ..GifSettings::default()
        };
        capture_gif(&mut source, &settings, 0.0, Some(&cb)).await.unwrap();

        let fractions = recorder.fractions.lock().unwrap();
        assert!(!fractions.is_empty());
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        assert!((fractions.last().unwrap() - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn sequence_source_serves_frames_by_timestamp() {
        let mut source = ImageSequenceSource::from_frames(solid_frames(3, 4, 4), 10.0);
        assert_eq!(source.frame_count(), 3);
        assert!((source.duration_secs() - 0.3).abs() < 1e-9);

        let frame = source.frame_at(0.25).await.unwrap();
        // 0.25s at 10fps → frame index 2
        assert_eq!(frame.get_pixel(0, 0)[0], 20);

        assert!(source.frame_at(0.35).await.is_err());
    }

    struct SequenceOpener {
        frames: Vec<RgbaImage>,
        fps: f64,
    }

    #[async_trait]
    impl FrameSourceOpener for SequenceOpener {
        async fn open(&self, _file: &CandidateFile) -> Result<Box<dyn FrameSource>, FileError> {
            Ok(Box::new(ImageSequenceSource::from_frames(
                self.frames.clone(),
                self.fps,
            )))
        }
    }
}
