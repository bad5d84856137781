//! CLI binary for pixshift.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, drives a conversion session, and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pixshift::pipeline::animate::{capture_gif, FrameSource, ImageSequenceSource};
use pixshift::{
    BatchProgressCallback, CandidateFile, ConversionConfig, ConversionKind, ConversionSession,
    GifSettings, ProgressCallback, SourceFormat, Step, TargetFormat,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

/// Truncate very long error messages to keep output tidy. Cuts at char
/// boundaries; messages embed filenames, which may be multibyte.
fn truncate_message(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{cut}\u{2026}")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar across the batch, a log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>2}/{len} files  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_length(total_files as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
    }

    fn on_file_start(&self, index: usize, total_files: usize) {
        self.bar
            .set_message(format!("file {}/{}", index + 1, total_files));
    }

    fn on_file_complete(&self, index: usize, total_files: usize, artifact_count: usize) {
        self.bar.println(format!(
            "  {} File {:>2}/{:<2}  {}",
            green("✓"),
            index + 1,
            total_files,
            dim(&format!(
                "{artifact_count} artifact{}",
                if artifact_count == 1 { "" } else { "s" }
            )),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total_files: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = truncate_message(error, 80);

        self.bar.println(format!(
            "  {} File {:>2}/{:<2}  {}",
            red("✗"),
            index + 1,
            total_files,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = total_files.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if failed == total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert JPEGs to PNG
  pixshift convert --from jpg --to png photo1.jpg photo2.jpg -o out/

  # Scans to per-image PDFs plus one combined document
  pixshift convert --from jpg --to pdf --merge scan*.jpg -o out/

  # PNG batch to WebP at quality defaults
  pixshift convert --from png --to webp *.png -o out/

  # Animated GIF from a directory of extracted frames
  pixshift gif frames/ --fps 10 -o out/clip.gif

  # Tighter capture: 3-second window, full-resolution frames
  pixshift gif frames/ --fps 24 --window 3 --scale 1 -o out/clip.gif

  # JSON stats for scripting
  pixshift convert --from jpg --to pdf --json a.jpg b.jpg -o out/

CONVERSION PAIRS:
  Images (jpg, png, webp) convert to any image format or to PDF.
  Only jpg → pdf collects pages for --merge.
  Video → GIF needs a frame decoder; the `gif` subcommand works from
  a directory of pre-extracted frames instead.

BATCH LIMITS (defaults):
  10 files per batch, 10 MiB per file, 60 MiB per batch.
  Files over a limit are skipped with a per-file message; crossing the
  batch total stops admission of the remaining files.
"#;

/// Batch media conversion: images, PDFs, GIFs, text extraction.
#[derive(Parser, Debug)]
#[command(
    name = "pixshift",
    version,
    about = "Batch media conversion: image formats, image-to-PDF with merge, frame-sequence GIFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PIXSHIFT_VERBOSE", global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PIXSHIFT_QUIET", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a batch of files between formats.
    Convert(ConvertArgs),
    /// Encode a directory of frames as an animated GIF.
    Gif(GifArgs),
}

#[derive(clap::Args, Debug)]
struct ConvertArgs {
    /// Source format: jpg, png, webp.
    #[arg(long, value_enum)]
    from: SourceArg,

    /// Target format: jpg, png, webp, pdf.
    #[arg(long, value_enum)]
    to: TargetArg,

    /// Input files.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output directory.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Also write the combined document (jpg → pdf only).
    #[arg(long)]
    merge: bool,

    /// JPEG encode quality, 1–100.
    #[arg(long, default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Maximum number of files admitted to the batch.
    #[arg(long, default_value_t = 10)]
    max_files: usize,

    /// Delay between successive output writes, in milliseconds.
    #[arg(long, default_value_t = 0)]
    stagger_ms: u64,

    /// Print batch statistics as JSON instead of the summary line.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,
}

#[derive(clap::Args, Debug)]
struct GifArgs {
    /// Directory of frame images, encoded in filename order.
    frames: PathBuf,

    /// Frame rate the sequence was extracted at.
    #[arg(long, default_value_t = 10.0)]
    fps: f64,

    /// Output GIF path.
    #[arg(short, long, default_value = "PixShift.gif")]
    output: PathBuf,

    /// Capture window length in seconds.
    #[arg(long, default_value_t = 5.0)]
    window: f64,

    /// Capture start offset in seconds.
    #[arg(long, default_value_t = 0.0)]
    start: f64,

    /// Interval between captured frames in milliseconds.
    #[arg(long, default_value_t = 100)]
    interval: u64,

    /// Divisor applied to frame dimensions (2 = half size).
    #[arg(long, default_value_t = 2)]
    scale: u32,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SourceArg {
    Jpg,
    Png,
    Webp,
}

impl From<SourceArg> for SourceFormat {
    fn from(v: SourceArg) -> Self {
        match v {
            SourceArg::Jpg => SourceFormat::Jpeg,
            SourceArg::Png => SourceFormat::Png,
            SourceArg::Webp => SourceFormat::Webp,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TargetArg {
    Jpg,
    Png,
    Webp,
    Pdf,
}

impl From<TargetArg> for TargetFormat {
    fn from(v: TargetArg) -> Self {
        match v {
            TargetArg::Jpg => TargetFormat::Jpeg,
            TargetArg::Png => TargetFormat::Png,
            TargetArg::Webp => TargetFormat::Webp,
            TargetArg::Pdf => TargetFormat::Pdf,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Suppress INFO-level library logs when the progress bar is active; the
    // bar provides all the feedback that matters to the user.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        match &cli.command {
            Command::Convert(args) if args.no_progress && !args.json => "info",
            _ => "error",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Convert(args) => run_convert(args, cli.quiet).await,
        Command::Gif(args) => run_gif(args, cli.quiet).await,
    }
}

async fn run_convert(args: ConvertArgs, quiet: bool) -> Result<()> {
    let kind = ConversionKind::new(args.from.into(), args.to.into())
        .context("Unsupported conversion pair")?;

    let show_progress = !quiet && !args.no_progress && !args.json;
    let progress_cb: Option<ProgressCallback> = show_progress.then(|| {
        CliProgressCallback::new() as Arc<dyn BatchProgressCallback>
    });

    let mut builder = ConversionConfig::builder(kind)
        .jpeg_quality(args.quality)
        .max_files(args.max_files)
        .stagger_delay_ms(args.stagger_ms);
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Load and validate the selection ──────────────────────────────────
    let mut candidates = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("Not a file path: {}", path.display()))?;
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        candidates.push(CandidateFile::new(name, data));
    }

    let mut session = ConversionSession::new(config);
    let rejections = session
        .load_selection(candidates)
        .context("Selection failed")?;

    for rejection in rejections {
        eprintln!(
            "  {} {}  {}",
            red("skipped"),
            rejection.filename,
            dim(&format!("{:?}", rejection.cause)),
        );
    }
    if session.step() != Step::Review {
        anyhow::bail!("No files were admitted to the batch");
    }

    // ── Convert and export ───────────────────────────────────────────────
    let outcome = session.convert().await.context("Conversion failed")?;

    tokio::fs::create_dir_all(&args.output)
        .await
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let written = session
        .export_all(&args.output)
        .await
        .context("Export failed")?;

    let mut merged_path = None;
    if args.merge {
        let merged = session
            .merged_document()
            .context("Could not build the combined document")?;
        let path = args.output.join(&merged.filename);
        tokio::fs::write(&path, &merged.data)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        merged_path = Some(path);
    }

    // ── Summary ──────────────────────────────────────────────────────────
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome.stats).context("Failed to serialise stats")?
        );
    } else if !quiet {
        eprintln!(
            "{}  {}/{} files  {}ms  →  {}",
            if outcome.stats.failed_files == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            outcome.stats.converted_files,
            outcome.stats.total_files,
            outcome.stats.total_duration_ms,
            bold(&args.output.display().to_string()),
        );
        eprintln!("   {} artifacts written", dim(&written.len().to_string()));
        if let Some(path) = merged_path {
            eprintln!("   combined document: {}", bold(&path.display().to_string()));
        }
        for (name, error) in outcome.failures() {
            eprintln!("   {} {}: {}", red("✗"), name, error);
        }
    }

    Ok(())
}

async fn run_gif(args: GifArgs, quiet: bool) -> Result<()> {
    let mut source = ImageSequenceSource::from_dir(&args.frames, args.fps)
        .with_context(|| format!("Failed to read frames from {}", args.frames.display()))?;
    if source.frame_count() == 0 {
        anyhow::bail!("No decodable frames in {}", args.frames.display());
    }

    let settings = GifSettings {
        window_secs: args.window,
        frame_interval_ms: args.interval.max(1),
        scale_divisor: args.scale.max(1),
    };

    if !quiet {
        let (w, h) = source.dimensions();
        eprintln!(
            "{} {} frames ({w}x{h}), {:.1}s at {} fps",
            cyan("◆"),
            source.frame_count(),
            source.duration_secs(),
            args.fps,
        );
    }

    let gif = capture_gif(&mut source, &settings, args.start, None)
        .await
        .context("GIF capture failed")?;

    tokio::fs::write(&args.output, &gif)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if !quiet {
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(&args.output.display().to_string()),
            dim(&format!("{} bytes", gif.len())),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::truncate_message;

    #[test]
    fn short_messages_pass_through() {
        assert_eq!(truncate_message("decode failed", 80), "decode failed");
    }

    #[test]
    fn long_messages_are_cut_with_an_ellipsis() {
        let long = "x".repeat(100);
        let msg = truncate_message(&long, 80);
        assert_eq!(msg.chars().count(), 80);
        assert!(msg.ends_with('\u{2026}'));
    }

    #[test]
    fn truncation_respects_multibyte_filenames() {
        // A message dominated by multibyte characters must not split one.
        let long = format!("'{}': decode failed", "日本語ファイル名".repeat(20));
        let msg = truncate_message(&long, 80);
        assert_eq!(msg.chars().count(), 80);
        assert!(msg.ends_with('\u{2026}'));
    }
}
