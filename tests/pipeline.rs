//! End-to-end pipeline tests: session flow, partial failure, retrieval.
//!
//! These exercise the public API only — real image bytes in, real artifacts
//! out — the way an embedding host would drive the crate.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use pixshift::{
    CandidateFile, ConversionConfig, ConversionKind, ConversionSession, PixshiftError,
    RejectionCause, SourceFormat, Step, TargetFormat,
};
use std::io::Cursor;

/// A small solid-colour image encoded as the given format.
fn image_file(name: &str, width: u32, height: u32, format: ImageFormat) -> CandidateFile {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([40, 90, 160])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode fixture");
    CandidateFile::new(name, buf)
}

fn jpeg_file(name: &str, width: u32, height: u32) -> CandidateFile {
    image_file(name, width, height, ImageFormat::Jpeg)
}

fn session_for(from: SourceFormat, to: TargetFormat) -> ConversionSession {
    let kind = ConversionKind::new(from, to).expect("valid pair");
    ConversionSession::new(ConversionConfig::for_kind(kind))
}

#[tokio::test]
async fn jpeg_batch_converts_to_png_in_order() {
    let mut session = session_for(SourceFormat::Jpeg, TargetFormat::Png);
    session
        .load_selection(vec![
            jpeg_file("first.jpg", 10, 8),
            jpeg_file("second.jpg", 8, 10),
            jpeg_file("third.jpg", 6, 6),
        ])
        .unwrap();

    let outcome = session.convert().await.unwrap();
    assert_eq!(outcome.stats.converted_files, 3);
    assert_eq!(outcome.stats.failed_files, 0);

    let names: Vec<_> = session
        .registry()
        .list()
        .iter()
        .map(|a| a.filename.as_str())
        .collect();
    assert_eq!(names, vec!["first.png", "second.png", "third.png"]);

    // PNG magic on every artifact.
    for artifact in session.registry().list() {
        assert_eq!(&artifact.data[..4], &[0x89, b'P', b'N', b'G']);
    }
}

#[tokio::test]
async fn corrupt_file_is_isolated_and_reported() {
    let mut session = session_for(SourceFormat::Jpeg, TargetFormat::Png);
    session
        .load_selection(vec![
            jpeg_file("good1.jpg", 6, 6),
            CandidateFile::new("broken.jpg", vec![0u8; 64]),
            jpeg_file("good2.jpg", 6, 6),
        ])
        .unwrap();

    let outcome = session.convert().await.unwrap();
    assert_eq!(outcome.stats.converted_files, 2);
    assert_eq!(outcome.stats.failed_files, 1);
    assert_eq!(outcome.stats.artifacts_produced, 2);

    let failures: Vec<_> = outcome.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "broken.jpg");

    // The two successes kept their relative order.
    let names: Vec<_> = session
        .registry()
        .list()
        .iter()
        .map(|a| a.filename.as_str())
        .collect();
    assert_eq!(names, vec!["good1.png", "good2.png"]);
}

#[tokio::test]
async fn all_corrupt_batch_is_fatal_but_session_stays_usable() {
    let mut session = session_for(SourceFormat::Jpeg, TargetFormat::Png);
    session
        .load_selection(vec![
            CandidateFile::new("a.jpg", vec![1u8; 16]),
            CandidateFile::new("b.jpg", vec![2u8; 16]),
        ])
        .unwrap();

    let err = session.convert().await.unwrap_err();
    assert!(matches!(
        err,
        PixshiftError::NoArtifactsProduced { attempted: 2, .. }
    ));

    // The session moved to Results regardless; reset recovers it.
    assert_eq!(session.step(), Step::Results);
    session.reset();
    assert_eq!(session.step(), Step::Selection);
}

#[tokio::test]
async fn validation_rejections_surface_through_the_session() {
    let mut session = session_for(SourceFormat::Jpeg, TargetFormat::Png);
    let rejections = session
        .load_selection(vec![
            jpeg_file("ok.jpg", 6, 6),
            jpeg_file("wrong.png", 6, 6),
        ])
        .unwrap()
        .to_vec();

    assert_eq!(rejections.len(), 1);
    assert_eq!(rejections[0].filename, "wrong.png");
    assert_eq!(rejections[0].cause, RejectionCause::WrongExtension);
    assert_eq!(session.batch().len(), 1);
}

#[tokio::test]
async fn jpeg_to_pdf_produces_per_file_pdfs_and_a_combined_document() {
    let mut session = session_for(SourceFormat::Jpeg, TargetFormat::Pdf);
    session
        .load_selection(vec![
            jpeg_file("wide.jpg", 40, 30),
            jpeg_file("tall.jpg", 30, 40),
        ])
        .unwrap();
    session.convert().await.unwrap();

    // One single-page PDF per input.
    let pdf = session.artifact("wide.pdf").unwrap();
    assert_eq!(&pdf.data[..5], b"%PDF-");
    assert_eq!(
        pdf.dimensions.map(|d| (d.width, d.height)),
        Some((40, 30))
    );

    // Plus the combined document, one page per input in batch order.
    let merged = session.merged_document().unwrap();
    assert_eq!(merged.filename, pixshift::MERGED_DOCUMENT_NAME);
    let doc = lopdf::Document::load_mem(&merged.data).expect("merged PDF parses");
    assert_eq!(doc.page_iter().count(), 2);
}

#[tokio::test]
async fn export_writes_every_artifact_to_disk() {
    let mut session = session_for(SourceFormat::Jpeg, TargetFormat::Webp);
    session
        .load_selection(vec![jpeg_file("a.jpg", 4, 4), jpeg_file("b.jpg", 4, 4)])
        .unwrap();
    session.convert().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let written = session.export_all(dir.path()).await.unwrap();

    assert_eq!(written.len(), 2);
    for path in &written {
        let bytes = std::fs::read(path).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
    }
}

#[tokio::test]
async fn reset_clears_everything_and_allows_a_second_batch() {
    let mut session = session_for(SourceFormat::Png, TargetFormat::Jpeg);
    session
        .load_selection(vec![image_file("one.png", 5, 5, ImageFormat::Png)])
        .unwrap();
    session.convert().await.unwrap();
    assert_eq!(session.registry().len(), 1);

    session.reset();
    assert!(session.registry().is_empty());
    assert!(session.batch().is_empty());

    // Second run over a fresh selection starts from a clean registry.
    session
        .load_selection(vec![image_file("two.png", 5, 5, ImageFormat::Png)])
        .unwrap();
    session.convert().await.unwrap();

    let names: Vec<_> = session
        .registry()
        .list()
        .iter()
        .map(|a| a.filename.as_str())
        .collect();
    assert_eq!(names, vec!["two.jpg"]);
}

#[tokio::test]
async fn batch_limits_apply_before_conversion() {
    let kind = ConversionKind::new(SourceFormat::Jpeg, TargetFormat::Png).unwrap();
    let config = ConversionConfig::builder(kind)
        .max_files(2)
        .build()
        .unwrap();
    let mut session = ConversionSession::new(config);

    let rejections = session
        .load_selection(vec![
            jpeg_file("a.jpg", 4, 4),
            jpeg_file("b.jpg", 4, 4),
            jpeg_file("c.jpg", 4, 4),
        ])
        .unwrap()
        .to_vec();

    assert_eq!(session.batch().len(), 2);
    assert_eq!(rejections.len(), 1);
    assert_eq!(rejections[0].cause, RejectionCause::BatchFull);

    let outcome = session.convert().await.unwrap();
    assert_eq!(outcome.stats.total_files, 2);
}
