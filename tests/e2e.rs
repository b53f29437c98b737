//! End-to-end tests against a real pdfium library.
//!
//! PDF → image is the only path that needs pdfium, so these tests are gated
//! behind the `FILEDESK_PDFIUM_TESTS` environment variable and do not run in
//! CI unless explicitly requested.
//!
//! Run with:
//!   FILEDESK_PDFIUM_TESTS=1 PDFIUM_LIB_PATH=. cargo test --test e2e -- --nocapture
//!
//! Optional real-world inputs are read from `./test_cases/` when present.

use filedesk::{convert, convert_to_file, inspect, ConversionConfig, Format, SourceFile};
use image::GenericImageView;
use std::io::{Cursor, Read};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

macro_rules! skip_unless_pdfium {
    () => {
        if std::env::var("FILEDESK_PDFIUM_TESTS").is_err() {
            println!("SKIP — set FILEDESK_PDFIUM_TESTS=1 to run pdfium tests");
            return;
        }
    };
}

/// A two-page PDF produced by the library itself (text → PDF), so the
/// pdfium tests have no external fixtures.
async fn generated_pdf() -> SourceFile {
    let text: String = (1..=90).map(|i| format!("Line number {i}\n")).collect();
    let source = SourceFile::new("generated.txt", text.into_bytes());
    let pdf = convert(&source, Format::Text, Format::Pdf, &ConversionConfig::default())
        .await
        .expect("text → pdf should succeed");
    assert!(pdf.stats.pages >= 2, "fixture should span pages");
    SourceFile::new(pdf.file_name, pdf.bytes)
}

fn unzip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("valid zip");
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        entries.push((file.name().to_string(), data));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

// ── Rendering ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pdf_to_png_renders_every_page() {
    skip_unless_pdfium!();
    let pdf = generated_pdf().await;
    let pages = inspect_pages(&pdf).await;

    let out = convert(&pdf, Format::Pdf, Format::Png, &ConversionConfig::default())
        .await
        .expect("pdf → png should succeed");
    assert_eq!(out.file_name, "generated.zip");

    let entries = unzip(&out.bytes);
    assert_eq!(entries.len(), pages);
    for (i, (name, data)) in entries.iter().enumerate() {
        assert_eq!(name, &format!("generated_page_{}.png", i + 1));
        let img = image::load_from_memory(data).expect("decodable PNG");
        // A4 at the default ×2 scale.
        let (w, h) = img.dimensions();
        assert!((1185..=1195).contains(&w), "width {w}");
        assert!((1679..=1689).contains(&h), "height {h}");
    }
}

#[tokio::test]
async fn test_scale_changes_pixel_size() {
    skip_unless_pdfium!();
    let pdf = generated_pdf().await;
    let config = ConversionConfig::builder().render_scale(1.0).build().unwrap();

    let out = convert(&pdf, Format::Pdf, Format::Jpg, &config)
        .await
        .expect("pdf → jpg should succeed");
    let entries = unzip(&out.bytes);
    assert!(entries[0].1.starts_with(&[0xFF, 0xD8]));
    let (w, _) = image::load_from_memory(&entries[0].1).unwrap().dimensions();
    assert!((590..=600).contains(&w), "width {w}");
}

#[tokio::test]
async fn test_real_world_pdf_to_file() {
    skip_unless_pdfium!();
    let input = test_cases_dir().join("sample.pdf");
    if !input.exists() {
        println!("SKIP — test file not found: {}", input.display());
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("sample-pages.zip");

    let stats = convert_to_file(&input, &output, None, Format::Png, &ConversionConfig::default())
        .await
        .expect("conversion should succeed");
    let info = inspect(&input).await.unwrap();
    assert_eq!(Some(stats.pages), info.parts);
    assert!(output.exists());
}

#[tokio::test]
async fn test_corrupt_pdf_fails_cleanly() {
    skip_unless_pdfium!();
    let source = SourceFile::new("broken.pdf", b"%PDF-1.7\nthis is not a pdf".to_vec());
    let result = convert(&source, Format::Pdf, Format::Png, &ConversionConfig::default()).await;
    assert!(result.is_err(), "corrupt PDF must not render");
}

async fn inspect_pages(pdf: &SourceFile) -> usize {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(&pdf.name);
    std::fs::write(&path, &pdf.bytes).unwrap();
    inspect(&path).await.unwrap().parts.expect("page count")
}
