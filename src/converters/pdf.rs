//! PDF → page images, PDF → Word, PDF → text.

use super::{converted, require_content};
use super::raster::raster_format;
use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::format::Format;
use crate::ingest::SourceFile;
use crate::output::{ConversionStats, ConvertedFile};
use crate::pipeline::archive::ArchiveBuilder;
use crate::pipeline::docx::write_docx;
use crate::pipeline::encode::encode_image;
use crate::pipeline::render::{PageRasterizer, PdfiumRasterizer};
use crate::pipeline::text::{load_pdf, page_numbers, page_text};
use crate::progress::{scaled, ProgressReporter};
use tracing::{debug, info, warn};

/// Render every page and bundle the images as `{stem}_page_{n}.{ext}` in a
/// ZIP, even when the document has a single page.
///
/// Progress: `round(n / total * 90)` after each page, 90 before the archive
/// is finalised.
pub fn pdf_to_images(
    source: &SourceFile,
    to: Format,
    config: &ConversionConfig,
    progress: &ProgressReporter,
) -> Result<ConvertedFile, ConvertError> {
    let target = raster_format(to)?;
    let default_rasterizer = PdfiumRasterizer;
    let rasterizer: &dyn PageRasterizer = match config.rasterizer {
        Some(ref r) => r.as_ref(),
        None => &default_rasterizer,
    };

    let stem = source.stem();
    let mut archive = ArchiveBuilder::new();
    let pages = rasterizer.render_each(&source.bytes, config.render_scale, &mut |page| {
        let bytes = encode_image(&page.image, target, config.jpeg_quality)
            .map_err(|e| ConvertError::encode(to, e))?;
        let entry = format!("{}_page_{}.{}", stem, page.index + 1, target.extension());
        archive
            .add(&entry, &bytes)
            .map_err(|e| ConvertError::encode(to, e))?;
        debug!("Added {} ({} bytes)", entry, bytes.len());
        progress.report(scaled(page.index + 1, page.total, 90));
        progress.page_complete(page.index + 1, page.total);
        Ok(())
    })?;

    if archive.is_empty() {
        warn!("{} has no pages; writing an empty archive", source.name);
    }
    progress.report(90);
    let bytes = archive.finish().map_err(|e| ConvertError::encode(to, e))?;
    info!("Rendered {} pages into {} bytes of ZIP", pages, bytes.len());

    let stats = ConversionStats {
        pages,
        ..Default::default()
    };
    Ok(converted(source, Format::Pdf, to, bytes, stats))
}

/// One DOCX paragraph per page holding that page's text.
///
/// Progress: `floor(page / total * 100)` after each page.
pub fn pdf_to_word(source: &SourceFile, progress: &ProgressReporter) -> Result<ConvertedFile, ConvertError> {
    let paragraphs = extract_pages(source, progress, |done, total| {
        (done * 100 / total) as u32
    })?;
    let pages = paragraphs.len();
    let bytes = write_docx(&paragraphs).map_err(|e| ConvertError::encode(Format::Word, e))?;

    let stats = ConversionStats {
        pages,
        ..Default::default()
    };
    Ok(converted(source, Format::Pdf, Format::Word, bytes, stats))
}

/// Page texts, each followed by a blank line. A document without pages is
/// an `Encode` error.
///
/// Progress: `round(page / total * 80)` after each page.
pub fn pdf_to_text(source: &SourceFile, progress: &ProgressReporter) -> Result<ConvertedFile, ConvertError> {
    let texts = extract_pages(source, progress, |done, total| scaled(done, total, 80))?;
    let pages = texts.len();
    let mut out = String::new();
    for text in texts {
        out.push_str(&text);
        out.push_str("\n\n");
    }

    let stats = ConversionStats {
        pages,
        ..Default::default()
    };
    let bytes = require_content(out.into_bytes(), Format::Text, "PDF text extraction")?;
    Ok(converted(source, Format::Pdf, Format::Text, bytes, stats))
}

fn extract_pages(
    source: &SourceFile,
    progress: &ProgressReporter,
    percent: impl Fn(usize, usize) -> u32,
) -> Result<Vec<String>, ConvertError> {
    let doc = load_pdf(&source.bytes).map_err(|e| ConvertError::decode(Format::Pdf, e))?;
    let numbers = page_numbers(&doc);
    let total = numbers.len();
    info!("Extracting text from {} pages", total);

    let mut texts = Vec::with_capacity(total);
    for (i, page_no) in numbers.into_iter().enumerate() {
        let text = page_text(&doc, page_no)
            .map_err(|e| ConvertError::decode(Format::Pdf, format!("page {page_no}: {e}")))?;
        debug!("Page {}: {} chars", page_no, text.len());
        texts.push(text);
        progress.report(percent(i + 1, total));
        progress.page_complete(i + 1, total);
    }
    Ok(texts)
}
