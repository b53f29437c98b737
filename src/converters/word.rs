//! Word → PDF and plain text → PDF, both through the flowing layout engine.

use super::converted;
use crate::config::{ConversionConfig, PageLayout};
use crate::error::ConvertError;
use crate::format::Format;
use crate::ingest::SourceFile;
use crate::output::{ConversionStats, ConvertedFile};
use crate::pipeline::blocks::{clean_text, segment_html};
use crate::pipeline::docx::read_docx;
use crate::pipeline::fonts::FontVariant;
use crate::pipeline::layout::{layout_blocks, FormattedBlock, LayoutOutcome};
use crate::pipeline::pdf_writer::{DocumentInfo, PageCanvas, PdfWriter};
use crate::progress::{scaled, ProgressReporter};
use tracing::{info, warn};

/// Drawn on the only page of a document with no text.
pub const EMPTY_DOCUMENT_TEXT: &str = "No content found in document";

const WORD_PDF_AUTHOR: &str = "Word to PDF Converter";

/// Compound File Binary signature of legacy `.doc` files.
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Lay out a DOCX body on A4 pages.
///
/// Progress: 10 on entry, 20 once the package is read, 40 once blocks are
/// segmented, 50 before layout, up to 89 across blocks, 90 once serialised.
/// Blocks that cannot be drawn are skipped and counted in the stats.
pub fn word_to_pdf(
    source: &SourceFile,
    config: &ConversionConfig,
    progress: &ProgressReporter,
) -> Result<ConvertedFile, ConvertError> {
    progress.report(10);
    if source.bytes.starts_with(OLE_MAGIC) {
        return Err(ConvertError::decode(
            Format::Word,
            "legacy binary .doc files are not supported; save the document as .docx",
        ));
    }
    let content = read_docx(&source.bytes).map_err(|e| ConvertError::decode(Format::Word, e))?;
    progress.report(20);

    let layout = &config.document_layout;
    let blocks = if config.preserve_formatting {
        segment_html(&content.html, layout.font_size)
    } else {
        let text = clean_text(&content.raw_text);
        if text.is_empty() {
            Vec::new()
        } else {
            vec![FormattedBlock::plain(text, layout.font_size)]
        }
    };
    info!("Word document segmented into {} blocks", blocks.len());
    progress.report(40);

    let info = DocumentInfo {
        title: Some(source.stem().to_string()),
        author: Some(WORD_PDF_AUTHOR.to_string()),
    };
    progress.report(50);
    let (bytes, outcome) = render_blocks(&blocks, layout, &info, |done, total| {
        progress.report((50 + scaled(done, total, 40)).min(89));
    })?;
    progress.report(90);

    for skipped in &outcome.skipped {
        progress.item_skipped(skipped);
    }
    if !outcome.skipped.is_empty() {
        warn!("{} content blocks could not be drawn", outcome.skipped.len());
    }

    let stats = ConversionStats {
        pages: outcome.pages,
        skipped_items: outcome.skipped.len(),
        skipped: outcome.skipped,
        ..Default::default()
    };
    Ok(converted(source, Format::Word, Format::Pdf, bytes, stats))
}

/// Lay out UTF-8 text with the regular face, one paragraph per line.
pub fn text_to_pdf(
    source: &SourceFile,
    config: &ConversionConfig,
    progress: &ProgressReporter,
) -> Result<ConvertedFile, ConvertError> {
    let layout = &config.text_layout;
    let text = String::from_utf8_lossy(&source.bytes)
        .replace("\r\n", "\n")
        .replace('\r', "\n");
    let blocks = if text.trim().is_empty() {
        Vec::new()
    } else {
        vec![FormattedBlock::plain(text, layout.font_size)]
    };

    let info = DocumentInfo {
        title: Some(source.stem().to_string()),
        author: None,
    };
    let (bytes, outcome) = render_blocks(&blocks, layout, &info, |_, _| {})?;
    progress.report(90);

    let stats = ConversionStats {
        pages: outcome.pages,
        skipped_items: outcome.skipped.len(),
        skipped: outcome.skipped,
        ..Default::default()
    };
    Ok(converted(source, Format::Text, Format::Pdf, bytes, stats))
}

/// Lay out `blocks`, or the empty-document placeholder, and serialise.
fn render_blocks(
    blocks: &[FormattedBlock],
    layout: &PageLayout,
    info: &DocumentInfo,
    on_block: impl FnMut(usize, usize),
) -> Result<(Vec<u8>, LayoutOutcome), ConvertError> {
    let mut writer = PdfWriter::new(layout.width, layout.height);
    let outcome = if blocks.is_empty() {
        let mut canvas = PageCanvas::new();
        canvas.text(
            layout.margin,
            layout.height - layout.margin - 20.0,
            FontVariant::Regular,
            layout.font_size,
            EMPTY_DOCUMENT_TEXT,
        );
        writer
            .add_page(canvas)
            .map_err(|e| ConvertError::encode(Format::Pdf, e))?;
        LayoutOutcome {
            pages: 1,
            skipped: Vec::new(),
        }
    } else {
        layout_blocks(blocks, layout, &mut writer, on_block)
            .map_err(|e| ConvertError::encode(Format::Pdf, e))?
    };

    let bytes = writer
        .finish(info)
        .map_err(|e| ConvertError::encode(Format::Pdf, e))?;
    if !bytes.starts_with(b"%PDF") {
        return Err(ConvertError::encode(Format::Pdf, "output is missing the %PDF header"));
    }
    Ok((bytes, outcome))
}
