//! PDF page operations: merge several documents, split one into pages.
//!
//! Both work on `lopdf::Document`s held in memory. Pages keep their content
//! streams and resources untouched; only the page tree is rebuilt.
//!
//! The async entry points [`merge`] and [`split`] run the CPU-bound work on
//! the blocking pool and report through the configured progress callback.

pub mod merge;
pub mod split;

pub use merge::{merge_pdfs, MergeQueue, QueuedPdf};
pub use split::{split_pdf, SplitSession};

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::format::Format;
use crate::ingest::SourceFile;
use crate::output::{ConversionStats, ConvertedFile};
use crate::progress::ProgressReporter;
use lopdf::{Document, ObjectId};
use std::time::Instant;
use tracing::info;

/// Download name of a merge result.
pub const MERGED_NAME: &str = "merged.pdf";
/// Download name of a combine-selected result.
pub const SELECTED_NAME: &str = "selected_pages.pdf";

/// Merge `files` in order on the blocking pool.
pub async fn merge(files: Vec<SourceFile>, config: &ConversionConfig) -> Result<ConvertedFile, ConvertError> {
    let progress = ProgressReporter::new(config.progress_callback.clone());
    run_blocking(&progress, "merge", move |p| merge_pdfs(&files, p)).await
}

/// Split `source` into single-page documents on the blocking pool.
pub async fn split(source: SourceFile, config: &ConversionConfig) -> Result<SplitSession, ConvertError> {
    let progress = ProgressReporter::new(config.progress_callback.clone());
    run_blocking(&progress, "split", move |p| split_pdf(&source, p)).await
}

async fn run_blocking<T: Send + 'static>(
    progress: &ProgressReporter,
    operation: &str,
    work: impl FnOnce(&ProgressReporter) -> Result<T, ConvertError> + Send + 'static,
) -> Result<T, ConvertError> {
    let start = Instant::now();
    progress.start(operation);
    let task_progress = progress.clone();
    let result = match tokio::task::spawn_blocking(move || work(&task_progress)).await {
        Ok(r) => r,
        Err(e) => Err(ConvertError::Internal(format!("{operation} task failed: {e}"))),
    };
    progress.finish(result.is_ok());
    info!(
        "{} finished in {}ms (ok: {})",
        operation,
        start.elapsed().as_millis(),
        result.is_ok()
    );
    result
}

// ── Shared lopdf helpers ─────────────────────────────────────────────────

fn load(file: &SourceFile) -> Result<Document, ConvertError> {
    Document::load_mem(&file.bytes)
        .map_err(|e| ConvertError::decode(Format::Pdf, format!("{}: {e}", file.name)))
}

fn save(mut doc: Document) -> Result<Vec<u8>, ConvertError> {
    doc.prune_objects();
    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ConvertError::encode(Format::Pdf, e))?;
    Ok(buffer)
}

/// A copy of `doc` holding only the 1-based pages in `keep`, in document order.
fn extract_pages(doc: &Document, keep: &[u32]) -> Result<Vec<u8>, ConvertError> {
    let mut copy = doc.clone();
    let mut drop: Vec<u32> = copy
        .get_pages()
        .keys()
        .copied()
        .filter(|n| !keep.contains(n))
        .collect();
    // Deleting from the back keeps the remaining page numbers stable.
    drop.reverse();
    for page_no in drop {
        copy.delete_pages(&[page_no]);
    }
    save(copy)
}

fn pdf_output(file_name: impl Into<String>, bytes: Vec<u8>, pages: usize) -> ConvertedFile {
    ConvertedFile {
        file_name: file_name.into(),
        mime_type: Format::Pdf.descriptor().mime_type.to_string(),
        bytes,
        stats: ConversionStats {
            pages,
            ..Default::default()
        },
    }
}

/// Object id of the root `Pages` node.
fn pages_root(doc: &Document) -> Result<ObjectId, lopdf::Error> {
    doc.catalog()?.get(b"Pages")?.as_reference()
}
