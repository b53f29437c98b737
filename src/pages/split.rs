//! Split a PDF into single-page documents and recombine a selection.

use super::{extract_pages, load, pdf_output, SELECTED_NAME};
use crate::error::ConvertError;
use crate::ingest::SourceFile;
use crate::output::ConvertedFile;
use crate::progress::{scaled, ProgressReporter};
use lopdf::Document;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Split `source` into one document per page, named `page_{n}.pdf`.
///
/// Progress: `round(n / total * 100)` after each page.
pub fn split_pdf(source: &SourceFile, progress: &ProgressReporter) -> Result<SplitSession, ConvertError> {
    let doc = load(source)?;
    let numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let total = numbers.len();
    info!("Splitting '{}' into {} pages", source.name, total);

    let mut pages = Vec::with_capacity(total);
    for (i, page_no) in numbers.iter().enumerate() {
        let bytes = extract_pages(&doc, &[*page_no])?;
        debug!("Page {} → {} bytes", page_no, bytes.len());
        pages.push(pdf_output(format!("page_{}.pdf", i + 1), bytes, 1));
        progress.report(scaled(i + 1, total, 100));
        progress.page_complete(i + 1, total);
    }

    Ok(SplitSession {
        source_name: source.name.clone(),
        doc,
        pages,
        selected: BTreeSet::new(),
    })
}

/// Result of a split: per-page downloads plus a page selection.
pub struct SplitSession {
    source_name: String,
    doc: Document,
    pages: Vec<ConvertedFile>,
    selected: BTreeSet<usize>,
}

impl SplitSession {
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Single-page document for 0-based page `index`.
    pub fn page(&self, index: usize) -> Option<&ConvertedFile> {
        self.pages.get(index)
    }

    pub fn pages(&self) -> &[ConvertedFile] {
        &self.pages
    }

    /// Flip the selection of 0-based page `index`; returns the new state.
    pub fn toggle(&mut self, index: usize) -> Result<bool, ConvertError> {
        if index >= self.pages.len() {
            return Err(ConvertError::Validation(format!(
                "page {} does not exist (document has {} pages)",
                index + 1,
                self.pages.len()
            )));
        }
        if self.selected.remove(&index) {
            Ok(false)
        } else {
            self.selected.insert(index);
            Ok(true)
        }
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Selected 0-based indices, ascending.
    pub fn selected(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// One document holding the selected pages in ascending page order,
    /// whatever order they were toggled in.
    pub fn combine_selected(&self) -> Result<ConvertedFile, ConvertError> {
        if self.selected.is_empty() {
            return Err(ConvertError::Validation("no pages selected".into()));
        }
        let keep: Vec<u32> = self.selected.iter().map(|&i| i as u32 + 1).collect();
        let bytes = extract_pages(&self.doc, &keep)?;
        info!("Combined {} selected pages", keep.len());
        Ok(pdf_output(SELECTED_NAME, bytes, keep.len()))
    }
}

impl std::fmt::Debug for SplitSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplitSession")
            .field("source_name", &self.source_name)
            .field("pages", &self.pages.len())
            .field("selected", &self.selected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::tests::{page_texts, sample_pdf};

    fn session(pages: usize) -> SplitSession {
        split_pdf(&SourceFile::new("book.pdf", sample_pdf(pages, "P")), &ProgressReporter::silent()).unwrap()
    }

    #[test]
    fn one_document_per_page() {
        let progress = ProgressReporter::silent();
        let s = split_pdf(&SourceFile::new("book.pdf", sample_pdf(3, "P")), &progress).unwrap();
        assert_eq!(s.page_count(), 3);
        assert_eq!(progress.current(), 100);
        for i in 0..3 {
            let page = s.page(i).unwrap();
            assert_eq!(page.file_name, format!("page_{}.pdf", i + 1));
            assert_eq!(page_texts(&page.bytes), vec![format!("P {}", i + 1)]);
        }
        assert!(s.page(3).is_none());
    }

    #[test]
    fn split_is_deterministic() {
        let a = session(2);
        let b = session(2);
        assert_eq!(a.page(1).unwrap().bytes, b.page(1).unwrap().bytes);
    }

    #[test]
    fn combine_uses_ascending_order() {
        let mut s = session(4);
        assert!(s.toggle(3).unwrap());
        assert!(s.toggle(0).unwrap());
        assert!(s.toggle(2).unwrap());
        assert!(!s.toggle(2).unwrap());
        assert_eq!(s.selected(), vec![0, 3]);

        let combined = s.combine_selected().unwrap();
        assert_eq!(combined.file_name, "selected_pages.pdf");
        assert_eq!(page_texts(&combined.bytes), vec!["P 1", "P 4"]);
    }

    #[test]
    fn empty_selection_is_validation() {
        let s = session(2);
        assert!(matches!(s.combine_selected(), Err(ConvertError::Validation(_))));
    }

    #[test]
    fn toggle_out_of_range() {
        let mut s = session(1);
        assert!(s.toggle(1).is_err());
        assert!(!s.is_selected(1));
    }
}
