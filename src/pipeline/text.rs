//! PDF text extraction.
//!
//! Each page's text items are joined with single spaces; layout, columns
//! and line breaks inside a page are not reconstructed.

use lopdf::Document;
use tracing::debug;

/// Parse a PDF held in memory.
pub fn load_pdf(bytes: &[u8]) -> Result<Document, lopdf::Error> {
    let doc = Document::load_mem(bytes)?;
    debug!("PDF parsed: {} pages", doc.get_pages().len());
    Ok(doc)
}

/// 1-based page numbers in document order.
pub fn page_numbers(doc: &Document) -> Vec<u32> {
    doc.get_pages().keys().copied().collect()
}

/// Text of one page, whitespace runs collapsed to single spaces.
pub fn page_text(doc: &Document, page_no: u32) -> Result<String, lopdf::Error> {
    let raw = doc.extract_text(&[page_no])?;
    Ok(collapse_whitespace(&raw))
}

pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::tests::sample_pdf;

    #[test]
    fn extracts_each_page() {
        let doc = load_pdf(&sample_pdf(3, "Hello page")).unwrap();
        let pages = page_numbers(&doc);
        assert_eq!(pages, vec![1, 2, 3]);
        assert_eq!(page_text(&doc, 2).unwrap(), "Hello page 2");
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(collapse_whitespace("  a \n\n b\tc  "), "a b c");
        assert_eq!(collapse_whitespace("\n"), "");
    }

    #[test]
    fn rejects_non_pdf() {
        assert!(load_pdf(b"plain text").is_err());
    }
}
