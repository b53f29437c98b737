//! Merge PDFs into one document, and the ordered queue feeding it.
//!
//! The first document becomes the destination. Every later document has its
//! object ids shifted past the destination's `max_id`, its objects copied
//! in, and its pages appended to the destination's root `Pages` node.
//! Attributes a page inherited from its old page tree (resources, boxes,
//! rotation) are copied onto the page itself before it is re-parented.

use super::{load, pages_root, pdf_output, save, MERGED_NAME};
use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::format::Format;
use crate::ingest::SourceFile;
use crate::output::ConvertedFile;
use crate::progress::{scaled, ProgressReporter};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, info};

const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Page trees deeper than this are treated as cyclic.
const MAX_TREE_DEPTH: usize = 64;

/// Concatenate the pages of `files`, in order, into `merged.pdf`.
///
/// Progress: `round((i + 1) / n * 100)` after each source file.
pub fn merge_pdfs(files: &[SourceFile], progress: &ProgressReporter) -> Result<ConvertedFile, ConvertError> {
    if files.len() < 2 {
        return Err(ConvertError::Validation(
            "select at least two PDF files to merge".into(),
        ));
    }

    let total = files.len();
    let mut dest: Option<Document> = None;
    let mut page_refs: Vec<ObjectId> = Vec::new();

    for (i, file) in files.iter().enumerate() {
        let doc = load(file)?;
        debug!("Merging '{}' ({} pages)", file.name, doc.get_pages().len());
        match dest.as_mut() {
            None => {
                page_refs.extend(doc.get_pages().values().copied());
                dest = Some(doc);
            }
            Some(dest) => append_document(dest, doc, &mut page_refs),
        }
        progress.report(scaled(i + 1, total, 100));
        progress.page_complete(i + 1, total);
    }

    let mut dest = dest.ok_or_else(|| ConvertError::Internal("no document loaded".into()))?;
    rebuild_page_tree(&mut dest, &page_refs).map_err(|e| ConvertError::encode(Format::Pdf, e))?;

    let pages = page_refs.len();
    let bytes = save(dest)?;
    info!("Merged {} files into {} pages ({} bytes)", total, pages, bytes.len());
    Ok(pdf_output(MERGED_NAME, bytes, pages))
}

fn append_document(dest: &mut Document, source: Document, page_refs: &mut Vec<ObjectId>) {
    let offset = dest.max_id;
    let source_pages: Vec<ObjectId> = source.get_pages().values().copied().collect();

    for (id, object) in source.objects {
        dest.objects.insert((id.0 + offset, id.1), remap_refs(object, offset));
    }
    page_refs.extend(source_pages.into_iter().map(|id| (id.0 + offset, id.1)));
    dest.max_id = dest.max_id.max(source.max_id + offset);
}

fn remap_refs(object: Object, offset: u32) -> Object {
    match object {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(items) => Object::Array(items.into_iter().map(|o| remap_refs(o, offset)).collect()),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Hang every page in `page_refs` directly off the destination's root.
fn rebuild_page_tree(doc: &mut Document, page_refs: &[ObjectId]) -> Result<(), lopdf::Error> {
    let root = pages_root(doc)?;
    for &page in page_refs {
        adopt_page(doc, page, root)?;
    }

    let pages = doc.get_dictionary_mut(root)?;
    pages.set(
        "Kids",
        Object::Array(page_refs.iter().map(|&id| Object::Reference(id)).collect()),
    );
    pages.set("Count", Object::Integer(page_refs.len() as i64));
    Ok(())
}

fn adopt_page(doc: &mut Document, page: ObjectId, new_parent: ObjectId) -> Result<(), lopdf::Error> {
    let mut inherited: Vec<(&[u8], Object)> = Vec::new();
    {
        let dict = doc.get_dictionary(page)?;
        let mut missing: Vec<&[u8]> = INHERITABLE.into_iter().filter(|key| !dict.has(key)).collect();
        let mut parent = dict.get(b"Parent").and_then(Object::as_reference).ok();

        for _ in 0..MAX_TREE_DEPTH {
            let Some(node_id) = parent else { break };
            if missing.is_empty() {
                break;
            }
            let node = doc.get_dictionary(node_id)?;
            missing.retain(|&key| match node.get(key) {
                Ok(value) => {
                    inherited.push((key, value.clone()));
                    false
                }
                Err(_) => true,
            });
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        }
    }

    let dict = doc.get_dictionary_mut(page)?;
    for (key, value) in inherited {
        dict.set(key, value);
    }
    dict.set("Parent", Object::Reference(new_parent));
    Ok(())
}

/// A source file waiting to be merged.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedPdf {
    pub file: SourceFile,
    /// Name shown to the user; the file itself may be renamed on the way in.
    pub original_name: String,
}

/// Ordered list of PDFs to merge.
#[derive(Debug, Default, Clone)]
pub struct MergeQueue {
    items: Vec<QueuedPdf>,
}

impl MergeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: SourceFile) {
        let original_name = file.name.clone();
        self.items.push(QueuedPdf { file, original_name });
    }

    /// Swap entry `index` with the one before it. No-op at the top.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.items.len() {
            return false;
        }
        self.items.swap(index - 1, index);
        true
    }

    /// Swap entry `index` with the one after it. No-op at the bottom.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.items.len() {
            return false;
        }
        self.items.swap(index, index + 1);
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<QueuedPdf> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[QueuedPdf] {
        &self.items
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|q| q.original_name.as_str()).collect()
    }

    /// Merge the queue in its current order. The queue is emptied only
    /// when the merge succeeds.
    pub async fn merge(&mut self, config: &ConversionConfig) -> Result<ConvertedFile, ConvertError> {
        let files: Vec<SourceFile> = self.items.iter().map(|q| q.file.clone()).collect();
        let merged = super::merge(files, config).await?;
        self.items.clear();
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::tests::{page_texts, sample_pdf};

    fn file(name: &str, pages: usize, label: &str) -> SourceFile {
        SourceFile::new(name, sample_pdf(pages, label))
    }

    #[test]
    fn pages_keep_source_order() {
        let progress = ProgressReporter::silent();
        let merged = merge_pdfs(&[file("a.pdf", 2, "A"), file("b.pdf", 3, "B")], &progress).unwrap();
        assert_eq!(merged.file_name, "merged.pdf");
        assert_eq!(merged.stats.pages, 5);
        assert_eq!(page_texts(&merged.bytes), vec!["A 1", "A 2", "B 1", "B 2", "B 3"]);
        assert_eq!(progress.current(), 100);
    }

    #[test]
    fn fewer_than_two_is_validation() {
        let err = merge_pdfs(&[file("a.pdf", 1, "A")], &ProgressReporter::silent()).unwrap_err();
        assert!(matches!(err, ConvertError::Validation(_)));
    }

    #[test]
    fn invalid_source_is_decode_error() {
        let bad = SourceFile::new("bad.pdf", b"nope".to_vec());
        let err = merge_pdfs(&[file("a.pdf", 1, "A"), bad], &ProgressReporter::silent()).unwrap_err();
        assert!(matches!(err, ConvertError::Decode { .. }));
        assert!(err.to_string().contains("bad.pdf"));
    }

    #[test]
    fn appended_pages_carry_inherited_attributes() {
        let merged = merge_pdfs(&[file("a.pdf", 1, "A"), file("b.pdf", 1, "B")], &ProgressReporter::silent())
            .unwrap();
        let doc = Document::load_mem(&merged.bytes).unwrap();
        let root = pages_root(&doc).unwrap();
        for (_, page_id) in doc.get_pages() {
            let page = doc.get_dictionary(page_id).unwrap();
            assert_eq!(page.get(b"Parent").unwrap().as_reference().unwrap(), root);
        }
        let second = doc.get_pages()[&2];
        assert!(doc.get_dictionary(second).unwrap().has(b"MediaBox"));
    }

    #[test]
    fn queue_reordering() {
        let mut q = MergeQueue::new();
        q.push(file("a.pdf", 1, "A"));
        q.push(file("b.pdf", 1, "B"));
        q.push(file("c.pdf", 1, "C"));

        assert!(!q.move_up(0));
        assert!(q.move_up(2));
        assert_eq!(q.names(), vec!["a.pdf", "c.pdf", "b.pdf"]);
        assert!(!q.move_down(2));
        assert!(q.move_down(0));
        assert_eq!(q.names(), vec!["c.pdf", "a.pdf", "b.pdf"]);
        assert_eq!(q.remove(1).unwrap().original_name, "a.pdf");
        assert!(q.remove(5).is_none());
        assert_eq!(q.len(), 2);
    }

    #[tokio::test]
    async fn queue_clears_only_on_success() {
        let config = ConversionConfig::default();
        let mut q = MergeQueue::new();
        q.push(file("a.pdf", 1, "A"));
        assert!(q.merge(&config).await.is_err());
        assert_eq!(q.len(), 1);

        q.push(file("b.pdf", 1, "B"));
        let merged = q.merge(&config).await.unwrap();
        assert_eq!(page_texts(&merged.bytes), vec!["A 1", "B 1"]);
        assert!(q.is_empty());
    }
}
