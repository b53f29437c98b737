//! DOCX container reading and writing.
//!
//! Reading walks `word/document.xml` with roxmltree and renders the body as
//! a small HTML fragment: `Title`/`HeadingN` paragraphs become `<hN>`, other
//! paragraphs `<p>`, bold runs `<strong>`, italic runs `<em>`, breaks
//! `<br />`. Table cells contribute their paragraphs in document order.
//!
//! Writing produces the smallest package Word accepts: content types, the
//! package relationship and a document part with one `<w:p>` per paragraph.

use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const DOCUMENT_PART: &str = "word/document.xml";

/// Failure reading or writing a DOCX package.
#[derive(Debug, thiserror::Error)]
pub enum DocxError {
    #[error("not a DOCX package: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("word/document.xml: {0}")]
    Io(#[from] std::io::Error),
    #[error("word/document.xml is not well-formed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("word/document.xml has no w:body")]
    MissingBody,
}

/// Document content extracted from a DOCX.
#[derive(Debug, Clone, PartialEq)]
pub struct DocxContent {
    /// Body rendered as an HTML fragment.
    pub html: String,
    /// Plain text: paragraphs separated by blank lines.
    pub raw_text: String,
}

/// Read a DOCX package into HTML and plain text.
pub fn read_docx(bytes: &[u8]) -> Result<DocxContent, DocxError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;

    let doc = roxmltree::Document::parse(&xml)?;
    let body = doc
        .descendants()
        .find(|n| is_w(n, "body"))
        .ok_or(DocxError::MissingBody)?;

    let mut html = String::new();
    let mut raw = Vec::new();
    for p in body.descendants().filter(|n| is_w(n, "p")) {
        let para = Paragraph::from_node(p);
        raw.push(para.plain_text());
        html.push_str(&para.to_html());
    }

    Ok(DocxContent {
        html,
        raw_text: raw.join("\n\n"),
    })
}

struct Run {
    text: String,
    bold: bool,
    italic: bool,
}

struct Paragraph {
    heading: Option<u8>,
    runs: Vec<Run>,
}

impl Paragraph {
    fn from_node(p: roxmltree::Node<'_, '_>) -> Self {
        let heading = p
            .children()
            .find(|n| is_w(n, "pPr"))
            .and_then(|ppr| ppr.children().find(|n| is_w(n, "pStyle")))
            .and_then(|style| style.attribute((W_NS, "val")))
            .and_then(heading_level);

        let runs = p
            .descendants()
            .filter(|n| is_w(n, "r"))
            // Runs of a nested paragraph (text boxes) belong to that paragraph.
            .filter(|r| r.ancestors().find(|a| is_w(a, "p")) == Some(p))
            .map(|r| {
                let rpr = r.children().find(|n| is_w(n, "rPr"));
                let flag = |name: &str| {
                    rpr.and_then(|rpr| rpr.children().find(|n| is_w(n, name)))
                        .map(|n| !matches!(n.attribute((W_NS, "val")), Some("0" | "false" | "none")))
                        .unwrap_or(false)
                };
                let mut text = String::new();
                for child in r.children() {
                    match child.tag_name().name() {
                        "t" if is_w(&child, "t") => text.push_str(child.text().unwrap_or("")),
                        "tab" if is_w(&child, "tab") => text.push('\t'),
                        "br" | "cr" => text.push('\n'),
                        _ => {}
                    }
                }
                Run {
                    text,
                    bold: flag("b"),
                    italic: flag("i"),
                }
            })
            .collect();

        Self { heading, runs }
    }

    fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    fn to_html(&self) -> String {
        let mut inner = String::new();
        for run in self.runs.iter().filter(|r| !r.text.is_empty()) {
            let mut piece = escape_html(&run.text).replace('\n', "<br />");
            if run.italic {
                piece = format!("<em>{piece}</em>");
            }
            if run.bold {
                piece = format!("<strong>{piece}</strong>");
            }
            inner.push_str(&piece);
        }
        match self.heading {
            Some(level) => format!("<h{level}>{inner}</h{level}>"),
            None => format!("<p>{inner}</p>"),
        }
    }
}

fn is_w(node: &roxmltree::Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(W_NS)
}

/// `Title` → 1, `Heading3` / `heading 3` → 3.
fn heading_level(style: &str) -> Option<u8> {
    let s = style.to_ascii_lowercase().replace(' ', "");
    if s == "title" {
        return Some(1);
    }
    s.strip_prefix("heading")
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=6).contains(n))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn escape_xml(s: &str) -> String {
    escape_html(s).replace('\'', "&apos;")
}

// ── Writing ──────────────────────────────────────────────────────────────

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Write a single-section DOCX with one paragraph per entry.
pub fn write_docx(paragraphs: &[String]) -> Result<Vec<u8>, DocxError> {
    let mut body = String::new();
    for p in paragraphs {
        if p.is_empty() {
            body.push_str("<w:p/>");
        } else {
            body.push_str(&format!(
                r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                escape_xml(&strip_xml_invalid(p))
            ));
        }
    }
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}"><w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#
    );

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        (DOCUMENT_PART, document.as_str()),
    ] {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }
    Ok(zip.finish()?.into_inner())
}

/// XML 1.0 forbids most control characters even when escaped.
fn strip_xml_invalid(s: &str) -> String {
    s.chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || !c.is_control())
        .collect()
}
