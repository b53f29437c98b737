//! Block segmentation for Word→PDF.
//!
//! The DOCX reader ([`super::docx`]) renders the document as a small HTML
//! fragment. This stage cuts that fragment into [`FormattedBlock`]s on
//! block-level tags and classifies each one: `<hN>` → heading level N (bold,
//! `max(16 - N, 12)` pt), a block containing `<strong>` → bold, `<em>` →
//! italic. Text between recognised blocks is kept as plain blocks.
//!
//! Segmentation is deliberately shallow. Nested or malformed markup is
//! handled on a best-effort basis; only the heading/bold/italic outcome of
//! each block is relied upon downstream.

use super::layout::FormattedBlock;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static RE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<h[1-6][^>]*>.*?</h[1-6]>|<p[^>]*>.*?</p>|<strong>.*?</strong>|<em>.*?</em>")
        .unwrap()
});

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^<h([1-6])").unwrap());

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static RE_BR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

static RE_NUMERIC_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));").unwrap());

/// Cut an HTML fragment into classified blocks.
///
/// `base_size` is the font size of non-heading text. When no block carries
/// any text, the tag-stripped fragment becomes a single plain block.
pub fn segment_html(html: &str, base_size: f32) -> Vec<FormattedBlock> {
    let mut blocks = Vec::new();
    let mut last = 0;

    for m in RE_BLOCK.find_iter(html) {
        push_section(&html[last..m.start()], base_size, &mut blocks);
        push_section(m.as_str(), base_size, &mut blocks);
        last = m.end();
    }
    push_section(&html[last..], base_size, &mut blocks);

    if blocks.is_empty() {
        let text = html_to_text(html);
        if !text.is_empty() {
            blocks.push(FormattedBlock::plain(text, base_size));
        }
    }
    blocks
}

fn push_section(section: &str, base_size: f32, out: &mut Vec<FormattedBlock>) {
    if section.trim().is_empty() {
        return;
    }
    let text = html_to_text(section);
    if text.is_empty() {
        return;
    }

    let lower = section.to_ascii_lowercase();
    let heading = RE_HEADING
        .captures(section.trim_start())
        .and_then(|c| c[1].parse::<u8>().ok());

    out.push(match heading {
        Some(level) => FormattedBlock {
            text,
            heading: Some(level),
            bold: true,
            italic: lower.contains("<em>"),
            font_size: (16.0 - level as f32).max(12.0),
        },
        None => FormattedBlock {
            text,
            heading: None,
            bold: lower.contains("<strong>"),
            italic: lower.contains("<em>"),
            font_size: base_size,
        },
    });
}

/// Strip tags, decode entities and clean the result.
pub fn html_to_text(html: &str) -> String {
    let with_breaks = RE_BR.replace_all(html, "\n");
    let stripped = RE_TAG.replace_all(&with_breaks, "");
    clean_text(&decode_entities(&stripped))
}

/// Normalise extracted text for drawing with the standard fonts.
///
/// Drops NUL, converts CRLF/CR to LF and non-breaking spaces to spaces,
/// applies NFKD and removes the combining marks it splits off, then trims.
pub fn clean_text(text: &str) -> String {
    let normalised: String = text
        .replace('\0', "")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{00A0}', " ")
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    normalised.trim().to_string()
}

/// Decode the named entities an HTML serializer emits plus numeric references.
pub fn decode_entities(text: &str) -> String {
    let numeric = RE_NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (_, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    numeric
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{00A0}")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_paragraphs_and_emphasis() {
        let html = "<h1>Title</h1><p>Body text</p><p><strong>Loud</strong></p>\
                    <p><em>Soft</em></p><h3>Sub</h3>";
        let blocks = segment_html(html, 12.0);
        assert_eq!(blocks.len(), 5);

        assert_eq!(blocks[0].heading, Some(1));
        assert!(blocks[0].bold);
        assert_eq!(blocks[0].font_size, 15.0);

        assert_eq!(blocks[1].text, "Body text");
        assert!(!blocks[1].bold && !blocks[1].italic);
        assert_eq!(blocks[1].font_size, 12.0);

        assert!(blocks[2].bold && !blocks[2].italic);
        assert!(blocks[3].italic && !blocks[3].bold);

        assert_eq!(blocks[4].heading, Some(3));
        assert_eq!(blocks[4].font_size, 13.0);
    }

    #[test]
    fn deep_headings_floor_at_12pt() {
        let blocks = segment_html("<h6>Tiny</h6>", 11.0);
        assert_eq!(blocks[0].font_size, 12.0);
    }

    #[test]
    fn bold_italic_paragraph() {
        let blocks = segment_html("<p><strong><em>Both</em></strong></p>", 12.0);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].bold && blocks[0].italic);
    }

    #[test]
    fn stray_text_between_blocks_kept() {
        let blocks = segment_html("<p>a</p>loose<p>b</p>", 12.0);
        let texts: Vec<_> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "loose", "b"]);
    }

    #[test]
    fn empty_paragraphs_dropped() {
        assert!(segment_html("<p></p><p>   </p>", 12.0).is_empty());
    }

    #[test]
    fn entities_and_breaks() {
        let blocks = segment_html("<p>Fish &amp; chips &lt;3<br />next &#233;</p>", 12.0);
        assert_eq!(blocks[0].text, "Fish & chips <3\nnext e");
    }

    #[test]
    fn clean_text_rules() {
        assert_eq!(clean_text("  a\0b\r\nc\rd\u{00A0}e  "), "ab\nc\nd e");
        assert_eq!(clean_text("ﬁne café"), "fine cafe");
    }

    #[test]
    fn double_escaped_amp_decodes_once() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }
}
