//! Flowing text layout: word-wrap content blocks and paginate them.
//!
//! Lines are measured with the Helvetica metrics in [`super::fonts`]. A word
//! wider than the printable width is broken at character boundaries against
//! the same measurement. If a paragraph contains a character without metrics
//! the paragraph is wrapped with a fixed characters-per-line estimate
//! (`width / (size * 0.6)`) instead.

use super::fonts::{is_drawable, text_width, FontVariant, MissingGlyph};
use super::pdf_writer::{PageCanvas, PdfWriter};
use crate::config::PageLayout;
use crate::error::BlockError;
use tracing::{debug, warn};

/// One styled run of text, the unit of layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedBlock {
    pub text: String,
    /// Heading level 1–6, if the block is a heading.
    pub heading: Option<u8>,
    pub bold: bool,
    pub italic: bool,
    pub font_size: f32,
}

impl FormattedBlock {
    pub fn plain(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            text: text.into(),
            heading: None,
            bold: false,
            italic: false,
            font_size,
        }
    }

    pub fn font(&self) -> FontVariant {
        FontVariant::select(self.bold, self.italic)
    }
}

/// What [`layout_blocks`] did.
#[derive(Debug, Default)]
pub struct LayoutOutcome {
    pub pages: usize,
    pub skipped: Vec<BlockError>,
}

/// Lay out `blocks` top to bottom, adding pages to `writer` as they fill.
///
/// A block that cannot be drawn is logged, recorded in the outcome and
/// skipped; the remaining blocks are still placed. `on_block` is called
/// with `(blocks_done, total)` after every block.
pub fn layout_blocks(
    blocks: &[FormattedBlock],
    layout: &PageLayout,
    writer: &mut PdfWriter,
    mut on_block: impl FnMut(usize, usize),
) -> Result<LayoutOutcome, lopdf::Error> {
    let mut cursor = Cursor::new(layout);
    let mut outcome = LayoutOutcome::default();
    let total = blocks.len();

    for (index, block) in blocks.iter().enumerate() {
        match check_block(index, block) {
            Ok(()) => cursor.place(block, writer)?,
            Err(e) => {
                warn!("Skipping content block: {}", e);
                outcome.skipped.push(e);
            }
        }
        on_block(index + 1, total);
    }

    cursor.flush(writer)?;
    outcome.pages = writer.page_count();
    debug!(
        "Laid out {} blocks on {} pages ({} skipped)",
        total,
        outcome.pages,
        outcome.skipped.len()
    );
    Ok(outcome)
}

fn check_block(index: usize, block: &FormattedBlock) -> Result<(), BlockError> {
    if !block.font_size.is_finite() {
        return Err(BlockError::InvalidFontSize {
            index,
            size: block.font_size,
        });
    }
    let mut visible = block.text.chars().filter(|c| !c.is_whitespace()).peekable();
    if visible.peek().is_some() && !block.text.chars().any(|c| !c.is_whitespace() && is_drawable(c)) {
        return Err(BlockError::Undrawable {
            index,
            preview: block.text.chars().take(40).collect(),
        });
    }
    Ok(())
}

/// Vertical position on the current page.
struct Cursor<'a> {
    layout: &'a PageLayout,
    canvas: PageCanvas,
    y: f32,
}

impl<'a> Cursor<'a> {
    fn new(layout: &'a PageLayout) -> Self {
        Self {
            layout,
            canvas: PageCanvas::new(),
            y: layout.height - layout.margin,
        }
    }

    fn top(&self) -> f32 {
        self.layout.height - self.layout.margin
    }

    fn place(&mut self, block: &FormattedBlock, writer: &mut PdfWriter) -> Result<(), lopdf::Error> {
        let size = block.font_size.clamp(8.0, 72.0);
        let is_heading = block.heading.is_some();
        let line_height = (size * 1.2).max(if is_heading {
            size * 1.5
        } else {
            self.layout.line_height
        });

        if is_heading && self.y < self.top() {
            self.y -= line_height * 0.5;
        }

        let font = block.font();
        let lines = wrap_text(&block.text, font, size, self.layout.printable_width());
        for line in lines {
            if line.is_empty() {
                self.y -= line_height * 0.5;
                continue;
            }
            if self.y - line_height < self.layout.margin {
                self.new_page(writer)?;
            }
            let y = self.y.clamp(self.layout.margin, self.top());
            self.canvas.text(self.layout.margin, y, font, size, &line);
            self.y -= line_height;
        }

        if is_heading || block.text.chars().count() > 100 {
            self.y -= line_height * 0.3;
        }
        Ok(())
    }

    fn new_page(&mut self, writer: &mut PdfWriter) -> Result<(), lopdf::Error> {
        writer.add_page(std::mem::take(&mut self.canvas))?;
        self.y = self.top();
        Ok(())
    }

    fn flush(&mut self, writer: &mut PdfWriter) -> Result<(), lopdf::Error> {
        if !self.canvas.is_empty() || writer.page_count() == 0 {
            writer.add_page(std::mem::take(&mut self.canvas))?;
        }
        Ok(())
    }
}

// ── Wrapping ─────────────────────────────────────────────────────────────

/// Split `text` into lines no wider than `max_width` points.
///
/// Each `\n`-separated paragraph wraps independently; a blank paragraph
/// yields an empty line.
pub fn wrap_text(text: &str, font: FontVariant, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        match wrap_measured(paragraph, font, size, max_width) {
            Ok(wrapped) => lines.extend(wrapped),
            Err(missing) => {
                debug!("Measurement failed ({}), wrapping by character count", missing);
                let max_chars = ((max_width / (size * 0.6)).floor() as usize).max(1);
                lines.extend(wrap_by_chars(paragraph, max_chars));
            }
        }
    }
    lines
}

fn wrap_measured(
    paragraph: &str,
    font: FontVariant,
    size: f32,
    max_width: f32,
) -> Result<Vec<String>, MissingGlyph> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in paragraph.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };
        if text_width(&candidate, font, size)? <= max_width {
            line = candidate;
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if text_width(word, font, size)? > max_width {
            let mut pieces = break_long_word(word, font, size, max_width)?;
            line = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
        } else {
            line = word.to_string();
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    Ok(lines)
}

/// Break one word into pieces that each fit `max_width`. A single glyph
/// wider than the column still gets its own piece.
fn break_long_word(
    word: &str,
    font: FontVariant,
    size: f32,
    max_width: f32,
) -> Result<Vec<String>, MissingGlyph> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if text_width(&current, font, size)? > max_width && current.chars().count() > 1 {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    Ok(pieces)
}

fn wrap_by_chars(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0usize;

    for word in paragraph.split_whitespace() {
        let word_len = word.chars().count();
        let needed = if line.is_empty() { word_len } else { line_len + 1 + word_len };
        if needed <= max_chars {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
            line_len = needed;
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
            line_len = 0;
        }
        let chars: Vec<char> = word.chars().collect();
        let mut chunks = chars.chunks(max_chars).map(|c| c.iter().collect::<String>()).peekable();
        while let Some(chunk) = chunks.next() {
            if chunks.peek().is_some() {
                lines.push(chunk);
            } else {
                line_len = chunk.chars().count();
                line = chunk;
            }
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
