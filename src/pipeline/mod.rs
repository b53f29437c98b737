//! Building blocks shared by the converters.
//!
//! Each submodule does one transformation and knows nothing about progress
//! reporting or dispatch; converters in [`crate::converters`] compose them.
//!
//! ## Data Flow
//!
//! ```text
//! DOCX ──▶ docx ──▶ blocks ──▶ layout ──▶ pdf_writer ──▶ PDF
//! (zip)   (HTML)   (FormattedBlock)  (fonts: AFM widths)
//!
//! PDF ──▶ render ──▶ encode ──▶ archive ──▶ ZIP
//!        (pdfium)   (jpg/png)
//!
//! PDF ──▶ text ──▶ docx / plain text
//! text/JSON ──▶ sheet ──▶ XLSX ──▶ sheet ──▶ CSV
//! ```
//!
//! 1. [`docx`]: read `word/document.xml` into an HTML fragment; write minimal DOCX
//! 2. [`blocks`]: segment that fragment into classified blocks, clean text
//! 3. [`layout`]: word-wrap and paginate blocks onto A4 pages
//! 4. [`fonts`]: standard-14 Helvetica metrics and WinAnsi encoding
//! 5. [`pdf_writer`]: assemble pages, fonts and images into a PDF with lopdf
//! 6. [`render`]: rasterise pages; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 7. [`encode`]: raster decode/encode (JPEG flattens alpha onto white)
//! 8. [`archive`]: bundle page images into a ZIP
//! 9. [`text`]: per-page PDF text extraction
//! 10. [`sheet`]: grid parsing, XLSX writing and first-sheet CSV

pub mod archive;
pub mod blocks;
pub mod docx;
pub mod encode;
pub mod fonts;
pub mod layout;
pub mod pdf_writer;
pub mod render;
pub mod sheet;
pub mod text;
