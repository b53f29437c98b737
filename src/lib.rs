//! # filedesk
//!
//! Local file conversion and PDF page tools: PDF ⇄ Word, PDF → text or page
//! images, Word/text/images → PDF, delimited text/JSON ⇄ Excel, and
//! merging or splitting PDFs.
//!
//! Everything runs in-process on bytes you hand it. Nothing is uploaded,
//! and the only native dependency is pdfium, which is needed for PDF →
//! image rendering alone.
//!
//! ## Pipeline Overview
//!
//! ```text
//! SourceFile (name, MIME, bytes)
//!  │
//!  ├─ 1. Ingest    pick a file, check it against the accepted MIME types
//!  ├─ 2. Dispatch  (from, to) → Converter, or UnsupportedConversion
//!  ├─ 3. Convert   CPU-bound converter on spawn_blocking, progress 5 → 100
//!  │                 pdf → images   pdfium render + ZIP
//!  │                 pdf → text     lopdf text extraction
//!  │                 word → pdf     DOCX blocks → layout → PDF writer
//!  │                 text ⇄ excel   grid parse / rust_xlsxwriter / calamine
//!  └─ 4. Output    ConvertedFile (download name, MIME, bytes, stats)
//! ```
//!
//! Page tools ([`pages`]) take one or more PDFs and rebuild the page tree:
//! [`merge`](fn@pages::merge) concatenates, [`split`](fn@pages::split) yields one
//! document per page plus a selection that can be recombined.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use filedesk::{convert_file, write_output, ConversionConfig, Format};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert_file("report.docx", None, Format::Pdf, &config).await?;
//!     write_output(&output, &output.file_name).await?;
//!     eprintln!("{} ({} pages, {}ms)", output.file_name, output.stats.pages, output.stats.duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `filedesk` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! filedesk = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod converters;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod ingest;
pub mod job;
pub mod output;
pub mod pages;
pub mod pipeline;
pub mod progress;
pub mod settings;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, PageLayout};
pub use convert::{convert, convert_file, convert_sync, convert_to_file, inspect, write_output};
pub use dispatch::Converter;
pub use error::{BlockError, ConvertError};
pub use format::{Format, FormatDescriptor};
pub use ingest::{IngestZone, SourceFile};
pub use job::{ConversionJob, JobStatus, JobToken};
pub use output::{ConversionStats, ConvertedFile, FileInfo};
pub use pages::{merge, merge_pdfs, split, split_pdf, MergeQueue, QueuedPdf, SplitSession};
pub use pipeline::render::{PageImage, PageRasterizer, PdfiumRasterizer};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, ProgressReporter};
pub use settings::{Accent, Settings, SettingsStore, Theme};
pub use stream::{convert_stream, ConversionEvent, ConversionEventStream};
