//! Error types for the filedesk library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`] is **fatal**: the job cannot produce a result at all
//!   (unsupported pair, undecodable input, failed serialisation, merge with
//!   too few files). Returned as `Err(ConvertError)` from every converter and
//!   page operation. No partial output accompanies it.
//!
//! * [`BlockError`] is **non-fatal**: one content block of a Word document
//!   could not be laid out. The Word→PDF converter logs it, skips the block
//!   and counts it in [`crate::output::ConversionStats::skipped_items`]; every
//!   other converter treats any failure as fatal.

use crate::format::Format;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the filedesk library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Dispatch errors ───────────────────────────────────────────────────
    /// No converter is registered for the requested `(from, to)` pair.
    #[error("Conversion from {from} to {to} is not supported.")]
    UnsupportedConversion { from: Format, to: Format },

    // ── Content errors ────────────────────────────────────────────────────
    /// Source bytes could not be parsed as the claimed format.
    #[error("Could not read {format} input: {detail}")]
    Decode { format: Format, detail: String },

    /// Target serialisation failed or produced an empty/invalid result.
    #[error("Could not produce {format} output: {detail}")]
    Encode { format: Format, detail: String },

    /// A precondition was not met; no work was started.
    #[error("{0}")]
    Validation(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The settings file could not be read or written.
    #[error("Settings error: {0}")]
    Settings(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library (needed for PDF→image only).
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Rendering PDF pages to images needs the pdfium shared library.\n\
  • Set PDFIUM_LIB_PATH=/path/to/dir/containing/libpdfium, or\n\
  • install libpdfium somewhere on the system library path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    pub(crate) fn decode(format: Format, detail: impl std::fmt::Display) -> Self {
        ConvertError::Decode {
            format,
            detail: detail.to_string(),
        }
    }

    pub(crate) fn encode(format: Format, detail: impl std::fmt::Display) -> Self {
        ConvertError::Encode {
            format,
            detail: detail.to_string(),
        }
    }

    /// Map an I/O error on an input path to the matching variant.
    pub(crate) fn from_read(path: &std::path::Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ConvertError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ConvertError::Internal(format!("reading '{}': {err}", path.display())),
        }
    }

    /// Short machine-friendly kind, used by the CLI and job snapshots.
    pub fn kind(&self) -> &'static str {
        match self {
            ConvertError::UnsupportedConversion { .. } => "unsupported",
            ConvertError::Decode { .. } => "decode",
            ConvertError::Encode { .. } => "encode",
            ConvertError::Validation(_) => "validation",
            ConvertError::FileNotFound { .. }
            | ConvertError::PermissionDenied { .. }
            | ConvertError::OutputWriteFailed { .. } => "io",
            ConvertError::InvalidConfig(_) | ConvertError::Settings(_) => "config",
            ConvertError::PdfiumBindingFailed(_) => "pdfium",
            ConvertError::Internal(_) => "internal",
        }
    }
}

/// A non-fatal error for a single Word→PDF content block.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum BlockError {
    /// None of the block's characters can be drawn with the standard fonts.
    #[error("Block {index}: no drawable characters in {preview:?}")]
    Undrawable { index: usize, preview: String },

    /// The block's font size is not a finite number.
    #[error("Block {index}: invalid font size {size}")]
    InvalidFontSize { index: usize, size: f32 },
}
