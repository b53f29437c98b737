//! Per-pair converters.
//!
//! Every converter is a synchronous function over an in-memory
//! [`SourceFile`]; [`crate::convert`] runs them on the blocking pool. They
//! report progress through the shared [`ProgressReporter`] at the
//! checkpoints documented on each function, and leave the final 100 % to
//! the caller once the result is in hand.

pub mod pdf;
pub mod raster;
pub mod sheet;
pub mod word;

use crate::error::ConvertError;
use crate::format::{download_extension, output_file_name, Format, ZIP_MIME};
use crate::ingest::SourceFile;
use crate::output::{ConversionStats, ConvertedFile};

/// Package converter output under the download name for `from` → `to`.
pub(crate) fn converted(
    source: &SourceFile,
    from: Format,
    to: Format,
    bytes: Vec<u8>,
    stats: ConversionStats,
) -> ConvertedFile {
    let mime_type = if download_extension(from, to) == "zip" {
        ZIP_MIME
    } else {
        to.descriptor().mime_type
    };
    ConvertedFile {
        file_name: output_file_name(&source.name, from, to),
        mime_type: mime_type.to_string(),
        bytes,
        stats,
    }
}

/// An `Encode` error when a converter finished with nothing to hand back.
pub(crate) fn require_content(bytes: Vec<u8>, to: Format, what: &str) -> Result<Vec<u8>, ConvertError> {
    if bytes.is_empty() {
        return Err(ConvertError::encode(to, format!("{what} produced no content")));
    }
    Ok(bytes)
}
