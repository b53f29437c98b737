//! Result types returned by conversions and page operations.

use crate::error::BlockError;
use serde::{Deserialize, Serialize};

/// A produced file: bytes plus the name and MIME type to save it under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedFile {
    /// Suggested download name, e.g. `report.docx` or `scan.zip`.
    pub file_name: String,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub stats: ConversionStats,
}

impl ConvertedFile {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Aggregate statistics for one job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages read or written, whichever the converter counts (0 for pure
    /// image or spreadsheet jobs).
    pub pages: usize,
    /// Word→PDF blocks that could not be drawn and were skipped.
    pub skipped_items: usize,
    /// Details of every skipped block.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<BlockError>,
    pub duration_ms: u64,
}

/// Summary of a file without converting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_name: String,
    pub size_bytes: u64,
    pub format: Option<crate::format::Format>,
    /// Page count for PDFs, sheet count for workbooks.
    pub parts: Option<usize>,
    /// Image dimensions in pixels.
    pub dimensions: Option<(u32, u32)>,
}
