//! File selection and loading.
//!
//! [`IngestZone`] plays the part of a drop zone / file picker: one file per
//! selection event, the newest selection replaces the previous one, and the
//! accept list is only advisory. Loading reads the bytes in 64 KiB chunks
//! and reports transfer progress.

use crate::error::ConvertError;
use crate::format::{file_stem, Format};
use crate::progress::ProgressReporter;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

const READ_CHUNK: usize = 64 * 1024;

/// Fallback MIME type for names without a known extension.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A binary blob with a file name and MIME type.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// Wrap `bytes`, inferring the MIME type from the name's extension.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = Format::from_path(&name)
            .map(|f| f.descriptor().mime_type)
            .unwrap_or(OCTET_STREAM)
            .to_string();
        Self {
            name,
            mime_type,
            bytes,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Read a file from disk, reporting progress as bytes arrive.
    pub async fn read(path: impl AsRef<Path>, progress: &ProgressReporter) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| ConvertError::from_read(path, e))?;
        let total = file
            .metadata()
            .await
            .map_err(|e| ConvertError::from_read(path, e))?
            .len() as usize;

        let mut bytes = Vec::with_capacity(total);
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let n = file
                .read(&mut chunk)
                .await
                .map_err(|e| ConvertError::from_read(path, e))?;
            if n == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..n]);
            progress.report_scaled(0, 100, bytes.len().min(total), total);
        }
        progress.report(100);

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Read '{}' ({} bytes)", name, bytes.len());
        Ok(Self::new(name, bytes))
    }

    /// Name without its final extension.
    pub fn stem(&self) -> &str {
        file_stem(&self.name)
    }

    /// Format implied by the file name, if any.
    pub fn format(&self) -> Option<Format> {
        Format::from_path(&self.name)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

type SelectCallback = Box<dyn FnMut(&Path) + Send>;

/// Single-file selection point for one source format.
pub struct IngestZone {
    accept: Format,
    selected: Option<PathBuf>,
    on_select: Option<SelectCallback>,
}

impl IngestZone {
    pub fn new(accept: Format) -> Self {
        Self {
            accept,
            selected: None,
            on_select: None,
        }
    }

    /// Register the callback invoked once per successful selection.
    pub fn on_select(mut self, callback: impl FnMut(&Path) + Send + 'static) -> Self {
        self.on_select = Some(Box::new(callback));
        self
    }

    /// Files dropped onto the zone. Only the first path is taken; an empty
    /// drop changes nothing.
    pub fn select_dropped(&mut self, paths: &[PathBuf]) -> Option<&Path> {
        let first = paths.first()?.clone();
        if paths.len() > 1 {
            debug!("{} files dropped, keeping '{}'", paths.len(), first.display());
        }
        self.select(first)
    }

    /// Result of a file picker. `None` (dialog dismissed) changes nothing.
    pub fn select_browsed(&mut self, path: Option<PathBuf>) -> Option<&Path> {
        self.select(path?)
    }

    fn select(&mut self, path: PathBuf) -> Option<&Path> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !self.accepts(&name) {
            debug!("'{}' is outside the {} accept list", name, self.accept);
        }
        info!("Selected '{}'", path.display());
        if let Some(cb) = self.on_select.as_mut() {
            cb(&path);
        }
        self.selected = Some(path);
        self.selected.as_deref()
    }

    /// Whether `file_name` matches the accept list. Advisory only.
    pub fn accepts(&self, file_name: &str) -> bool {
        self.accept.accepts_name(file_name)
    }

    pub fn accept(&self) -> Format {
        self.accept
    }

    pub fn selected(&self) -> Option<&Path> {
        self.selected.as_deref()
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Read the selected file, if there is one.
    pub async fn load(&self, progress: &ProgressReporter) -> Result<Option<SourceFile>, ConvertError> {
        match self.selected {
            Some(ref path) => SourceFile::read(path, progress).await.map(Some),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for IngestZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestZone")
            .field("accept", &self.accept)
            .field("selected", &self.selected)
            .field("on_select", &self.on_select.as_ref().map(|_| "<callback>"))
            .finish()
    }
}
