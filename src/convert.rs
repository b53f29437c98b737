//! Eager conversion entry points.
//!
//! [`convert`] resolves the converter for a `(from, to)` pair, runs it on
//! the blocking pool and returns the finished [`ConvertedFile`]. Use
//! [`crate::stream::convert_stream`] instead to receive progress as a
//! stream of events.

use crate::config::ConversionConfig;
use crate::dispatch::Converter;
use crate::error::ConvertError;
use crate::format::Format;
use crate::ingest::SourceFile;
use crate::output::{ConversionStats, ConvertedFile, FileInfo};
use crate::pipeline::{sheet, text};
use crate::progress::ProgressReporter;
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Progress reported as soon as a supported conversion starts.
const STARTED_PERCENT: u32 = 5;

/// Convert an in-memory file from `from` to `to`.
///
/// An unsupported pair fails immediately with
/// [`ConvertError::UnsupportedConversion`], before any progress event.
///
/// # Example
/// ```rust,no_run
/// use filedesk::{convert, ConversionConfig, Format, SourceFile};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = SourceFile::new("photo.png", std::fs::read("photo.png")?);
/// let out = convert(&source, Format::Png, Format::Jpg, &ConversionConfig::default()).await?;
/// std::fs::write(&out.file_name, &out.bytes)?;
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    source: &SourceFile,
    from: Format,
    to: Format,
    config: &ConversionConfig,
) -> Result<ConvertedFile, ConvertError> {
    let progress = ProgressReporter::new(config.progress_callback.clone());
    convert_with_progress(source, from, to, config, &progress).await
}

pub(crate) async fn convert_with_progress(
    source: &SourceFile,
    from: Format,
    to: Format,
    config: &ConversionConfig,
    progress: &ProgressReporter,
) -> Result<ConvertedFile, ConvertError> {
    let converter = Converter::resolve(from, to)?;
    let start = Instant::now();
    info!(
        "Converting '{}' ({} bytes): {} → {} via {:?}",
        source.name,
        source.len(),
        from,
        to,
        converter
    );
    progress.start(&format!("{from} → {to}"));
    progress.report(STARTED_PERCENT);

    let task_source = source.clone();
    let task_config = config.clone();
    let task_progress = progress.clone();
    let joined = tokio::task::spawn_blocking(move || {
        converter.run(&task_source, from, to, &task_config, &task_progress)
    })
    .await;
    let result = match joined {
        Ok(r) => r,
        Err(e) => Err(ConvertError::Internal(format!("conversion task failed: {e}"))),
    };

    match result {
        Ok(mut out) => {
            out.stats.duration_ms = start.elapsed().as_millis() as u64;
            progress.finish(true);
            info!(
                "Converted '{}' → '{}' ({} bytes, {} pages, {}ms)",
                source.name,
                out.file_name,
                out.len(),
                out.stats.pages,
                out.stats.duration_ms
            );
            Ok(out)
        }
        Err(e) => {
            progress.finish(false);
            warn!("Conversion of '{}' failed: {}", source.name, e);
            Err(e)
        }
    }
}

/// Read `input` from disk and convert it.
///
/// `from` defaults to the format implied by the file extension.
pub async fn convert_file(
    input: impl AsRef<Path>,
    from: Option<Format>,
    to: Format,
    config: &ConversionConfig,
) -> Result<ConvertedFile, ConvertError> {
    let input = input.as_ref();
    let from = match from.or_else(|| Format::from_path(input)) {
        Some(f) => f,
        None => {
            return Err(ConvertError::Validation(format!(
                "cannot tell the format of '{}' from its extension",
                input.display()
            )))
        }
    };
    Converter::resolve(from, to)?;

    let source = SourceFile::read(input, &ProgressReporter::silent()).await?;
    convert(&source, from, to, config).await
}

/// Convert `input` and write the result to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    from: Option<Format>,
    to: Format,
    config: &ConversionConfig,
) -> Result<ConversionStats, ConvertError> {
    let output = convert_file(input, from, to, config).await?;
    write_output(&output, output_path).await?;
    Ok(output.stats)
}

/// Write a converted file to `path` atomically, creating parent directories.
pub async fn write_output(file: &ConvertedFile, path: impl AsRef<Path>) -> Result<(), ConvertError> {
    let path = path.as_ref();
    let write_err = |e: std::io::Error| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    tokio::fs::write(&tmp_path, &file.bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    debug!("Wrote {} bytes to {}", file.len(), path.display());
    Ok(())
}

/// Synchronous wrapper around [`convert`] that creates its own Tokio runtime.
///
/// Do not call from inside an existing runtime.
pub fn convert_sync(
    source: &SourceFile,
    from: Format,
    to: Format,
    config: &ConversionConfig,
) -> Result<ConvertedFile, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(source, from, to, config))
}

/// Describe a file without converting it: size, detected format, page or
/// sheet count, image dimensions.
pub async fn inspect(input: impl AsRef<Path>) -> Result<FileInfo, ConvertError> {
    let path = input.as_ref().to_path_buf();
    let source = SourceFile::read(&path, &ProgressReporter::silent()).await?;
    tokio::task::spawn_blocking(move || describe(&source))
        .await
        .map_err(|e| ConvertError::Internal(format!("inspect task failed: {e}")))?
}

fn describe(source: &SourceFile) -> Result<FileInfo, ConvertError> {
    let format = source.format();
    let mut info = FileInfo {
        file_name: source.name.clone(),
        size_bytes: source.len() as u64,
        format,
        parts: None,
        dimensions: None,
    };

    match format {
        Some(Format::Pdf) => {
            let doc = text::load_pdf(&source.bytes).map_err(|e| ConvertError::decode(Format::Pdf, e))?;
            info.parts = Some(doc.get_pages().len());
        }
        Some(Format::Excel) => {
            let sheets = sheet::sheet_count(&source.bytes).map_err(|e| ConvertError::decode(Format::Excel, e))?;
            info.parts = Some(sheets);
        }
        Some(f @ (Format::Jpg | Format::Png)) => {
            let dims = image::ImageReader::new(Cursor::new(&source.bytes))
                .with_guessed_format()
                .map_err(|e| ConvertError::decode(f, e))?
                .into_dimensions()
                .map_err(|e| ConvertError::decode(f, e))?;
            info.dimensions = Some(dims);
        }
        _ => {}
    }
    Ok(info)
}
