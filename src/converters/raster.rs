//! Image → image and image → PDF.

use super::converted;
use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::format::Format;
use crate::ingest::SourceFile;
use crate::output::{ConversionStats, ConvertedFile};
use crate::pipeline::encode::{decode_image, encode_image, RasterFormat};
use crate::pipeline::pdf_writer::{DocumentInfo, PageCanvas, PdfWriter};
use crate::progress::ProgressReporter;
use tracing::debug;

/// A4 in points.
pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

/// Re-encode a JPG/PNG as the other raster format.
///
/// Progress: 50 once decoded, 80 once encoded.
pub fn image_to_image(
    source: &SourceFile,
    from: Format,
    to: Format,
    config: &ConversionConfig,
    progress: &ProgressReporter,
) -> Result<ConvertedFile, ConvertError> {
    let target = raster_format(to)?;
    let img = decode_image(&source.bytes).map_err(|e| ConvertError::decode(from, e))?;
    progress.report(50);

    let bytes = encode_image(&img, target, config.jpeg_quality).map_err(|e| ConvertError::encode(to, e))?;
    progress.report(80);

    Ok(converted(source, from, to, bytes, ConversionStats::default()))
}

/// Place one image, centred and shrunk to fit if needed, on a single A4 page.
///
/// Pixels are treated as points; images smaller than the page keep their size.
pub fn image_to_pdf(
    source: &SourceFile,
    from: Format,
    progress: &ProgressReporter,
) -> Result<ConvertedFile, ConvertError> {
    let img = decode_image(&source.bytes).map_err(|e| ConvertError::decode(from, e))?;
    let rgba = img.to_rgba8();
    let (w, h) = fit_within(rgba.width() as f32, rgba.height() as f32, A4_WIDTH, A4_HEIGHT);
    debug!(
        "Placing {}x{} px image at {:.1}x{:.1} pt",
        rgba.width(),
        rgba.height(),
        w,
        h
    );

    let mut writer = PdfWriter::new(A4_WIDTH, A4_HEIGHT);
    let name = writer
        .add_image(&rgba)
        .map_err(|e| ConvertError::encode(Format::Pdf, e))?;
    let mut canvas = PageCanvas::new();
    canvas.image(&name, (A4_WIDTH - w) / 2.0, (A4_HEIGHT - h) / 2.0, w, h);
    writer
        .add_page(canvas)
        .map_err(|e| ConvertError::encode(Format::Pdf, e))?;

    let info = DocumentInfo {
        title: Some(source.stem().to_string()),
        author: None,
    };
    let bytes = writer
        .finish(&info)
        .map_err(|e| ConvertError::encode(Format::Pdf, e))?;
    progress.report(100);

    let stats = ConversionStats {
        pages: 1,
        ..Default::default()
    };
    Ok(converted(source, from, Format::Pdf, bytes, stats))
}

/// Scale `(w, h)` down, preserving aspect ratio, until it fits `(max_w, max_h)`.
pub fn fit_within(w: f32, h: f32, max_w: f32, max_h: f32) -> (f32, f32) {
    let scale = (max_w / w).min(max_h / h).min(1.0);
    (w * scale, h * scale)
}

pub(crate) fn raster_format(format: Format) -> Result<RasterFormat, ConvertError> {
    match format {
        Format::Jpg => Ok(RasterFormat::Jpeg),
        Format::Png => Ok(RasterFormat::Png),
        other => Err(ConvertError::Internal(format!("{other} is not a raster format"))),
    }
}
