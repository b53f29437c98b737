//! PDF rasterisation: render every page to a `DynamicImage`.
//!
//! Rendering sits behind the [`PageRasterizer`] trait so converters can be
//! exercised without a pdfium library. The default implementation,
//! [`PdfiumRasterizer`], binds pdfium on each call; callers run it inside
//! `tokio::task::spawn_blocking` because pdfium is CPU-bound and not
//! async-safe.

use crate::error::ConvertError;
use crate::format::Format;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// One rendered page.
pub struct PageImage {
    /// 0-based page index.
    pub index: usize,
    pub total: usize,
    pub image: DynamicImage,
}

/// Renders PDF pages, strictly in page order.
pub trait PageRasterizer: Send + Sync {
    /// Render each page of `pdf` at `scale` × its size in points and hand
    /// the image to `sink` before rendering the next one.
    ///
    /// Returns the page count. Errors from `sink` abort rendering and are
    /// returned unchanged.
    fn render_each(
        &self,
        pdf: &[u8],
        scale: f32,
        sink: &mut dyn FnMut(PageImage) -> Result<(), ConvertError>,
    ) -> Result<usize, ConvertError>;
}

/// [`PageRasterizer`] backed by the pdfium shared library.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumRasterizer;

impl PageRasterizer for PdfiumRasterizer {
    fn render_each(
        &self,
        pdf: &[u8],
        scale: f32,
        sink: &mut dyn FnMut(PageImage) -> Result<(), ConvertError>,
    ) -> Result<usize, ConvertError> {
        let pdfium = bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| ConvertError::decode(Format::Pdf, format!("{e:?}")))?;

        let pages = document.pages();
        let total = pages.len() as usize;
        info!("PDF loaded: {} pages", total);

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        for (index, page) in pages.iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                ConvertError::decode(Format::Pdf, format!("page {}: {e:?}", index + 1))
            })?;
            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                index + 1,
                image.width(),
                image.height()
            );
            sink(PageImage {
                index,
                total,
                image,
            })?;
        }
        Ok(total)
    }
}

/// Bind to pdfium.
///
/// `PDFIUM_LIB_PATH` may name the library file or the directory holding it.
/// Otherwise the working directory is tried first, then the system library
/// search path.
pub fn bind_pdfium() -> Result<Pdfium, ConvertError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(p) if !p.is_empty() => {
            let path = Path::new(&p);
            if path.is_dir() {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path))
            } else {
                Pdfium::bind_to_library(path)
            }
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ConvertError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}
