//! Configuration types for conversions and page operations.
//!
//! All tunable behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Defaults reproduce what the web tool
//! did: ×2 page rendering, JPEG quality 92, A4 pages with a 50 pt margin.

use crate::error::ConvertError;
use crate::pipeline::render::PageRasterizer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for one conversion or page operation.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use filedesk::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .render_scale(3.0)
///     .jpeg_quality(85)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Oversampling factor applied when rasterising PDF pages. Range: 0.5–4.0. Default: 2.0.
    ///
    /// A factor of 1 renders one pixel per PDF point (72 DPI).
    pub render_scale: f32,

    /// JPEG encoder quality for every JPEG the library writes. Range: 1–100. Default: 92.
    pub jpeg_quality: u8,

    /// Page geometry and base font for Word→PDF.
    pub document_layout: PageLayout,

    /// Page geometry and base font for Text→PDF.
    pub text_layout: PageLayout,

    /// Word→PDF: keep heading/bold/italic structure. Default: true.
    ///
    /// When false the document's raw text is laid out as plain paragraphs.
    pub preserve_formatting: bool,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,

    /// Page rasteriser for PDF→image. `None` binds pdfium on first use.
    pub rasterizer: Option<Arc<dyn PageRasterizer>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            render_scale: 2.0,
            jpeg_quality: 92,
            document_layout: PageLayout::a4_document(),
            text_layout: PageLayout::a4_text(),
            preserve_formatting: true,
            progress_callback: None,
            rasterizer: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("render_scale", &self.render_scale)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("document_layout", &self.document_layout)
            .field("text_layout", &self.text_layout)
            .field("preserve_formatting", &self.preserve_formatting)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .field("rasterizer", &self.rasterizer.as_ref().map(|_| "<dyn PageRasterizer>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = if scale.is_finite() {
            scale.clamp(0.5, 4.0)
        } else {
            scale
        };
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn document_layout(mut self, layout: PageLayout) -> Self {
        self.config.document_layout = layout;
        self
    }

    pub fn text_layout(mut self, layout: PageLayout) -> Self {
        self.config.text_layout = layout;
        self
    }

    pub fn preserve_formatting(mut self, v: bool) -> Self {
        self.config.preserve_formatting = v;
        self
    }

    /// Set a progress callback to receive events as the job runs.
    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Use a specific page rasteriser instead of binding pdfium.
    pub fn rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.config.rasterizer = Some(rasterizer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if !c.render_scale.is_finite() {
            return Err(ConvertError::InvalidConfig(format!(
                "Render scale must be a finite number, got {}",
                c.render_scale
            )));
        }
        c.document_layout.validate("document")?;
        c.text_layout.validate("text")?;
        Ok(self.config)
    }
}

// ── Page geometry ────────────────────────────────────────────────────────

/// Page size, margin and base typography for generated PDFs, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    /// Applied on all four sides.
    pub margin: f32,
    pub font_size: f32,
    /// Minimum distance between baselines of body text.
    pub line_height: f32,
}

impl PageLayout {
    /// A4 portrait, 50 pt margins, 12 pt body text on 16 pt lines.
    pub fn a4_document() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
            margin: 50.0,
            font_size: 12.0,
            line_height: 16.0,
        }
    }

    /// A4 portrait with a 180 mm text column (15 mm side margins).
    pub fn a4_text() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin: 42.52,
            font_size: 12.0,
            line_height: 16.0,
        }
    }

    /// Page width minus left and right margins.
    pub fn printable_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    fn validate(&self, which: &str) -> Result<(), ConvertError> {
        let finite = [self.width, self.height, self.margin, self.font_size, self.line_height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width <= 0.0 || self.height <= 0.0 || self.margin < 0.0 {
            return Err(ConvertError::InvalidConfig(format!(
                "{which} layout has invalid page geometry: {self:?}"
            )));
        }
        if self.printable_width() <= 0.0 || self.height - 2.0 * self.margin <= 0.0 {
            return Err(ConvertError::InvalidConfig(format!(
                "{which} layout margins leave no printable area"
            )));
        }
        if !(8.0..=72.0).contains(&self.font_size) {
            return Err(ConvertError::InvalidConfig(format!(
                "{which} layout font size must be 8–72 pt, got {}",
                self.font_size
            )));
        }
        if self.line_height <= 0.0 {
            return Err(ConvertError::InvalidConfig(format!(
                "{which} layout line height must be positive"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.render_scale, 2.0);
        assert_eq!(c.jpeg_quality, 92);
        assert!(c.preserve_formatting);
        assert_eq!(c.document_layout.printable_width(), 495.0);
        assert!((c.text_layout.printable_width() - 510.24).abs() < 0.01);
    }

    #[test]
    fn setters_clamp() {
        let c = ConversionConfig::builder()
            .render_scale(10.0)
            .jpeg_quality(0)
            .build()
            .unwrap();
        assert_eq!(c.render_scale, 4.0);
        assert_eq!(c.jpeg_quality, 1);
    }

    #[test]
    fn nan_scale_rejected() {
        let err = ConversionConfig::builder()
            .render_scale(f32::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn layout_without_printable_area_rejected() {
        let layout = PageLayout {
            margin: 300.0,
            ..PageLayout::a4_document()
        };
        let err = ConversionConfig::builder()
            .document_layout(layout)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("printable"));
    }

    #[test]
    fn debug_hides_trait_objects() {
        let s = format!("{:?}", ConversionConfig::default());
        assert!(s.contains("render_scale"));
        assert!(s.contains("rasterizer: None"));
    }
}
