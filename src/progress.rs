//! Progress reporting for conversions and page operations.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events while a job runs. Converters never call the callback directly:
//! they go through a [`ProgressReporter`], which clamps every value to
//! `0..=100` and drops anything lower than what was already reported, so a
//! callback observes a non-decreasing sequence for the lifetime of one job.
//!
//! # Example
//!
//! ```rust
//! use filedesk::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicU8, Ordering}};
//!
//! struct LastPercent(AtomicU8);
//!
//! impl ConversionProgressCallback for LastPercent {
//!     fn on_progress(&self, percent: u8) {
//!         self.0.store(percent, Ordering::SeqCst);
//!     }
//! }
//!
//! let cb = Arc::new(LastPercent(AtomicU8::new(0)));
//! let config = ConversionConfig::builder()
//!     .progress_callback(cb as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::BlockError;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Called as a job moves through its stages.
///
/// Implementations must be `Send + Sync`: CPU-heavy stages run on the
/// blocking thread pool and report from there. All methods have default
/// no-op implementations so callers only override what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before any work, with a label such as `"pdf → word"` or `"merge"`.
    fn on_conversion_start(&self, operation: &str) {
        let _ = operation;
    }

    /// Overall completion in percent. Never lower than the previous call.
    fn on_progress(&self, percent: u8) {
        let _ = percent;
    }

    /// Called after each page (or merge source) has been handled.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page number
    /// * `total_pages`: total pages in the job
    fn on_page_complete(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a Word→PDF content block is skipped.
    fn on_item_skipped(&self, error: &BlockError) {
        let _ = error;
    }

    /// Called once when the job ends, successfully or not.
    fn on_conversion_complete(&self, success: bool) {
        let _ = success;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Monotonic front for a [`ProgressCallback`].
///
/// Cheap to clone; clones share the high-water mark, so a reporter handed to
/// a blocking task and the one kept by the caller stay consistent.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    high_water: Arc<AtomicU8>,
}

impl ProgressReporter {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            high_water: Arc::new(AtomicU8::new(0)),
        }
    }

    /// A reporter that only tracks the value.
    pub fn silent() -> Self {
        Self::new(None)
    }

    /// Report `percent` (clamped to 100). Values at or below the current
    /// high-water mark are ignored.
    pub fn report(&self, percent: u32) {
        let p = percent.min(100) as u8;
        let prev = self.high_water.fetch_max(p, Ordering::SeqCst);
        if p > prev {
            if let Some(ref cb) = self.callback {
                cb.on_progress(p);
            }
        }
    }

    /// Report `round(done / total * span)`, offset by `base`.
    pub fn report_scaled(&self, base: u32, span: u32, done: usize, total: usize) {
        self.report(base + scaled(done, total, span));
    }

    /// Highest value reported so far.
    pub fn current(&self) -> u8 {
        self.high_water.load(Ordering::SeqCst)
    }

    pub fn start(&self, operation: &str) {
        if let Some(ref cb) = self.callback {
            cb.on_conversion_start(operation);
        }
    }

    pub fn page_complete(&self, page_num: usize, total_pages: usize) {
        if let Some(ref cb) = self.callback {
            cb.on_page_complete(page_num, total_pages);
        }
    }

    pub fn item_skipped(&self, error: &BlockError) {
        if let Some(ref cb) = self.callback {
            cb.on_item_skipped(error);
        }
    }

    pub fn finish(&self, success: bool) {
        if success {
            self.report(100);
        }
        if let Some(ref cb) = self.callback {
            cb.on_conversion_complete(success);
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("callback", &self.callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"))
            .field("current", &self.current())
            .finish()
    }
}

/// `round(done / total * span)`; zero when `total` is zero.
pub(crate) fn scaled(done: usize, total: usize, span: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((done as f64 / total as f64) * span as f64).round() as u32
}
