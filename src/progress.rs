//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline processes each page, or pass a plain closure to
//! [`crate::config::ConversionConfigBuilder::on_progress`] when only the
//! percentage matters.
//!
//! Callbacks are observers, not backpressure: the page loop calls them
//! synchronously and never waits for a slow consumer.
//!
//! # Example
//!
//! ```rust
//! use pdf2mdx::{ConversionConfig, ConversionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, mdx_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} done ({} bytes)", page_num, total_pages, mdx_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// Called by the conversion pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The trait is `Send + Sync` because the async entry
/// points run the page loop on a blocking worker thread.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first page is fetched.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages that will be processed
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is fetched from the reader.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — number of pages being processed
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page converted successfully.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — number of pages being processed
    /// * `mdx_len`     — byte length of the page's MDX
    fn on_page_complete(&self, page_num: usize, total_pages: usize, mdx_len: usize) {
        let _ = (page_num, total_pages, mdx_len);
    }

    /// Called when a page could not be extracted. The page is skipped.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called exactly once per processed page, after `on_page_complete` or
    /// `on_page_error`, with the completed share in `[0, 100]`.
    ///
    /// Values are non-decreasing and the final call is exactly `100.0`.
    fn on_progress(&self, percent: f64) {
        let _ = percent;
    }

    /// Called once after all pages have been attempted.
    ///
    /// # Arguments
    /// * `total_pages`   — number of pages processed
    /// * `success_count` — pages that converted without error
    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Adapts a `Fn(f64)` closure to [`ConversionProgressCallback::on_progress`].
pub struct PercentCallback<F>(pub F);

impl<F> ConversionProgressCallback for PercentCallback<F>
where
    F: Fn(f64) + Send + Sync,
{
    fn on_progress(&self, percent: f64) {
        (self.0)(percent)
    }
}

impl<F> fmt::Debug for PercentCallback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PercentCallback(<fn>)")
    }
}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Percentage of `done` out of `total` pages; exactly `100.0` on the last page.
pub(crate) fn percent_complete(done: usize, total: usize) -> f64 {
    if total == 0 || done >= total {
        100.0
    } else {
        done as f64 * 100.0 / total as f64
    }
}
