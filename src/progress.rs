//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ParseProgressCallback>`] via
//! [`crate::config::ParseOptionsBuilder::progress_callback`] to receive
//! events as the walker processes each page. Events for one document are
//! delivered sequentially and in page order, from whichever thread runs the
//! walk (a blocking-pool thread for the async entry points).
//!
//! # Example
//!
//! ```rust
//! use pdf_scraper::{ParseOptions, ParseProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ParseProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} done ({} bytes)", page_num, total_pages, text_len);
//!     }
//! }
//!
//! let options = ParseOptions::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the document walker as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ParseProgressCallback: Send + Sync {
    /// Called once after the document is open, before any page is rendered.
    ///
    /// # Arguments
    /// * `total_pages`: number of pages that will be rendered
    fn on_parse_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is fetched.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page rendered successfully.
    ///
    /// # Arguments
    /// * `page_num`   : 1-indexed page number
    /// * `total_pages`: pages being rendered
    /// * `text_len`   : byte length of the page text
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Called when a page failed and was replaced by empty text.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once when the document is released.
    ///
    /// # Arguments
    /// * `total_pages`  : pages attempted
    /// * `success_count`: pages that rendered without error
    fn on_parse_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ParseProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ParseOptions`].
pub type ProgressCallback = Arc<dyn ParseProgressCallback>;
