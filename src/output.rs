//! Result types returned by the parse entry points.

use crate::error::{PageError, ScrapeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The document info dictionary, as far as the engine exposes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    /// PDF format version reported by the engine, e.g. `Pdf1_7`.
    pub pdf_version: Option<String>,
}

/// Everything extracted from one document.
///
/// `pages.len() == rendered_pages`, and
/// `rendered_pages == min(max_pages > 0 ? max_pages : page_count, page_count)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    /// Total pages in the document.
    pub page_count: usize,

    /// Text of each rendered page, in page order. A page that failed is `""`.
    pub pages: Vec<String>,

    /// Number of pages that were attempted.
    pub rendered_pages: usize,

    /// Document info, or `None` when metadata could not be read.
    pub info: Option<DocumentInfo>,

    /// Raw metadata entries, or `None` when unavailable.
    pub metadata: Option<BTreeMap<String, String>>,

    /// All page texts joined by a blank line.
    pub text: String,

    /// Version of the engine that produced this result.
    pub engine_version: String,

    /// One entry per page that failed, in page order.
    ///
    /// Distinguishes a failed page from one that legitimately has no text.
    pub page_errors: Vec<PageError>,
}

impl ParseResult {
    /// Number of pages that failed.
    pub fn failed_pages(&self) -> usize {
        self.page_errors.len()
    }

    /// `true` when every rendered page succeeded.
    pub fn is_complete(&self) -> bool {
        self.page_errors.is_empty()
    }

    /// Whether the page with 1-indexed number `page_num` failed.
    pub fn page_failed(&self, page_num: usize) -> bool {
        self.page_errors.iter().any(|e| e.page() == page_num)
    }

    /// Treat any page failure as an error.
    pub fn into_result(self) -> Result<Self, ScrapeError> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(ScrapeError::PartialFailure {
                failed: self.failed_pages(),
                total: self.rendered_pages,
            })
        }
    }
}

/// Page count and metadata, without rendering any page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub page_count: usize,
    pub info: Option<DocumentInfo>,
    pub metadata: Option<BTreeMap<String, String>>,
    pub engine_version: String,
}
