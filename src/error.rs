//! Error types for the pdf-scraper library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`ScrapeError`]: **Fatal.** Extraction cannot proceed at all (engine
//!   could not be loaded, document could not be opened, bad input). Returned
//!   as `Err(ScrapeError)` from the top-level `parse*` functions.
//!
//! * [`PageError`]: **Non-fatal.** A single page failed but every other
//!   page is fine. The page's text becomes `""` and the error is recorded in
//!   [`crate::output::ParseResult::page_errors`].
//!
//! * [`MetadataError`]: **Non-fatal.** The document info could not be read.
//!   Logged and replaced by `None`.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-scraper library.
#[derive(Debug, Error)]
pub enum ScrapeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The input was read, but does not start with the PDF magic bytes.
    #[error("Input is not a valid PDF: '{source_name}'\nFirst bytes: {magic:?}")]
    NotAPdf { source_name: String, magic: [u8; 4] },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The requested engine version is not one the loader can provide.
    #[error("Unsupported engine version '{version}'")]
    UnsupportedEngineVersion { version: String },

    /// The engine for `version` could not be loaded or bound.
    #[error(
        "Failed to load PDF engine '{version}': {detail}\n\n\
PDFium is normally downloaded automatically on first use.\n\
If the download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    EngineLoad { version: String, detail: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// The engine could not open the buffer as a PDF document.
    #[error("PDF is corrupt or unreadable: {detail}")]
    CorruptPdf { detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for encrypted PDF")]
    WrongPassword,

    /// Some pages rendered but at least one failed.
    ///
    /// Returned by [`crate::output::ParseResult::into_result`] when the
    /// caller wants to treat any page failure as an error.
    #[error("{failed}/{total} pages failed during extraction")]
    PartialFailure { failed: usize, total: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output text file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Stored in [`crate::output::ParseResult::page_errors`] and on
/// [`crate::pipeline::walk::PageText::error`]. Extraction continues.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The engine could not load the page object.
    #[error("Page {page}: failed to load page: {detail}")]
    PageLoadFailed { page: usize, detail: String },

    /// The engine could not produce the page's text runs.
    #[error("Page {page}: text extraction failed: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// The page renderer rejected the page.
    #[error("Page {page}: rendering failed: {detail}")]
    RenderFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::PageLoadFailed { page, .. }
            | PageError::TextExtractionFailed { page, .. }
            | PageError::RenderFailed { page, .. } => *page,
        }
    }

    /// The same error, attributed to `page_num`.
    pub fn at_page(mut self, page_num: usize) -> Self {
        match &mut self {
            PageError::PageLoadFailed { page, .. }
            | PageError::TextExtractionFailed { page, .. }
            | PageError::RenderFailed { page, .. } => *page = page_num,
        }
        self
    }
}

/// Document info could not be read. Never fatal.
#[derive(Debug, Clone, Error)]
#[error("Metadata unavailable: {detail}")]
pub struct MetadataError {
    pub detail: String,
}

impl MetadataError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
