//! Document walker: open a document, render pages in order, assemble the result.
//!
//! ## Failure model
//!
//! Opening the document is the only fatal step. After that, a broken
//! metadata dictionary becomes `None` and a broken page becomes `""` with a
//! recorded [`PageError`]; the walk always continues with the next page.
//!
//! ## Ordering
//!
//! Pages are fetched and rendered strictly one after another, so output
//! order equals page order and at most one page object is alive at a time.
//! [`DocumentWalker`] is an iterator, letting the streaming API pull pages
//! lazily while [`walk_document`] simply collects them.

use crate::config::ParseOptions;
use crate::engine::{EngineDocument, EngineMetadata, PdfEngine, TextRunOptions};
use crate::error::{PageError, ScrapeError};
use crate::output::{DocumentSummary, ParseResult};
use crate::pipeline::lines::PageRenderer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Separator placed between page texts in [`ParseResult::text`].
pub const PAGE_SEPARATOR: &str = "\n\n";

/// The outcome for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Extracted text; empty when `error` is set.
    pub text: String,
    pub error: Option<PageError>,
}

/// Walks the first `render_count` pages of an open document.
pub struct DocumentWalker<'e> {
    document: Option<Box<dyn EngineDocument + 'e>>,
    renderer: Arc<dyn PageRenderer>,
    text_options: TextRunOptions,
    progress: Option<ProgressCallback>,
    page_count: usize,
    render_count: usize,
    next_index: usize,
    succeeded: usize,
}

impl<'e> DocumentWalker<'e> {
    /// Open `bytes` with `engine`. This is the fatal step of a parse.
    pub fn open(
        engine: &'e dyn PdfEngine,
        bytes: &'e [u8],
        options: &ParseOptions,
    ) -> Result<Self, ScrapeError> {
        let document = engine.open_document(bytes, options.password.as_deref())?;
        let page_count = document.page_count();
        let render_count = options.pages_to_render(page_count);
        info!(
            "Opened PDF: {} pages, rendering {} with engine {}",
            page_count,
            render_count,
            engine.version()
        );

        if let Some(ref cb) = options.progress_callback {
            cb.on_parse_start(render_count);
        }

        Ok(Self {
            document: Some(document),
            renderer: Arc::clone(&options.page_renderer),
            text_options: options.text_run_options,
            progress: options.progress_callback.clone(),
            page_count,
            render_count,
            next_index: 0,
            succeeded: 0,
        })
    }

    /// Total pages in the document.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Pages this walker will yield.
    pub fn render_count(&self) -> usize {
        self.render_count
    }

    /// Document metadata, or `None` if the engine could not provide it.
    pub fn metadata(&self) -> Option<EngineMetadata> {
        let document = self.document.as_ref()?;
        match document.metadata() {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!("Continuing without metadata: {}", e);
                None
            }
        }
    }

    /// Release the document. Dropping the walker has the same effect.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(document) = self.document.take() {
            document.close();
            if let Some(ref cb) = self.progress {
                cb.on_parse_complete(self.next_index, self.succeeded);
            }
            debug!("Released document after {} pages", self.next_index);
        }
    }

    fn render_page(
        document: &dyn EngineDocument,
        renderer: &dyn PageRenderer,
        index: usize,
        options: &TextRunOptions,
    ) -> Result<String, PageError> {
        let page = document.page(index)?;
        renderer.render(page.as_ref(), options)
    }
}

impl Iterator for DocumentWalker<'_> {
    type Item = PageText;

    fn next(&mut self) -> Option<PageText> {
        if self.next_index >= self.render_count {
            return None;
        }
        let document = self.document.as_deref()?;
        let index = self.next_index;
        let page_num = index + 1;
        self.next_index += 1;

        if let Some(ref cb) = self.progress {
            cb.on_page_start(page_num, self.render_count);
        }

        let rendered =
            Self::render_page(document, self.renderer.as_ref(), index, &self.text_options);
        let item = match rendered {
            Ok(text) => {
                debug!("Page {}: {} bytes", page_num, text.len());
                self.succeeded += 1;
                if let Some(ref cb) = self.progress {
                    cb.on_page_complete(page_num, self.render_count, text.len());
                }
                PageText {
                    page_num,
                    text,
                    error: None,
                }
            }
            Err(e) => {
                // Renderers are caller code; the walker owns the page number.
                let e = e.at_page(page_num);
                warn!("Page {} failed, substituting empty text: {}", page_num, e);
                if let Some(ref cb) = self.progress {
                    cb.on_page_error(page_num, self.render_count, &e.to_string());
                }
                PageText {
                    page_num,
                    text: String::new(),
                    error: Some(e),
                }
            }
        };

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.document.is_some() {
            self.render_count - self.next_index
        } else {
            0
        };
        (remaining, Some(remaining))
    }
}

impl Drop for DocumentWalker<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Parse a whole document with an already-loaded engine.
pub fn walk_document(
    engine: &dyn PdfEngine,
    bytes: &[u8],
    options: &ParseOptions,
) -> Result<ParseResult, ScrapeError> {
    let mut walker = DocumentWalker::open(engine, bytes, options)?;
    let page_count = walker.page_count();
    let rendered_pages = walker.render_count();
    let meta = walker.metadata();

    let mut pages = Vec::with_capacity(rendered_pages);
    let mut page_errors = Vec::new();
    let mut text = String::new();

    for page in walker.by_ref() {
        if page.page_num > 1 {
            text.push_str(PAGE_SEPARATOR);
        }
        text.push_str(&page.text);
        if let Some(e) = page.error {
            page_errors.push(e);
        }
        pages.push(page.text);
    }
    walker.close();

    if !page_errors.is_empty() {
        warn!("{}/{} pages failed", page_errors.len(), rendered_pages);
    }

    let (info, metadata) = match meta {
        Some(m) => (Some(m.info), m.metadata),
        None => (None, None),
    };

    Ok(ParseResult {
        page_count,
        pages,
        rendered_pages,
        info,
        metadata,
        text,
        engine_version: engine.version().to_string(),
        page_errors,
    })
}

/// Read page count and metadata without rendering any page.
pub fn inspect_document(
    engine: &dyn PdfEngine,
    bytes: &[u8],
    options: &ParseOptions,
) -> Result<DocumentSummary, ScrapeError> {
    let document = engine.open_document(bytes, options.password.as_deref())?;
    let page_count = document.page_count();
    let meta = document
        .metadata()
        .map_err(|e| warn!("Continuing without metadata: {}", e))
        .ok();
    document.close();

    let (info, metadata) = match meta {
        Some(m) => (Some(m.info), m.metadata),
        None => (None, None),
    };

    Ok(DocumentSummary {
        page_count,
        info,
        metadata,
        engine_version: engine.version().to_string(),
    })
}
