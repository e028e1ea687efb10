//! The PDF engine seam.
//!
//! Everything that actually understands the PDF format (container parsing,
//! content streams, fonts) lives behind these traits. The rest of the crate
//! only ever sees documents, pages and positioned [`TextRun`]s.
//!
//! ```text
//! PdfEngine ──open_document──▶ EngineDocument ──page(i)──▶ EnginePage ──text_runs──▶ [TextRun]
//! ```
//!
//! [`pdfium`] provides the production implementation; tests plug in fakes.
//! Engines are looked up by version through [`registry::EngineRegistry`].

pub mod pdfium;
pub mod registry;

use crate::error::{MetadataError, PageError, ScrapeError};
use crate::output::DocumentInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A loaded PDF engine build.
pub trait PdfEngine: Send + Sync {
    /// Version identifier of this build (e.g. a PDFium release tag).
    fn version(&self) -> &str;

    /// Open a document from an in-memory buffer.
    ///
    /// Failures here are fatal for the whole parse.
    fn open_document<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&str>,
    ) -> Result<Box<dyn EngineDocument + 'a>, ScrapeError>;
}

/// An open document. Dropping it releases the engine-side resources.
pub trait EngineDocument {
    /// Total number of pages in the document.
    fn page_count(&self) -> usize;

    /// Document info dictionary and raw metadata entries.
    fn metadata(&self) -> Result<EngineMetadata, MetadataError>;

    /// Fetch a page by 0-based index.
    fn page(&self, index: usize) -> Result<Box<dyn EnginePage + '_>, PageError>;

    /// Release the document explicitly.
    fn close(self: Box<Self>) {}
}

/// A single page of an open document.
pub trait EnginePage {
    /// 1-indexed page number.
    fn number(&self) -> usize;

    /// Positioned text fragments in content-stream order.
    fn text_runs(&self, options: &TextRunOptions) -> Result<Vec<TextRun>, PageError>;

    /// The engine's own plain-text rendition of the page.
    fn text(&self) -> Result<String, PageError> {
        let runs = self.text_runs(&TextRunOptions::default())?;
        Ok(runs.iter().map(|r| r.text.as_str()).collect())
    }
}

/// A fragment of page text plus its position in PDF user space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    /// Left edge.
    pub x: f32,
    /// Vertical position (bottom edge, y grows upwards).
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TextRun {
    /// A run with a position but no extent.
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width: 0.0,
            height: 0.0,
        }
    }
}

/// Options forwarded to [`EnginePage::text_runs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRunOptions {
    /// Replace every whitespace character with a plain space (U+0020). Default: false.
    pub normalize_whitespace: bool,

    /// Let the engine merge adjacent characters into segments. Default: true.
    ///
    /// When false, each character is reported as its own run.
    pub combine_text_items: bool,
}

impl Default for TextRunOptions {
    fn default() -> Self {
        Self {
            normalize_whitespace: false,
            combine_text_items: true,
        }
    }
}

impl TextRunOptions {
    /// Apply the text-level options to a run produced by an engine.
    pub fn apply(&self, mut run: TextRun) -> TextRun {
        if self.normalize_whitespace && run.text.chars().any(char::is_whitespace) {
            run.text = run
                .text
                .chars()
                .map(|c| if c.is_whitespace() { ' ' } else { c })
                .collect();
        }
        run
    }
}

/// What an engine knows about a document beyond its pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineMetadata {
    pub info: DocumentInfo,
    /// Raw metadata entries, keyed by the engine's field names.
    pub metadata: Option<BTreeMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RunsPage(Vec<TextRun>);

    impl EnginePage for RunsPage {
        fn number(&self) -> usize {
            1
        }

        fn text_runs(&self, options: &TextRunOptions) -> Result<Vec<TextRun>, PageError> {
            Ok(self.0.iter().cloned().map(|r| options.apply(r)).collect())
        }
    }

    #[test]
    fn normalize_whitespace_replaces_all_kinds() {
        let opts = TextRunOptions {
            normalize_whitespace: true,
            ..Default::default()
        };
        let run = opts.apply(TextRun::new("a\tb\u{00A0}c\nd", 0.0, 0.0));
        assert_eq!(run.text, "a b c d");
    }

    #[test]
    fn whitespace_kept_by_default() {
        let run = TextRunOptions::default().apply(TextRun::new("a\tb", 0.0, 0.0));
        assert_eq!(run.text, "a\tb");
    }

    #[test]
    fn default_page_text_joins_runs() {
        let page = RunsPage(vec![
            TextRun::new("Hello", 0.0, 10.0),
            TextRun::new(" world", 30.0, 10.0),
        ]);
        assert_eq!(page.text().unwrap(), "Hello world");
    }
}
