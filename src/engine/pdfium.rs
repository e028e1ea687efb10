//! PDFium-backed engine via `pdfium-render`.
//!
//! ## Why segments for runs?
//!
//! PDFium already groups characters that share a baseline and font run into
//! text segments, which is the closest match to the "text item" granularity
//! the line reconstructor expects. When the caller turns
//! [`TextRunOptions::combine_text_items`] off we fall back to one run per
//! character using the character's loose bounds.

use super::registry::EngineLoader;
use super::{EngineDocument, EngineMetadata, EnginePage, PdfEngine, TextRun, TextRunOptions};
use crate::error::{MetadataError, PageError, ScrapeError};
use crate::output::DocumentInfo;
use pdfium_render::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Metadata tags copied into the raw metadata map, with their field names.
const METADATA_TAGS: [(PdfDocumentMetadataTagType, &str); 8] = [
    (PdfDocumentMetadataTagType::Title, "Title"),
    (PdfDocumentMetadataTagType::Author, "Author"),
    (PdfDocumentMetadataTagType::Subject, "Subject"),
    (PdfDocumentMetadataTagType::Keywords, "Keywords"),
    (PdfDocumentMetadataTagType::Creator, "Creator"),
    (PdfDocumentMetadataTagType::Producer, "Producer"),
    (PdfDocumentMetadataTagType::CreationDate, "CreationDate"),
    (PdfDocumentMetadataTagType::ModificationDate, "ModDate"),
];

/// A bound PDFium library for one release tag.
pub struct PdfiumEngine {
    version: String,
    pdfium: Pdfium,
}

impl PdfiumEngine {
    pub fn new(version: impl Into<String>, pdfium: Pdfium) -> Self {
        Self {
            version: version.into(),
            pdfium,
        }
    }
}

impl PdfEngine for PdfiumEngine {
    fn version(&self) -> &str {
        &self.version
    }

    fn open_document<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&str>,
    ) -> Result<Box<dyn EngineDocument + 'a>, ScrapeError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| classify_open_error(format!("{:?}", e), password.is_some()))?;

        debug!("PDFium {} opened {} bytes", self.version, bytes.len());
        Ok(Box::new(PdfiumDocument { document }))
    }
}

/// Map a PDFium load failure onto the fatal error it represents.
fn classify_open_error(detail: String, password_given: bool) -> ScrapeError {
    if detail.contains("Password") || detail.contains("password") {
        if password_given {
            ScrapeError::WrongPassword
        } else {
            ScrapeError::PasswordRequired
        }
    } else {
        ScrapeError::CorruptPdf { detail }
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl EngineDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn metadata(&self) -> Result<EngineMetadata, MetadataError> {
        let tags = self.document.metadata();

        let mut raw = BTreeMap::new();
        for (tag_type, name) in METADATA_TAGS {
            if let Some(tag) = tags.get(tag_type) {
                let value = tag.value().to_string();
                if !value.is_empty() {
                    raw.insert(name.to_string(), value);
                }
            }
        }

        let field = |name: &str| raw.get(name).cloned();
        let info = DocumentInfo {
            title: field("Title"),
            author: field("Author"),
            subject: field("Subject"),
            keywords: field("Keywords"),
            creator: field("Creator"),
            producer: field("Producer"),
            creation_date: field("CreationDate"),
            modification_date: field("ModDate"),
            pdf_version: Some(format!("{:?}", self.document.version())),
        };

        Ok(EngineMetadata {
            info,
            metadata: (!raw.is_empty()).then_some(raw),
        })
    }

    fn page(&self, index: usize) -> Result<Box<dyn EnginePage + '_>, PageError> {
        let number = index + 1;
        let page_index = u16::try_from(index).map_err(|_| PageError::PageLoadFailed {
            page: number,
            detail: format!("page index {index} exceeds PDFium's page index range"),
        })?;

        let page = self
            .document
            .pages()
            .get(page_index)
            .map_err(|e| PageError::PageLoadFailed {
                page: number,
                detail: format!("{:?}", e),
            })?;

        Ok(Box::new(PdfiumPage { page, number }))
    }

    fn close(self: Box<Self>) {
        debug!("Closing PDFium document");
        drop(self.document);
    }
}

struct PdfiumPage<'a> {
    page: PdfPage<'a>,
    number: usize,
}

impl PdfiumPage<'_> {
    fn page_text(&self) -> Result<PdfPageText<'_>, PageError> {
        self.page
            .text()
            .map_err(|e| PageError::TextExtractionFailed {
                page: self.number,
                detail: format!("{:?}", e),
            })
    }
}

impl EnginePage for PdfiumPage<'_> {
    fn number(&self) -> usize {
        self.number
    }

    fn text_runs(&self, options: &TextRunOptions) -> Result<Vec<TextRun>, PageError> {
        let text = self.page_text()?;
        let mut runs = Vec::new();

        if options.combine_text_items {
            for segment in text.segments().iter() {
                let bounds = segment.bounds();
                runs.push(options.apply(TextRun {
                    text: segment.text(),
                    x: bounds.left().value,
                    y: bounds.bottom().value,
                    width: bounds.right().value - bounds.left().value,
                    height: bounds.top().value - bounds.bottom().value,
                }));
            }
        } else {
            for ch in text.chars().iter() {
                let Some(s) = ch.unicode_string() else {
                    continue;
                };
                let bounds = ch.loose_bounds().map_err(|e| PageError::TextExtractionFailed {
                    page: self.number,
                    detail: format!("{:?}", e),
                })?;
                runs.push(options.apply(TextRun {
                    text: s,
                    x: bounds.left().value,
                    y: bounds.bottom().value,
                    width: bounds.right().value - bounds.left().value,
                    height: bounds.top().value - bounds.bottom().value,
                }));
            }
        }

        debug!("Page {}: {} text runs", self.number, runs.len());
        Ok(runs)
    }

    fn text(&self) -> Result<String, PageError> {
        Ok(self.page_text()?.all())
    }
}

/// Loads PDFium builds through `pdfium-auto`.
///
/// With [`PdfiumLoader::from_path`] every version binds the same explicit
/// library file; otherwise each release tag is resolved (and downloaded on
/// first use) independently.
#[derive(Debug, Clone, Default)]
pub struct PdfiumLoader {
    lib_path: Option<PathBuf>,
}

impl PdfiumLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always bind the library at `path`, skipping resolution.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            lib_path: Some(path.into()),
        }
    }
}

impl EngineLoader for PdfiumLoader {
    fn load(&self, version: &str) -> Result<Arc<dyn PdfEngine>, ScrapeError> {
        let tag = pdfium_auto::normalize_version(version).map_err(|_| {
            ScrapeError::UnsupportedEngineVersion {
                version: version.to_string(),
            }
        })?;

        let bound = match &self.lib_path {
            Some(path) => pdfium_auto::bind_pdfium_from_path(path),
            None => pdfium_auto::bind_pdfium(tag, None),
        };
        let pdfium = bound.map_err(|e| ScrapeError::EngineLoad {
            version: tag.to_string(),
            detail: e.to_string(),
        })?;

        info!("Loaded PDFium engine chromium/{}", tag);
        Ok(Arc::new(PdfiumEngine::new(tag, pdfium)))
    }
}
