//! # pdf-scraper
//!
//! Extract line-broken text from PDF documents.
//!
//! All PDF understanding (container parsing, content streams, fonts) is
//! delegated to an engine behind the [`PdfEngine`] trait; PDFium via
//! `pdfium-render` is the built-in one. This crate drives the engine page by
//! page and rebuilds line breaks from the vertical position of each text run,
//! since PDFs carry no explicit line-break markers for flowed text.
//!
//! ## Pipeline Overview
//!
//! ```text
//! bytes / path / URL
//!  │
//!  ├─ 1. Engine   look up (or load once) the engine build for the requested version
//!  ├─ 2. Open     open the document; the only fatal step after loading
//!  ├─ 3. Meta     read document info (failures become `None`)
//!  ├─ 4. Pages    for pages 1..=N in order: fetch, render via PageRenderer
//!  │              (failures become "" plus a recorded PageError)
//!  └─ 5. Output   ParseResult: per-page text, joined text, counts, metadata
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_scraper::{parse, EngineRegistry, ParseOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // One registry per process (or per test); engines are loaded lazily.
//!     let registry = EngineRegistry::pdfium();
//!     let options = ParseOptions::builder().max_pages(5).build()?;
//!
//!     let bytes = std::fs::read("document.pdf")?;
//!     let result = parse(bytes, &options, &registry).await?;
//!     println!("{}", result.text);
//!     eprintln!("{}/{} pages, engine {}",
//!         result.rendered_pages, result.page_count, result.engine_version);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-scraper` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod parse;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    normalize_engine_version, ParseOptions, ParseOptionsBuilder, DEFAULT_ENGINE_VERSION,
};
pub use engine::pdfium::{PdfiumEngine, PdfiumLoader};
pub use engine::registry::{EngineLoader, EngineRegistry};
pub use engine::{
    EngineDocument, EngineMetadata, EnginePage, PdfEngine, TextRun, TextRunOptions,
};
pub use error::{MetadataError, PageError, ScrapeError};
pub use output::{DocumentInfo, DocumentSummary, ParseResult};
pub use parse::{inspect, parse, parse_input, parse_sync, parse_to_file};
pub use pipeline::lines::{reconstruct_lines, EngineTextRenderer, LineReconstructor, PageRenderer};
pub use pipeline::walk::{inspect_document, walk_document, DocumentWalker, PageText};
pub use progress::{NoopProgressCallback, ParseProgressCallback, ProgressCallback};
pub use stream::{parse_stream, PageStream};
