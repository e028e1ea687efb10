//! Eager (full-document) parse entry points.
//!
//! Every function here resolves the engine for
//! [`ParseOptions::engine_version`] through the caller's [`EngineRegistry`]
//! and then runs [`walk_document`]. Engines like PDFium are blocking and not
//! async-safe, so the async variants move the whole walk onto the blocking
//! thread pool with `tokio::task::spawn_blocking`.
//!
//! Use [`crate::stream::parse_stream`] instead when you want pages as they
//! are rendered.

use crate::config::ParseOptions;
use crate::engine::registry::EngineRegistry;
use crate::error::ScrapeError;
use crate::output::{DocumentSummary, ParseResult};
use crate::pipeline::input;
use crate::pipeline::walk::{inspect_document, walk_document};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Extract the text of a PDF held in memory.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ParseResult)` on success, even if some pages failed
/// (check `result.page_errors`).
///
/// # Errors
/// Returns `Err(ScrapeError)` only for fatal errors:
/// - the engine version cannot be loaded
/// - the buffer cannot be opened as a PDF (corrupt, encrypted, …)
///
/// # Example
/// ```rust,no_run
/// use pdf_scraper::{parse, EngineRegistry, ParseOptions};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = EngineRegistry::pdfium();
/// let bytes = std::fs::read("document.pdf")?;
/// let result = parse(bytes, &ParseOptions::default(), &registry).await?;
/// println!("{} of {} pages\n{}", result.rendered_pages, result.page_count, result.text);
/// # Ok(())
/// # }
/// ```
pub async fn parse(
    bytes: impl Into<Vec<u8>>,
    options: &ParseOptions,
    registry: &EngineRegistry,
) -> Result<ParseResult, ScrapeError> {
    let bytes = bytes.into();
    let options = options.clone();
    let registry = registry.clone();

    tokio::task::spawn_blocking(move || parse_sync(&bytes, &options, &registry))
        .await
        .map_err(|e| ScrapeError::Internal(format!("Parse task panicked: {}", e)))?
}

/// Blocking variant of [`parse`]; runs on the calling thread.
pub fn parse_sync(
    bytes: &[u8],
    options: &ParseOptions,
    registry: &EngineRegistry,
) -> Result<ParseResult, ScrapeError> {
    let start = Instant::now();
    info!("Starting parse: {} bytes", bytes.len());

    let engine = registry.get_or_load(&options.engine_version)?;
    let result = walk_document(engine.as_ref(), bytes, options)?;

    info!(
        "Parse complete: {}/{} pages rendered, {} failed, {}ms",
        result.rendered_pages,
        result.page_count,
        result.failed_pages(),
        start.elapsed().as_millis()
    );
    Ok(result)
}

/// Extract the text of a local PDF file or HTTP/HTTPS URL.
pub async fn parse_input(
    input_str: impl AsRef<str>,
    options: &ParseOptions,
    registry: &EngineRegistry,
) -> Result<ParseResult, ScrapeError> {
    let bytes = input::load_input(input_str.as_ref(), options.download_timeout_secs).await?;
    parse(bytes, options, registry).await
}

/// Extract text and write [`ParseResult::text`] directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn parse_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    options: &ParseOptions,
    registry: &EngineRegistry,
) -> Result<ParseResult, ScrapeError> {
    let result = parse_input(input_str, options, registry).await?;
    let path = output_path.as_ref();

    let write_err = |source: std::io::Error| ScrapeError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("txt.tmp");
    tokio::fs::write(&tmp_path, &result.text)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    Ok(result)
}

/// Read page count and metadata without rendering any page.
///
/// Still loads the engine; does not touch page content.
pub async fn inspect(
    bytes: impl Into<Vec<u8>>,
    options: &ParseOptions,
    registry: &EngineRegistry,
) -> Result<DocumentSummary, ScrapeError> {
    let bytes = bytes.into();
    let options = options.clone();
    let registry = registry.clone();

    tokio::task::spawn_blocking(move || {
        let engine = registry.get_or_load(&options.engine_version)?;
        inspect_document(engine.as_ref(), &bytes, &options)
    })
    .await
    .map_err(|e| ScrapeError::Internal(format!("Inspect task panicked: {}", e)))?
}
