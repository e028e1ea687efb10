//! Streaming parse API: emit pages as they are rendered.
//!
//! ## Why stream?
//!
//! Large documents take a while. A stream lets callers show partial results
//! immediately, or write pages out incrementally instead of buffering the
//! whole text in memory.
//!
//! The walk runs on a blocking-pool thread and hands pages over through a
//! small bounded channel, so the walker never gets more than
//! [`STREAM_BUFFER`] pages ahead of the consumer. Pages arrive strictly in
//! page order. Dropping the stream stops the walk after the page in flight
//! and releases the document.

use crate::config::ParseOptions;
use crate::engine::registry::EngineRegistry;
use crate::error::ScrapeError;
use crate::pipeline::walk::{DocumentWalker, PageText};
use futures::Stream;
use std::pin::Pin;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

/// Pages rendered ahead of the consumer.
pub const STREAM_BUFFER: usize = 4;

/// A boxed stream of page results, in page order.
pub type PageStream = Pin<Box<dyn Stream<Item = PageText> + Send>>;

/// Parse a PDF held in memory, streaming pages as they are rendered.
///
/// Failed pages are yielded with empty text and [`PageText::error`] set.
///
/// # Returns
/// - `Ok(PageStream)`: the document opened; pages follow
/// - `Err(ScrapeError)`: fatal error (engine load, corrupt PDF, …)
///
/// # Example
/// ```rust,no_run
/// use pdf_scraper::{parse_stream, EngineRegistry, ParseOptions};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("document.pdf")?;
/// let registry = EngineRegistry::pdfium();
/// let mut pages = parse_stream(bytes, &ParseOptions::default(), &registry).await?;
/// while let Some(page) = pages.next().await {
///     match page.error {
///         None => println!("--- page {} ---\n{}", page.page_num, page.text),
///         Some(e) => eprintln!("{e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn parse_stream(
    bytes: impl Into<Vec<u8>>,
    options: &ParseOptions,
    registry: &EngineRegistry,
) -> Result<PageStream, ScrapeError> {
    let bytes = bytes.into();
    let options = options.clone();
    let registry = registry.clone();
    info!("Starting streaming parse: {} bytes", bytes.len());

    let (opened_tx, opened_rx) = oneshot::channel::<Result<(), ScrapeError>>();
    let (page_tx, page_rx) = mpsc::channel::<PageText>(STREAM_BUFFER);

    tokio::task::spawn_blocking(move || {
        let engine = match registry.get_or_load(&options.engine_version) {
            Ok(engine) => engine,
            Err(e) => {
                let _ = opened_tx.send(Err(e));
                return;
            }
        };
        let walker = match DocumentWalker::open(engine.as_ref(), &bytes, &options) {
            Ok(walker) => walker,
            Err(e) => {
                let _ = opened_tx.send(Err(e));
                return;
            }
        };
        if opened_tx.send(Ok(())).is_err() {
            return;
        }

        for page in walker {
            if page_tx.blocking_send(page).is_err() {
                debug!("Page stream dropped; stopping walk");
                break;
            }
        }
    });

    opened_rx.await.map_err(|_| {
        ScrapeError::Internal("Stream task ended before opening the document".into())
    })??;

    Ok(Box::pin(ReceiverStream::new(page_rx)))
}
