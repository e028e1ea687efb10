//! End-to-end integration tests for pdf-scraper.
//!
//! These tests use real PDF files in `./test_cases/` and a real PDFium
//! library (downloaded on first use, or taken from `PDFIUM_LIB_PATH`).
//! They are gated behind the `E2E_ENABLED` environment variable so they do
//! not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_inspect -- --nocapture

use futures::StreamExt;
use pdf_scraper::{
    inspect, parse, parse_stream, parse_to_file, EngineRegistry, EngineTextRenderer,
    ParseOptions, ScrapeError, DEFAULT_ENGINE_VERSION,
};
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::Arc;

/// One registry for the whole suite, so PDFium is bound only once per process.
static REGISTRY: Lazy<EngineRegistry> = Lazy::new(EngineRegistry::pdfium);

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        init_tracing();
        p
    }};
}

/// Route library logs through the test harness; `RUST_LOG` picks the level.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pdf_scraper=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Basic sanity checks on extracted page text.
fn assert_text_quality(text: &str, context: &str) {
    assert!(!text.trim().is_empty(), "[{context}] text is empty");
    assert!(
        !text.contains('\u{0}'),
        "[{context}] text contains NUL characters"
    );
    assert!(
        text.lines().count() > 1,
        "[{context}] expected line breaks in extracted text"
    );
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_inspect() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let registry = &*REGISTRY;
    let bytes = std::fs::read(&path).unwrap();

    let summary = inspect(bytes, &ParseOptions::default(), registry)
        .await
        .expect("inspect failed");

    println!("{summary:#?}");
    assert!(summary.page_count > 0);
    assert_eq!(summary.engine_version, DEFAULT_ENGINE_VERSION);
    assert!(registry.is_loaded(DEFAULT_ENGINE_VERSION));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_parse_first_pages() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let registry = &*REGISTRY;
    let bytes = std::fs::read(&path).unwrap();
    let options = ParseOptions::builder().max_pages(2).build().unwrap();

    let result = parse(bytes, &options, registry).await.expect("parse failed");

    assert_eq!(result.rendered_pages, result.page_count.min(2));
    assert_eq!(result.pages.len(), result.rendered_pages);
    assert!(result.is_complete(), "page errors: {:?}", result.page_errors);
    assert_text_quality(&result.pages[0], "sample.pdf page 1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_renderers_agree_on_content() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let registry = &*REGISTRY;
    let bytes = std::fs::read(&path).unwrap();

    let lines = parse(bytes.clone(), &ParseOptions::default(), registry)
        .await
        .unwrap();
    let engine_options = ParseOptions::builder()
        .page_renderer(Arc::new(EngineTextRenderer))
        .build()
        .unwrap();
    let native = parse(bytes, &engine_options, registry).await.unwrap();

    // Same characters, possibly different whitespace.
    let squash = |s: &str| s.split_whitespace().collect::<String>();
    assert_eq!(squash(&lines.pages[0]), squash(&native.pages[0]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stream_matches_eager_parse() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let registry = &*REGISTRY;
    let bytes = std::fs::read(&path).unwrap();
    let options = ParseOptions::default();

    let eager = parse(bytes.clone(), &options, registry).await.unwrap();
    let streamed: Vec<String> = parse_stream(bytes, &options, registry)
        .await
        .unwrap()
        .map(|p| p.text)
        .collect()
        .await;

    assert_eq!(streamed, eager.pages);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_parse_to_file() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let registry = &*REGISTRY;
    let out = output_dir().join("sample.txt");

    let result = parse_to_file(
        path.to_str().unwrap(),
        &out,
        &ParseOptions::default(),
        registry,
    )
    .await
    .expect("parse_to_file failed");

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written, result.text);
    println!("wrote {} bytes to {}", written.len(), out.display());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_corrupt_pdf_is_fatal() {
    let _ = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let registry = &*REGISTRY;

    let err = parse(
        &b"%PDF-1.7\nthis is not really a pdf"[..],
        &ParseOptions::default(),
        registry,
    )
    .await
    .unwrap_err();
    assert!(
        matches!(err, ScrapeError::CorruptPdf { .. }),
        "unexpected error: {err:?}"
    );
}
