//! Integration tests for the document walker and the parse entry points.
//!
//! A scripted in-memory engine stands in for PDFium, plugged in through the
//! public engine traits and a pre-seeded [`EngineRegistry`].

use futures::StreamExt;
use pdf_scraper::{
    inspect, parse, parse_input, parse_stream, parse_sync, parse_to_file, walk_document,
    DocumentInfo, DocumentWalker, EngineDocument, EngineLoader, EngineMetadata, EnginePage,
    EngineRegistry, EngineTextRenderer, MetadataError, NoopProgressCallback, PageError, ParseOptions,
    ParseProgressCallback, PdfEngine, ScrapeError, TextRun, TextRunOptions,
};
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const FAKE_VERSION: &str = "fake-1";
const PDF_BYTES: &[u8] = b"%PDF-1.7\n% scripted\n";

// ── Fake engine ──────────────────────────────────────────────────────────────

#[derive(Clone)]
enum FakePage {
    Runs(Vec<TextRun>),
    Broken,
}

struct FakeEngine {
    pages: Vec<FakePage>,
    metadata_ok: bool,
    closed: Arc<AtomicUsize>,
}

impl FakeEngine {
    fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            metadata_ok: true,
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn without_metadata(mut self) -> Self {
        self.metadata_ok = false;
        self
    }
}

impl PdfEngine for FakeEngine {
    fn version(&self) -> &str {
        FAKE_VERSION
    }

    fn open_document<'a>(
        &'a self,
        bytes: &'a [u8],
        _password: Option<&str>,
    ) -> Result<Box<dyn EngineDocument + 'a>, ScrapeError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(ScrapeError::CorruptPdf {
                detail: "missing header".into(),
            });
        }
        Ok(Box::new(FakeDocument { engine: self }))
    }
}

struct FakeDocument<'a> {
    engine: &'a FakeEngine,
}

impl EngineDocument for FakeDocument<'_> {
    fn page_count(&self) -> usize {
        self.engine.pages.len()
    }

    fn metadata(&self) -> Result<EngineMetadata, MetadataError> {
        if !self.engine.metadata_ok {
            return Err(MetadataError::new("broken info dictionary"));
        }
        let mut custom = BTreeMap::new();
        custom.insert("Source".to_string(), "scripted".to_string());
        Ok(EngineMetadata {
            info: DocumentInfo {
                title: Some("Scripted".into()),
                pdf_version: Some("1.7".into()),
                ..Default::default()
            },
            metadata: Some(custom),
        })
    }

    fn page(&self, index: usize) -> Result<Box<dyn EnginePage + '_>, PageError> {
        match self.engine.pages.get(index) {
            Some(FakePage::Runs(runs)) => Ok(Box::new(FakePageObject {
                number: index + 1,
                runs: runs.clone(),
            })),
            _ => Err(PageError::PageLoadFailed {
                page: index + 1,
                detail: "scripted failure".into(),
            }),
        }
    }
}

impl Drop for FakeDocument<'_> {
    fn drop(&mut self) {
        self.engine.closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakePageObject {
    number: usize,
    runs: Vec<TextRun>,
}

impl EnginePage for FakePageObject {
    fn number(&self) -> usize {
        self.number
    }

    fn text_runs(&self, options: &TextRunOptions) -> Result<Vec<TextRun>, PageError> {
        Ok(self.runs.iter().cloned().map(|r| options.apply(r)).collect())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn line_page(lines: &[&str]) -> FakePage {
    let runs = lines
        .iter()
        .enumerate()
        .map(|(i, l)| TextRun::new(*l, 72.0, 700.0 - 14.0 * i as f32))
        .collect();
    FakePage::Runs(runs)
}

fn three_pages() -> Vec<FakePage> {
    vec![
        line_page(&["A text"]),
        line_page(&["B text"]),
        line_page(&["C text"]),
    ]
}

fn fake_options() -> ParseOptions {
    ParseOptions::builder()
        .engine_version(FAKE_VERSION)
        .build()
        .unwrap()
}

fn registry_with(engine: FakeEngine) -> EngineRegistry {
    let registry = EngineRegistry::pdfium();
    assert!(registry.insert(Arc::new(engine)));
    registry
}

/// Fails page 2, renders every other page as its runs joined by spaces.
fn fail_second_page(
    page: &dyn EnginePage,
    options: &TextRunOptions,
) -> Result<String, PageError> {
    if page.number() == 2 {
        return Err(PageError::RenderFailed {
            page: 2,
            detail: "renderer threw".into(),
        });
    }
    let runs = page.text_runs(options)?;
    Ok(runs
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join(" "))
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ParseProgressCallback for RecordingProgress {
    fn on_parse_start(&self, total_pages: usize) {
        self.push(format!("start {total_pages}"));
    }
    fn on_page_start(&self, page_num: usize, _total_pages: usize) {
        self.push(format!("page {page_num}"));
    }
    fn on_page_complete(&self, page_num: usize, _total_pages: usize, text_len: usize) {
        self.push(format!("done {page_num} {text_len}"));
    }
    fn on_page_error(&self, page_num: usize, _total_pages: usize, _error: &str) {
        self.push(format!("error {page_num}"));
    }
    fn on_parse_complete(&self, total_pages: usize, success_count: usize) {
        self.push(format!("complete {total_pages} {success_count}"));
    }
}

// ── Walker ───────────────────────────────────────────────────────────────────

#[test]
fn renders_every_page_by_default() {
    let engine = FakeEngine::new(three_pages());
    let result = walk_document(&engine, PDF_BYTES, &fake_options()).unwrap();

    assert_eq!(result.page_count, 3);
    assert_eq!(result.rendered_pages, 3);
    assert_eq!(result.pages, vec!["A text", "B text", "C text"]);
    assert_eq!(result.text, "A text\n\nB text\n\nC text");
    assert_eq!(result.engine_version, FAKE_VERSION);
    assert!(result.is_complete());
}

#[test]
fn max_pages_limits_and_clamps() {
    let engine = FakeEngine::new(three_pages());

    for (max, expected) in [(0, 3), (1, 1), (2, 2), (3, 3), (50, 3)] {
        let options = ParseOptions::builder()
            .engine_version(FAKE_VERSION)
            .max_pages(max)
            .build()
            .unwrap();
        let result = walk_document(&engine, PDF_BYTES, &options).unwrap();
        assert_eq!(result.page_count, 3, "max_pages={max}");
        assert_eq!(result.rendered_pages, expected, "max_pages={max}");
        assert_eq!(result.pages.len(), expected, "max_pages={max}");
    }
}

#[test]
fn json_max_pages_accepts_any_number() {
    let engine = FakeEngine::new(three_pages());

    for (max, expected) in [
        (serde_json::json!(2.0), 2),
        (serde_json::json!(1.5), 1),
        (serde_json::json!(-1), 3),
        (serde_json::json!("2"), 3),
    ] {
        let mut options = ParseOptions::from_json(&serde_json::json!({ "max_pages": max }));
        options.engine_version = FAKE_VERSION.to_string();
        let result = walk_document(&engine, PDF_BYTES, &options).unwrap();
        assert_eq!(result.rendered_pages, expected, "max_pages={max}");
    }
}

#[test]
fn multi_line_pages_get_line_breaks() {
    let engine = FakeEngine::new(vec![line_page(&["Title", "first line", "second line"])]);
    let result = walk_document(&engine, PDF_BYTES, &fake_options()).unwrap();
    assert_eq!(result.pages[0], "Title\nfirst line\nsecond line");
}

#[test]
fn failing_renderer_is_isolated_to_its_page() {
    let engine = FakeEngine::new(three_pages());
    let options = ParseOptions::builder()
        .engine_version(FAKE_VERSION)
        .page_renderer(Arc::new(fail_second_page))
        .build()
        .unwrap();

    let result = walk_document(&engine, PDF_BYTES, &options).unwrap();

    assert_eq!(result.pages, vec!["A text", "", "C text"]);
    assert_eq!(result.rendered_pages, 3);
    assert_eq!(result.failed_pages(), 1);
    assert!(result.page_failed(2));
    assert!(!result.page_failed(1));
    assert_eq!(result.page_errors[0].page(), 2);
    assert!(matches!(
        result.into_result(),
        Err(ScrapeError::PartialFailure {
            failed: 1,
            total: 3
        })
    ));
}

/// Reports every failure against page 0, whatever page it was given.
fn misattributing_renderer(
    page: &dyn EnginePage,
    options: &TextRunOptions,
) -> Result<String, PageError> {
    if page.number() == 2 {
        return Err(PageError::RenderFailed {
            page: 0,
            detail: "boom".into(),
        });
    }
    Ok(page.text_runs(options)?.into_iter().map(|r| r.text).collect())
}

#[test]
fn page_errors_carry_the_walked_page_number() {
    let engine = FakeEngine::new(three_pages());
    let options = ParseOptions::builder()
        .engine_version(FAKE_VERSION)
        .page_renderer(Arc::new(misattributing_renderer))
        .build()
        .unwrap();

    let result = walk_document(&engine, PDF_BYTES, &options).unwrap();

    assert_eq!(result.pages, vec!["A text", "", "C text"]);
    assert!(result.page_failed(2));
    assert!(!result.page_failed(0));
    assert_eq!(
        result.page_errors,
        vec![PageError::RenderFailed {
            page: 2,
            detail: "boom".into()
        }]
    );
}

#[test]
fn broken_page_object_is_isolated() {
    let engine = FakeEngine::new(vec![
        line_page(&["one"]),
        FakePage::Broken,
        line_page(&["three"]),
    ]);
    let result = walk_document(&engine, PDF_BYTES, &fake_options()).unwrap();

    assert_eq!(result.pages, vec!["one", "", "three"]);
    assert_eq!(result.text, "one\n\n\n\nthree");
    assert!(matches!(
        result.page_errors.as_slice(),
        [PageError::PageLoadFailed { page: 2, .. }]
    ));
}

#[test]
fn empty_page_is_not_an_error() {
    let engine = FakeEngine::new(vec![FakePage::Runs(vec![]), line_page(&["text"])]);
    let result = walk_document(&engine, PDF_BYTES, &fake_options()).unwrap();
    assert_eq!(result.pages, vec!["", "text"]);
    assert!(result.page_errors.is_empty());
}

#[test]
fn corrupt_buffer_is_fatal() {
    let engine = FakeEngine::new(three_pages());
    let err = walk_document(&engine, b"garbage", &fake_options()).unwrap_err();
    assert!(matches!(err, ScrapeError::CorruptPdf { .. }));
    assert_eq!(engine.closed.load(Ordering::SeqCst), 0);
}

#[test]
fn metadata_failure_becomes_none() {
    let engine = FakeEngine::new(three_pages()).without_metadata();
    let result = walk_document(&engine, PDF_BYTES, &fake_options()).unwrap();
    assert!(result.info.is_none());
    assert!(result.metadata.is_none());
    assert_eq!(result.rendered_pages, 3);
}

#[test]
fn metadata_is_reported() {
    let engine = FakeEngine::new(three_pages());
    let result = walk_document(&engine, PDF_BYTES, &fake_options()).unwrap();
    let info = result.info.unwrap();
    assert_eq!(info.title.as_deref(), Some("Scripted"));
    assert_eq!(info.author, None);
    assert_eq!(
        result.metadata.unwrap().get("Source").map(String::as_str),
        Some("scripted")
    );
}

#[test]
fn document_is_released_after_walk() {
    let engine = FakeEngine::new(three_pages());
    walk_document(&engine, PDF_BYTES, &fake_options()).unwrap();
    assert_eq!(engine.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn dropping_walker_early_releases_document() {
    let engine = FakeEngine::new(three_pages());
    let progress = Arc::new(RecordingProgress::default());
    let options = ParseOptions::builder()
        .engine_version(FAKE_VERSION)
        .progress_callback(progress.clone())
        .build()
        .unwrap();

    let mut walker = DocumentWalker::open(&engine, PDF_BYTES, &options).unwrap();
    assert_eq!(walker.size_hint(), (3, Some(3)));
    let first = walker.next().unwrap();
    assert_eq!(first.page_num, 1);
    assert_eq!(walker.size_hint(), (2, Some(2)));
    drop(walker);

    assert_eq!(engine.closed.load(Ordering::SeqCst), 1);
    assert_eq!(progress.events().last().unwrap(), "complete 1 1");
}

#[test]
fn completion_totals_count_attempted_pages_after_early_drop() {
    let engine = FakeEngine::new(three_pages());
    let progress = Arc::new(RecordingProgress::default());
    let options = ParseOptions::builder()
        .engine_version(FAKE_VERSION)
        .page_renderer(Arc::new(fail_second_page))
        .progress_callback(progress.clone())
        .build()
        .unwrap();

    let walker = DocumentWalker::open(&engine, PDF_BYTES, &options).unwrap();
    let seen: Vec<_> = walker.take(2).collect();
    assert_eq!(seen.len(), 2);

    let events = progress.events();
    assert_eq!(events.first().unwrap(), "start 3");
    assert_eq!(events.last().unwrap(), "complete 2 1");
    assert_eq!(
        events.iter().filter(|e| e.starts_with("complete")).count(),
        1
    );
    assert_eq!(engine.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn noop_progress_callback_is_accepted() {
    let engine = FakeEngine::new(three_pages());
    let options = ParseOptions::builder()
        .engine_version(FAKE_VERSION)
        .progress_callback(Arc::new(NoopProgressCallback))
        .build()
        .unwrap();
    let result = walk_document(&engine, PDF_BYTES, &options).unwrap();
    assert_eq!(result.rendered_pages, 3);
}

#[test]
fn engine_text_renderer_can_be_substituted() {
    let engine = FakeEngine::new(vec![line_page(&["left", "right"])]);
    let options = ParseOptions::builder()
        .engine_version(FAKE_VERSION)
        .page_renderer(Arc::new(EngineTextRenderer))
        .build()
        .unwrap();
    let result = walk_document(&engine, PDF_BYTES, &options).unwrap();
    // The default `EnginePage::text` joins runs without line breaks.
    assert_eq!(result.pages[0], "leftright");
}

#[test]
fn text_run_options_reach_the_engine() {
    let engine = FakeEngine::new(vec![FakePage::Runs(vec![TextRun::new(
        "tab\there",
        0.0,
        10.0,
    )])]);
    let options = ParseOptions::builder()
        .engine_version(FAKE_VERSION)
        .normalize_whitespace(true)
        .build()
        .unwrap();
    let result = walk_document(&engine, PDF_BYTES, &options).unwrap();
    assert_eq!(result.pages[0], "tab here");
}

#[test]
fn progress_events_follow_page_order() {
    let engine = FakeEngine::new(three_pages());
    let progress = Arc::new(RecordingProgress::default());
    let options = ParseOptions::builder()
        .engine_version(FAKE_VERSION)
        .page_renderer(Arc::new(fail_second_page))
        .progress_callback(progress.clone())
        .build()
        .unwrap();

    walk_document(&engine, PDF_BYTES, &options).unwrap();

    assert_eq!(
        progress.events(),
        vec![
            "start 3",
            "page 1",
            "done 1 6",
            "page 2",
            "error 2",
            "page 3",
            "done 3 6",
            "complete 3 2",
        ]
    );
}

// ── Entry points ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn parse_uses_registered_engine() {
    let registry = registry_with(FakeEngine::new(three_pages()));
    let result = parse(PDF_BYTES, &fake_options(), &registry).await.unwrap();
    assert_eq!(result.pages, vec!["A text", "B text", "C text"]);
    assert_eq!(registry.loaded_versions(), vec![FAKE_VERSION.to_string()]);
}

#[test]
fn parse_sync_matches_parse() {
    let registry = registry_with(FakeEngine::new(three_pages()));
    let options = fake_options();

    let blocking = parse_sync(PDF_BYTES, &options, &registry).unwrap();
    let asynchronous = tokio_test::block_on(parse(PDF_BYTES, &options, &registry)).unwrap();

    assert_eq!(blocking.pages, asynchronous.pages);
    assert_eq!(blocking.text, asynchronous.text);
}

#[tokio::test]
async fn parse_propagates_corrupt_pdf() {
    let registry = registry_with(FakeEngine::new(three_pages()));
    let err = parse(&b"not a pdf"[..], &fake_options(), &registry)
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::CorruptPdf { .. }));
}

#[tokio::test]
async fn malformed_engine_version_is_rejected_before_loading() {
    let registry = EngineRegistry::pdfium();
    let options = ParseOptions::builder()
        .engine_version("v1.10.100")
        .build()
        .unwrap();
    let err = parse(PDF_BYTES, &options, &registry).await.unwrap_err();
    assert!(matches!(err, ScrapeError::UnsupportedEngineVersion { .. }));
    assert!(registry.loaded_versions().is_empty());
}

struct FailingLoader;

impl EngineLoader for FailingLoader {
    fn load(&self, version: &str) -> Result<Arc<dyn PdfEngine>, ScrapeError> {
        Err(ScrapeError::EngineLoad {
            version: version.to_string(),
            detail: "library missing".into(),
        })
    }
}

#[tokio::test]
async fn engine_load_failure_is_fatal() {
    let registry = EngineRegistry::new(FailingLoader);
    let err = parse(PDF_BYTES, &fake_options(), &registry)
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::EngineLoad { .. }));
}

#[tokio::test]
async fn inspect_reads_summary_without_rendering() {
    let progress = Arc::new(RecordingProgress::default());
    let registry = registry_with(FakeEngine::new(vec![
        FakePage::Broken,
        FakePage::Broken,
    ]));
    let options = ParseOptions::builder()
        .engine_version(FAKE_VERSION)
        .progress_callback(progress.clone())
        .build()
        .unwrap();

    let summary = inspect(PDF_BYTES, &options, &registry).await.unwrap();

    assert_eq!(summary.page_count, 2);
    assert_eq!(summary.engine_version, FAKE_VERSION);
    assert_eq!(
        summary.info.and_then(|i| i.title).as_deref(),
        Some("Scripted")
    );
    assert!(progress.events().is_empty());
}

#[tokio::test]
async fn parse_input_and_parse_to_file_read_local_files() {
    let registry = registry_with(FakeEngine::new(three_pages()));
    let options = fake_options();

    let mut pdf = tempfile::NamedTempFile::new().unwrap();
    pdf.write_all(PDF_BYTES).unwrap();
    let input = pdf.path().to_str().unwrap().to_string();

    let result = parse_input(&input, &options, &registry).await.unwrap();
    assert_eq!(result.rendered_pages, 3);

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("out.txt");
    let written = parse_to_file(&input, &out, &options, &registry)
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&out).unwrap(), written.text);
    assert!(!out.with_extension("txt.tmp").exists());
}

#[tokio::test]
async fn parse_input_rejects_missing_file() {
    let registry = registry_with(FakeEngine::new(three_pages()));
    let err = parse_input("/no/such/dir/file.pdf", &fake_options(), &registry)
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::FileNotFound { .. }));
}

// ── Streaming ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stream_yields_pages_in_order() {
    let registry = registry_with(FakeEngine::new(three_pages()));
    let options = ParseOptions::builder()
        .engine_version(FAKE_VERSION)
        .page_renderer(Arc::new(fail_second_page))
        .build()
        .unwrap();

    let pages: Vec<_> = parse_stream(PDF_BYTES, &options, &registry)
        .await
        .unwrap()
        .collect()
        .await;

    let numbers: Vec<usize> = pages.iter().map(|p| p.page_num).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(pages[0].text, "A text");
    assert_eq!(pages[1].text, "");
    assert!(pages[1].error.is_some());
    assert_eq!(pages[2].text, "C text");
}

#[tokio::test]
async fn stream_respects_max_pages() {
    let registry = registry_with(FakeEngine::new(three_pages()));
    let options = ParseOptions::builder()
        .engine_version(FAKE_VERSION)
        .max_pages(2)
        .build()
        .unwrap();

    let pages: Vec<_> = parse_stream(PDF_BYTES, &options, &registry)
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(pages.len(), 2);
}

#[tokio::test]
async fn stream_reports_fatal_errors_before_any_page() {
    let registry = registry_with(FakeEngine::new(three_pages()));
    let result = parse_stream(&b"junk"[..], &fake_options(), &registry).await;
    assert!(matches!(result, Err(ScrapeError::CorruptPdf { .. })));
}
