//! CLI binary for pdf-scraper.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ParseOptions` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_scraper::pipeline::input::load_input;
use pdf_scraper::{
    inspect, normalize_engine_version, parse_input, parse_to_file, EngineRegistry,
    EngineTextRenderer, LineReconstructor, ParseOptions, ParseProgressCallback, PdfiumLoader,
    ProgressCallback,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the page currently being rendered. Pages run one at a time.
    page_started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_parse_start` tells us the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
    }

    fn elapsed_secs(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ParseProgressCallback for CliProgressCallback {
    fn on_parse_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting text from {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut t) = self.page_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{:.2}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{:.2}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_parse_complete(&self, total_pages: usize, success_count: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages extracted",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages extracted  ({} failed)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract text to stdout
  pdf-scraper document.pdf

  # Write to a file
  pdf-scraper document.pdf -o document.txt

  # First 5 pages only
  pdf-scraper --max-pages 5 report.pdf

  # From a URL, as JSON
  pdf-scraper https://arxiv.org/pdf/1706.03762 --json > attention.json

  # Page count and document info only
  pdf-scraper --inspect-only document.pdf

  # Pin a PDFium release
  pdf-scraper --engine-version 6996 document.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium (skips auto-download)
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Override the log filter (e.g. pdf_scraper=debug)

  PDFium (~30 MB) is downloaded on first use of each release and cached in
  ~/.cache/pdf-scraper/pdfium-{TAG}/.
"#;

/// Extract line-broken text from PDF files and URLs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-scraper",
    version,
    about = "Extract line-broken text from PDF files and URLs",
    long_about = "Extract the text of PDF documents (local files or URLs) with PDFium, \
rebuilding line breaks from the vertical position of each text run.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write text to this file instead of stdout.
    #[arg(short, long, env = "PDF_SCRAPER_OUTPUT")]
    output: Option<PathBuf>,

    /// Render at most this many pages from the start (0 = all).
    #[arg(long, env = "PDF_SCRAPER_MAX_PAGES", default_value_t = 0)]
    max_pages: usize,

    /// PDFium release tag, e.g. 7690 or chromium/7690.
    #[arg(long, env = "PDF_SCRAPER_ENGINE_VERSION", default_value = "default")]
    engine_version: String,

    /// Bind this libpdfium file instead of resolving a release.
    #[arg(long, env = "PDF_SCRAPER_LIB_PATH")]
    lib_path: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF_SCRAPER_PASSWORD")]
    password: Option<String>,

    /// Replace every whitespace character in the text with a plain space.
    #[arg(long, env = "PDF_SCRAPER_NORMALIZE_WHITESPACE")]
    normalize_whitespace: bool,

    /// Emit one text run per character instead of per text segment.
    #[arg(long, env = "PDF_SCRAPER_NO_COMBINE")]
    no_combine: bool,

    /// Page renderer: lines (rebuild line breaks) or engine (PDFium's own text).
    #[arg(long, env = "PDF_SCRAPER_RENDERER", value_enum, default_value = "lines")]
    renderer: RendererArg,

    /// Output the full result as JSON instead of plain text.
    #[arg(long, env = "PDF_SCRAPER_JSON")]
    json: bool,

    /// Exit with an error if any page failed to render.
    #[arg(long, env = "PDF_SCRAPER_STRICT")]
    strict: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_SCRAPER_NO_PROGRESS")]
    no_progress: bool,

    /// Print page count and document info only.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_SCRAPER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_SCRAPER_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF_SCRAPER_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum RendererArg {
    Lines,
    Engine,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let engine_version = normalize_engine_version(&cli.engine_version);

    // ── Ensure PDFium engine is available ────────────────────────────────
    let registry = match cli.lib_path {
        Some(ref path) => EngineRegistry::new(PdfiumLoader::from_path(path)),
        None => {
            ensure_engine(&engine_version, cli.quiet)?;
            EngineRegistry::pdfium()
        }
    };

    let progress_cb: Option<ProgressCallback> = if show_progress && !cli.inspect_only {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn ParseProgressCallback>)
    } else {
        None
    };
    let options = build_options(&cli, engine_version, progress_cb)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let bytes = load_input(&cli.input, options.download_timeout_secs)
            .await
            .context("Failed to read PDF")?;
        let summary = inspect(bytes, &options, &registry)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
            );
            return Ok(());
        }

        println!("File:         {}", cli.input);
        println!("Pages:        {}", summary.page_count);
        println!("Engine:       chromium/{}", summary.engine_version);
        if let Some(ref info) = summary.info {
            let fields = [
                ("Title", &info.title),
                ("Author", &info.author),
                ("Subject", &info.subject),
                ("Keywords", &info.keywords),
                ("Creator", &info.creator),
                ("Producer", &info.producer),
                ("Created", &info.creation_date),
                ("Modified", &info.modification_date),
                ("PDF Version", &info.pdf_version),
            ];
            for (label, value) in fields {
                if let Some(v) = value {
                    println!("{:<13} {}", format!("{label}:"), v);
                }
            }
        } else {
            println!("Info:         {}", dim("unavailable"));
        }
        return Ok(());
    }

    // ── Run extraction ───────────────────────────────────────────────────
    let start = Instant::now();
    let result = match cli.output {
        Some(ref output_path) => {
            let result = parse_to_file(&cli.input, output_path, &options, &registry)
                .await
                .context("Extraction failed")?;
            if !cli.quiet {
                eprintln!(
                    "{}  {}/{} pages  {}ms  →  {}",
                    if result.is_complete() {
                        green("✔")
                    } else {
                        cyan("⚠")
                    },
                    result.rendered_pages - result.failed_pages(),
                    result.rendered_pages,
                    start.elapsed().as_millis(),
                    bold(&output_path.display().to_string()),
                );
            }
            result
        }
        None => {
            let result = parse_input(&cli.input, &options, &registry)
                .await
                .context("Extraction failed")?;

            if cli.json {
                let json =
                    serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
                println!("{json}");
            } else {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle
                    .write_all(result.text.as_bytes())
                    .context("Failed to write to stdout")?;
                if !result.text.ends_with('\n') {
                    handle.write_all(b"\n").ok();
                }
            }

            if !cli.quiet && !show_progress {
                eprintln!(
                    "Extracted {}/{} pages ({} in document) in {}ms",
                    result.rendered_pages - result.failed_pages(),
                    result.rendered_pages,
                    result.page_count,
                    start.elapsed().as_millis()
                );
            }
            result
        }
    };

    if cli.strict {
        result.into_result().context("Some pages failed")?;
    }

    Ok(())
}

/// Download the PDFium build for `version` if it is not cached yet.
fn ensure_engine(version: &str, quiet: bool) -> Result<()> {
    // Malformed tags are reported by the loader with a proper error.
    if pdfium_auto::normalize_version(version).is_err() || pdfium_auto::is_pdfium_cached(version)
    {
        return Ok(());
    }

    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(version, None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix(format!("PDFium {version}"));
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(
            version,
            Some(&|downloaded, total| {
                if let Some(t) = total {
                    if bar.length() != Some(t) {
                        bar.set_length(t);
                    }
                }
                bar.set_position(downloaded);
            }),
        )
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

/// Map CLI args to `ParseOptions`.
fn build_options(
    cli: &Cli,
    engine_version: String,
    progress: Option<ProgressCallback>,
) -> Result<ParseOptions> {
    let mut builder = ParseOptions::builder()
        .max_pages(cli.max_pages)
        .engine_version(engine_version)
        .normalize_whitespace(cli.normalize_whitespace)
        .combine_text_items(!cli.no_combine)
        .download_timeout_secs(cli.download_timeout);

    builder = match cli.renderer {
        RendererArg::Lines => builder.page_renderer(Arc::new(LineReconstructor)),
        RendererArg::Engine => builder.page_renderer(Arc::new(EngineTextRenderer)),
    };
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
