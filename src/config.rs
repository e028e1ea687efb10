//! Configuration types for text extraction.
//!
//! All extraction behaviour is controlled through [`ParseOptions`], built
//! via its [`ParseOptionsBuilder`] or normalised from loosely-typed JSON with
//! [`ParseOptions::from_json`].

use crate::engine::TextRunOptions;
use crate::error::ScrapeError;
use crate::pipeline::lines::{LineReconstructor, PageRenderer};
use crate::progress::ProgressCallback;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Engine version used when none (or `"default"`) is requested.
pub const DEFAULT_ENGINE_VERSION: &str = pdfium_auto::DEFAULT_PDFIUM_VERSION;

/// Map the `"default"` alias (and blank input) onto [`DEFAULT_ENGINE_VERSION`]
/// and strip a `chromium/` release prefix, so `"chromium/7690"` and `"7690"`
/// name the same engine.
///
/// Any other string is kept as-is (trimmed); whether it names a loadable
/// engine is decided by the registry's loader.
pub fn normalize_engine_version(version: &str) -> String {
    let v = version.trim();
    let v = v.strip_prefix(CHROMIUM_PREFIX).unwrap_or(v).trim();
    if v.is_empty() || v.eq_ignore_ascii_case("default") {
        DEFAULT_ENGINE_VERSION.to_string()
    } else {
        v.to_string()
    }
}

const CHROMIUM_PREFIX: &str = "chromium/";

/// Options for one parse.
///
/// # Example
/// ```rust
/// use pdf_scraper::ParseOptions;
///
/// let options = ParseOptions::builder()
///     .max_pages(10)
///     .engine_version("default")
///     .normalize_whitespace(true)
///     .build()
///     .unwrap();
/// assert_eq!(options.max_pages, 10);
/// ```
#[derive(Clone)]
pub struct ParseOptions {
    /// Turns each page into text. Default: [`LineReconstructor`].
    pub page_renderer: Arc<dyn PageRenderer>,

    /// Render at most this many pages from the start. `0` renders all. Default: 0.
    pub max_pages: usize,

    /// Engine build to use. Default: [`DEFAULT_ENGINE_VERSION`].
    pub engine_version: String,

    /// Options passed to the engine when fetching text runs.
    pub text_run_options: TextRunOptions,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Per-page progress events.
    pub progress_callback: Option<ProgressCallback>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            page_renderer: Arc::new(LineReconstructor),
            max_pages: 0,
            engine_version: DEFAULT_ENGINE_VERSION.to_string(),
            text_run_options: TextRunOptions::default(),
            password: None,
            progress_callback: None,
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("page_renderer", &"<dyn PageRenderer>")
            .field("max_pages", &self.max_pages)
            .field("engine_version", &self.engine_version)
            .field("text_run_options", &self.text_run_options)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ParseProgressCallback>"),
            )
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl ParseOptions {
    /// Create a new builder for `ParseOptions`.
    pub fn builder() -> ParseOptionsBuilder {
        ParseOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Number of pages to render for a document with `page_count` pages.
    pub fn pages_to_render(&self, page_count: usize) -> usize {
        if self.max_pages == 0 {
            page_count
        } else {
            self.max_pages.min(page_count)
        }
    }

    /// Build options from loosely-typed JSON, falling back to the default
    /// for every missing or mistyped field.
    ///
    /// Recognised keys: `max_pages` (number; `<= 0` renders all, fractions
    /// round down), `engine_version`
    /// (string), `normalize_whitespace`, `combine_text_items` (booleans),
    /// `password` (string), `download_timeout_secs` (positive integer).
    /// The page renderer and progress callback cannot be expressed in JSON
    /// and keep their defaults.
    ///
    /// ```rust
    /// use pdf_scraper::ParseOptions;
    /// use serde_json::json;
    ///
    /// let o = ParseOptions::from_json(&json!({ "max_pages": "ten", "engine_version": "default" }));
    /// assert_eq!(o.max_pages, 0);
    /// assert_eq!(o.engine_version, pdf_scraper::DEFAULT_ENGINE_VERSION);
    /// ```
    pub fn from_json(value: &Value) -> Self {
        let mut options = Self::default();

        match value.get("max_pages") {
            None | Some(Value::Null) => {}
            Some(v) => match v.as_f64().filter(|n| n.is_finite()) {
                // Saturating cast: negatives become 0 (all pages), fractions floor.
                Some(n) => options.max_pages = n.max(0.0).floor() as usize,
                None => warn!("Ignoring max_pages {v}: expected a number"),
            },
        }

        match value.get("engine_version") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => options.engine_version = normalize_engine_version(s),
            Some(v) => warn!("Ignoring engine_version {v}: expected a string"),
        }

        if let Some(b) = value.get("normalize_whitespace").and_then(Value::as_bool) {
            options.text_run_options.normalize_whitespace = b;
        }
        if let Some(b) = value.get("combine_text_items").and_then(Value::as_bool) {
            options.text_run_options.combine_text_items = b;
        }
        if let Some(p) = value.get("password").and_then(Value::as_str) {
            options.password = Some(p.to_string());
        }
        if let Some(secs) = value
            .get("download_timeout_secs")
            .and_then(Value::as_u64)
            .filter(|&s| s > 0)
        {
            options.download_timeout_secs = secs;
        }

        options
    }
}

/// Builder for [`ParseOptions`].
pub struct ParseOptionsBuilder {
    options: ParseOptions,
}

impl fmt::Debug for ParseOptionsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptionsBuilder")
            .field("options", &self.options)
            .finish()
    }
}

impl ParseOptionsBuilder {
    pub fn page_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.options.page_renderer = renderer;
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.options.max_pages = n;
        self
    }

    pub fn engine_version(mut self, version: impl AsRef<str>) -> Self {
        self.options.engine_version = normalize_engine_version(version.as_ref());
        self
    }

    pub fn text_run_options(mut self, opts: TextRunOptions) -> Self {
        self.options.text_run_options = opts;
        self
    }

    pub fn normalize_whitespace(mut self, v: bool) -> Self {
        self.options.text_run_options.normalize_whitespace = v;
        self
    }

    pub fn combine_text_items(mut self, v: bool) -> Self {
        self.options.text_run_options.combine_text_items = v;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.options.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.options.progress_callback = Some(cb);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.options.download_timeout_secs = secs;
        self
    }

    /// Build the options, validating constraints.
    pub fn build(self) -> Result<ParseOptions, ScrapeError> {
        if self.options.download_timeout_secs == 0 {
            return Err(ScrapeError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.options)
    }
}
