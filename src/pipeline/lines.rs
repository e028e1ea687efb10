//! Page renderers: turn one engine page into a string.
//!
//! PDF content streams carry no line-break markers for flowed text, only
//! positioned fragments. [`reconstruct_lines`] recovers line breaks from
//! changes in a run's vertical position:
//!
//! ```text
//! runs:   "Hello" y=700   " world" y=700   "Next" y=686
//! output: "Hello world\nNext"
//! ```
//!
//! Only exact equality of `y` is checked. There is no tolerance and no
//! horizontal-gap splitting, so superscripts and mixed baselines break lines.

use crate::engine::{EnginePage, TextRun, TextRunOptions};
use crate::error::PageError;

/// Renders one page to text. The default is [`LineReconstructor`].
///
/// Closures with the matching signature implement this trait:
///
/// ```rust
/// use pdf_scraper::{EnginePage, PageError, PageRenderer, TextRunOptions};
///
/// let first_run_only = |page: &dyn EnginePage, opts: &TextRunOptions| -> Result<String, PageError> {
///     Ok(page.text_runs(opts)?.into_iter().next().map(|r| r.text).unwrap_or_default())
/// };
/// fn assert_renderer(_: &impl PageRenderer) {}
/// assert_renderer(&first_run_only);
/// ```
pub trait PageRenderer: Send + Sync {
    fn render(&self, page: &dyn EnginePage, options: &TextRunOptions) -> Result<String, PageError>;
}

impl<F> PageRenderer for F
where
    F: Fn(&dyn EnginePage, &TextRunOptions) -> Result<String, PageError> + Send + Sync,
{
    fn render(&self, page: &dyn EnginePage, options: &TextRunOptions) -> Result<String, PageError> {
        self(page, options)
    }
}

/// Rebuilds line breaks from vertical position changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineReconstructor;

impl PageRenderer for LineReconstructor {
    fn render(&self, page: &dyn EnginePage, options: &TextRunOptions) -> Result<String, PageError> {
        let runs = page.text_runs(options)?;
        Ok(reconstruct_lines(&runs))
    }
}

/// Uses the engine's own plain-text output and reading order.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineTextRenderer;

impl PageRenderer for EngineTextRenderer {
    fn render(&self, page: &dyn EnginePage, _options: &TextRunOptions) -> Result<String, PageError> {
        page.text()
    }
}

/// Join runs, starting a new line whenever `y` differs from the previous run.
pub fn reconstruct_lines<'a, I>(runs: I) -> String
where
    I: IntoIterator<Item = &'a TextRun>,
{
    let mut text = String::new();
    let mut last_y: Option<f32> = None;

    for run in runs {
        match last_y {
            Some(y) if y != run.y => text.push('\n'),
            _ => {}
        }
        text.push_str(&run.text);
        last_y = Some(run.y);
    }

    text
}
