//! Pipeline stages for PDF text extraction.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ walk ──────────────▶ lines
//! (path/URL) (open, page loop)   (runs → text, per page)
//! ```
//!
//! 1. [`input`]: turn a user-supplied path or URL into PDF bytes
//! 2. [`walk`]: open the document with an engine and visit pages in order;
//!    the only stage that talks to the engine's document model
//! 3. [`lines`]: the pluggable per-page renderer, by default the
//!    vertical-position line reconstructor

pub mod input;
pub mod lines;
pub mod walk;
