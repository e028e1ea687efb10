//! Caller-owned cache of loaded engines, keyed by version.
//!
//! Loading an engine (resolving and binding a shared library) is far more
//! expensive than parsing a small document, so each version is loaded at
//! most once per registry and then shared. There is no eviction.
//!
//! Every slot is a `OnceCell`: the map lock is only held long enough to find
//! or create the slot, so a slow first load of one version never blocks
//! lookups of another, and concurrent first requests for the same version
//! wait for a single load instead of racing.

use super::pdfium::PdfiumLoader;
use super::PdfEngine;
use crate::config::normalize_engine_version;
use crate::error::ScrapeError;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Produces an engine for a version identifier.
pub trait EngineLoader: Send + Sync {
    fn load(&self, version: &str) -> Result<Arc<dyn PdfEngine>, ScrapeError>;
}

type Slot = Arc<OnceCell<Arc<dyn PdfEngine>>>;

struct RegistryInner {
    loader: Box<dyn EngineLoader>,
    slots: Mutex<HashMap<String, Slot>>,
}

/// Shared handle to a set of loaded engines.
///
/// Cloning is cheap; clones see the same engines.
#[derive(Clone)]
pub struct EngineRegistry {
    inner: Arc<RegistryInner>,
}

impl EngineRegistry {
    /// A registry that loads missing versions with `loader`.
    pub fn new(loader: impl EngineLoader + 'static) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                loader: Box::new(loader),
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// A registry backed by [`PdfiumLoader`].
    pub fn pdfium() -> Self {
        Self::new(PdfiumLoader::new())
    }

    /// Return the engine for `version`, loading it on first use.
    ///
    /// Versions are keyed after [`normalize_engine_version`], so aliases
    /// such as `"default"` or `"chromium/7690"` share one slot. A failed
    /// load leaves the slot empty, so a later call retries.
    pub fn get_or_load(&self, version: &str) -> Result<Arc<dyn PdfEngine>, ScrapeError> {
        let version = normalize_engine_version(version);
        let slot = self.slot(&version);
        let engine = slot.get_or_try_init(|| {
            debug!("Loading engine {}", version);
            self.inner.loader.load(&version)
        })?;
        Ok(Arc::clone(engine))
    }

    /// Pre-seed an engine under its own [`PdfEngine::version`].
    ///
    /// Returns `false` if that version was already loaded; the existing
    /// engine is kept.
    pub fn insert(&self, engine: Arc<dyn PdfEngine>) -> bool {
        let version = engine.version().to_string();
        self.slot(&version).set(engine).is_ok()
    }

    /// Whether `version` has been loaded successfully.
    pub fn is_loaded(&self, version: &str) -> bool {
        self.lock()
            .get(&normalize_engine_version(version))
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Versions loaded so far, sorted.
    pub fn loaded_versions(&self) -> Vec<String> {
        let mut versions: Vec<String> = self
            .lock()
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(v, _)| v.clone())
            .collect();
        versions.sort();
        versions
    }

    fn slot(&self, version: &str) -> Slot {
        let key = normalize_engine_version(version);
        let mut slots = self.lock();
        Arc::clone(slots.entry(key).or_default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
        // Slots are only ever inserted, so a poisoned map is still consistent.
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::pdfium()
    }
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("loaded", &self.loaded_versions())
            .finish()
    }
}
