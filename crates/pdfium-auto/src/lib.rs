//! # pdfium-auto
//!
//! Resolve a [PDFium](https://pdfium.googlesource.com/pdfium/) shared library
//! for a specific release tag and bind it with `pdfium-render`.
//!
//! Several PDFium builds can coexist on disk: every release tag gets its own
//! cache directory, so callers can pin documents to the engine build they
//! were validated against.
//!
//! ## Resolution order
//!
//! For a requested release tag (e.g. `"7690"` or `"chromium/7690"`):
//!
//! 1. `PDFIUM_LIB_PATH`: an existing library file; skips the cache entirely.
//! 2. `{cache}/pdfium-{tag}/libpdfium.{so,dylib}` / `pdfium.dll` if present.
//! 3. Download `pdfium-{os}-{arch}.tgz` for that tag from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries)
//!    and extract the library into the cache directory.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pdfium_auto::{bind_pdfium, DEFAULT_PDFIUM_VERSION};
//!
//! let pdfium = bind_pdfium(DEFAULT_PDFIUM_VERSION, None).expect("PDFium unavailable");
//! ```
//!
//! ## Environment variable overrides
//!
//! - `PDFIUM_LIB_PATH`: path to an existing pdfium library; skips download.
//! - `PDFIUM_AUTO_CACHE_DIR`: override the default cache root.

use std::io::Read;
use std::path::{Path, PathBuf};

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Release tag used when the caller does not pin one.
///
/// Maps to [`bblanchon/pdfium-binaries chromium/7690`](https://github.com/bblanchon/pdfium-binaries/releases/tag/chromium%2F7690).
pub const DEFAULT_PDFIUM_VERSION: &str = "7690";

/// GitHub release base URL.
const BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Prefix used by upstream release tags.
const TAG_PREFIX: &str = "chromium/";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by pdfium-auto operations.
#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    /// The release tag is not of the form `NNNN` / `chromium/NNNN`.
    #[error("Invalid PDFium release tag '{0}': expected digits, optionally prefixed with 'chromium/'")]
    InvalidVersion(String),

    /// The current OS/architecture combination is not supported.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// Could not create or navigate the local cache directory.
    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    /// Network download failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// gzip/tar extraction failed.
    #[error("Archive extraction failed: {0}")]
    Extract(String),

    /// `libloading` / `pdfium-render` could not load the library.
    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

// ── Release tags ─────────────────────────────────────────────────────────────

/// Strip the optional `chromium/` prefix and validate the remaining tag.
///
/// ```
/// assert_eq!(pdfium_auto::normalize_version("chromium/7690").unwrap(), "7690");
/// assert!(pdfium_auto::normalize_version("latest").is_err());
/// ```
pub fn normalize_version(version: &str) -> Result<&str, PdfiumAutoError> {
    let trimmed = version.trim();
    let tag = trimmed.strip_prefix(TAG_PREFIX).unwrap_or(trimmed);
    if tag.is_empty() || !tag.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PdfiumAutoError::InvalidVersion(version.to_string()));
    }
    Ok(tag)
}

// ── Internal: platform metadata ──────────────────────────────────────────────

struct PlatformInfo {
    /// Asset filename in the GitHub release, e.g. `pdfium-mac-arm64.tgz`.
    archive_name: &'static str,
    /// Relative path inside the archive, e.g. `lib/libpdfium.dylib`.
    lib_path_in_archive: &'static str,
    /// Filename to write on disk, e.g. `libpdfium.dylib`.
    lib_name: &'static str,
}

fn detect_platform() -> Result<PlatformInfo, PdfiumAutoError> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;

    let (archive_name, lib_path_in_archive, lib_name) = match (os, arch) {
        ("macos", "aarch64") => ("pdfium-mac-arm64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib"),
        ("macos", "x86_64") => ("pdfium-mac-x64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib"),
        ("linux", "x86_64") => ("pdfium-linux-x64.tgz", "lib/libpdfium.so", "libpdfium.so"),
        ("linux", "aarch64") => ("pdfium-linux-arm64.tgz", "lib/libpdfium.so", "libpdfium.so"),
        ("windows", "x86_64") => ("pdfium-win-x64.tgz", "bin/pdfium.dll", "pdfium.dll"),
        ("windows", "aarch64") => ("pdfium-win-arm64.tgz", "bin/pdfium.dll", "pdfium.dll"),
        ("windows", "x86") => ("pdfium-win-x86.tgz", "bin/pdfium.dll", "pdfium.dll"),
        (os, arch) => {
            return Err(PdfiumAutoError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            })
        }
    };

    Ok(PlatformInfo {
        archive_name,
        lib_path_in_archive,
        lib_name,
    })
}

// ── Cache directory resolution ───────────────────────────────────────────────

/// Returns the cache directory for one PDFium release tag.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/pdf-scraper/pdfium-{TAG}/`
/// - **Linux**: `~/.cache/pdf-scraper/pdfium-{TAG}/`
/// - **Windows**: `%LOCALAPPDATA%\pdf-scraper\pdfium-{TAG}\`
///
/// Override the root by setting `PDFIUM_AUTO_CACHE_DIR`.
pub fn pdfium_cache_dir(version: &str) -> Result<PathBuf, PdfiumAutoError> {
    let tag = normalize_version(version)?;

    if let Ok(override_dir) = std::env::var("PDFIUM_AUTO_CACHE_DIR") {
        return Ok(PathBuf::from(override_dir).join(format!("pdfium-{tag}")));
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    Ok(base.join("pdf-scraper").join(format!("pdfium-{tag}")))
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns the on-disk path to the library for `version`, or `None` if it
/// would have to be downloaded first.
///
/// `PDFIUM_LIB_PATH` wins when it points at an existing file.
pub fn cached_pdfium_path(version: &str) -> Option<PathBuf> {
    if let Some(p) = env_override() {
        return Some(p);
    }
    let info = detect_platform().ok()?;
    let p = pdfium_cache_dir(version).ok()?.join(info.lib_name);
    p.exists().then_some(p)
}

/// Returns `true` if binding `version` needs no network access.
pub fn is_pdfium_cached(version: &str) -> bool {
    cached_pdfium_path(version).is_some()
}

/// Ensures the PDFium library for `version` is present locally and returns
/// its path.
///
/// `on_progress` receives `(bytes_downloaded, total_size_option)` during
/// the download.  Pass `None` to suppress progress callbacks.
pub fn ensure_pdfium_library(
    version: &str,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, PdfiumAutoError> {
    let tag = normalize_version(version)?;

    if let Some(p) = env_override() {
        return Ok(p);
    }
    if let Ok(env_path) = std::env::var("PDFIUM_LIB_PATH") {
        // Set but missing: fall through to the cache / download path.
        eprintln!(
            "pdfium-auto: PDFIUM_LIB_PATH '{}' not found; resolving chromium/{tag} instead",
            env_path
        );
    }

    let info = detect_platform()?;
    let cache_dir = pdfium_cache_dir(tag)?;
    let lib_path = cache_dir.join(info.lib_name);

    if lib_path.exists() {
        return Ok(lib_path);
    }

    let url = release_url(tag, info.archive_name);

    std::fs::create_dir_all(&cache_dir).map_err(PdfiumAutoError::CacheDir)?;

    let archive_bytes = download_bytes(&url, on_progress)?;
    extract_library(&archive_bytes, info.lib_path_in_archive, &lib_path)?;

    Ok(lib_path)
}

/// Binds to the PDFium build for `version`, downloading it first if necessary.
pub fn bind_pdfium(
    version: &str,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<Pdfium, PdfiumAutoError> {
    let lib_path = ensure_pdfium_library(version, on_progress)?;
    bind_pdfium_from_path(&lib_path)
}

/// Binds to a PDFium library at an explicit `path`.
///
/// Does not interact with the download / cache layer.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn env_override() -> Option<PathBuf> {
    let p = PathBuf::from(std::env::var("PDFIUM_LIB_PATH").ok()?);
    p.exists().then_some(p)
}

fn release_url(tag: &str, archive_name: &str) -> String {
    format!("{BASE_URL}/chromium%2F{tag}/{archive_name}")
}

/// Streams a URL into a `Vec<u8>`, calling `on_progress` every 64 KiB.
fn download_bytes(
    url: &str,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<Vec<u8>, PdfiumAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumAutoError::Download(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumAutoError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PdfiumAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let capacity = total.unwrap_or(35 * 1024 * 1024) as usize;
    let mut buf = Vec::with_capacity(capacity);

    let mut stream = response;
    let mut chunk = vec![0u8; 64 * 1024];
    let mut downloaded: u64 = 0;

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                downloaded += n as u64;
                if let Some(cb) = on_progress {
                    cb(downloaded, total);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(PdfiumAutoError::Download(format!("Read error: {e}")));
            }
        }
    }

    Ok(buf)
}

/// Extracts a single file from a gzipped tar archive into `dest_path`.
fn extract_library(
    archive_bytes: &[u8],
    lib_path_in_archive: &str,
    dest_path: &Path,
) -> Result<(), PdfiumAutoError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let gz = GzDecoder::new(archive_bytes);
    let mut archive = Archive::new(gz);

    for entry in archive
        .entries()
        .map_err(|e| PdfiumAutoError::Extract(e.to_string()))?
    {
        let mut entry = entry.map_err(|e| PdfiumAutoError::Extract(e.to_string()))?;
        let is_match = entry
            .path()
            .map_err(|e| PdfiumAutoError::Extract(e.to_string()))?
            .to_string_lossy()
            == lib_path_in_archive;

        if is_match {
            entry
                .unpack(dest_path)
                .map_err(|e| PdfiumAutoError::Extract(format!("Unpack failed: {e}")))?;
            return Ok(());
        }
    }

    Err(PdfiumAutoError::Extract(format!(
        "Library '{lib_path_in_archive}' not found in archive"
    )))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
