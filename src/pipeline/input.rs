//! Input resolution: turn a user-supplied path or URL into PDF bytes.
//!
//! Engines open documents from memory, so both local files and URLs end up
//! as a `Vec<u8>`. The PDF magic bytes (`%PDF`) are checked up front so a
//! wrong file gets a clear error instead of an engine-specific one.

use crate::error::ScrapeError;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read the PDF behind `input`, downloading it if it is a URL.
pub async fn load_input(input: &str, timeout_secs: u64) -> Result<Vec<u8>, ScrapeError> {
    if input.trim().is_empty() {
        return Err(ScrapeError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

/// Reject buffers that clearly are not PDFs.
///
/// Buffers shorter than the magic are left to the engine to reject.
pub fn check_magic(bytes: &[u8], source_name: &str) -> Result<(), ScrapeError> {
    if bytes.len() >= PDF_MAGIC.len() && &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(ScrapeError::NotAPdf {
            source_name: source_name.to_string(),
            magic,
        });
    }
    Ok(())
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, ScrapeError> {
    let path = PathBuf::from(path_str);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ScrapeError::PermissionDenied { path: path.clone() },
        _ => ScrapeError::FileNotFound { path: path.clone() },
    })?;

    check_magic(&bytes, path_str)?;
    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, ScrapeError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ScrapeError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            ScrapeError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ScrapeError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(classify)?;

    if !response.status().is_success() {
        return Err(ScrapeError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(classify)?;
    check_magic(&bytes, url)?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}
