//! Input resolution: normalise a user-supplied path or URL to image bytes.
//!
//! Charts are small (the endpoint caps them well under 200 KB), so the
//! bytes are kept in memory; no temp files are involved. Both sources are
//! checked against the PNG/JPEG magic bytes before returning, so a stray
//! PDF or HTML error page is reported here rather than as an opaque
//! endpoint failure.

use crate::error::ChartError;
use image::ImageFormat;
use std::path::PathBuf;
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to raw image bytes.
///
/// URLs are downloaded with `timeout_secs`; anything else is treated as a
/// local path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<Vec<u8>, ChartError> {
    if input.trim().is_empty() {
        return Err(ChartError::InvalidInput {
            input: input.to_string(),
        });
    }
    let bytes = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };
    ensure_supported_image(input, &bytes)?;
    Ok(bytes)
}

/// Accept only PNG and JPEG, the formats the endpoint understands.
pub fn ensure_supported_image(source_name: &str, bytes: &[u8]) -> Result<(), ChartError> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) | Ok(ImageFormat::Jpeg) => Ok(()),
        _ => Err(ChartError::UnsupportedImage {
            source_name: source_name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        }),
    }
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, ChartError> {
    let path = PathBuf::from(path_str);

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ChartError::PermissionDenied { path })
        }
        Err(_) => Err(ChartError::FileNotFound { path }),
    }
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, ChartError> {
    info!("Downloading chart from: {}", url);

    let failed = |reason: String| ChartError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ChartError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| failed(e.to_string()))?;
    debug!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}
