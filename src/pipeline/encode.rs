//! Image encoding: raw chart bytes → base64 `ImagePayload`.
//!
//! Deplot accepts images only inline, as a data URI inside the prompt text.
//! The hosted endpoint rejects requests whose inline image is too long, so
//! the limit is enforced here, before any request is built.

use crate::error::ChartError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use tracing::debug;

/// A chart image ready to embed in a Deplot request.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Base64 (standard alphabet, padded) encoding of the image.
    pub b64: String,
    /// MIME type advertised in the data URI.
    pub mime_type: &'static str,
    /// Size of the original image in bytes.
    pub raw_len: usize,
}

impl ImagePayload {
    /// Length of the base64 text in characters.
    pub fn encoded_len(&self) -> usize {
        self.b64.len()
    }
}

/// Encode `bytes` and enforce `max_chars` on the base64 length.
///
/// Fails with [`ChartError::EmptyImage`] for empty input and
/// [`ChartError::PayloadTooLarge`] when the encoding has `max_chars` or more
/// characters.
pub fn encode_image(bytes: &[u8], max_chars: usize) -> Result<ImagePayload, ChartError> {
    if bytes.is_empty() {
        return Err(ChartError::EmptyImage);
    }

    // Reject before allocating: base64 length is exactly 4 * ceil(n / 3).
    let encoded_len = bytes.len().div_ceil(3) * 4;
    if encoded_len >= max_chars {
        return Err(ChartError::PayloadTooLarge {
            encoded_len,
            limit: max_chars,
        });
    }

    let b64 = STANDARD.encode(bytes);
    debug_assert_eq!(b64.len(), encoded_len);
    let mime_type = sniff_mime(bytes);
    debug!(
        "Encoded {} image: {} bytes → {} chars base64",
        mime_type,
        bytes.len(),
        b64.len()
    );

    Ok(ImagePayload {
        b64,
        mime_type,
        raw_len: bytes.len(),
    })
}

/// MIME type for the data URI. Anything that is not recognisably JPEG is
/// labelled PNG, which is what the endpoint expects by default.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        _ => "image/png",
    }
}
