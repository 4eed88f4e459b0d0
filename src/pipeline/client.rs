//! Deplot interaction: validate, build the request, and call the endpoint.
//!
//! All prompt text lives in [`crate::prompts`]; this module owns credential
//! checks, the size gate, retry/backoff and error mapping.
//!
//! ## Retry Strategy
//!
//! By default exactly one request is sent. With `max_retries > 0`, transient
//! failures (transport, timeout, 429, 5xx) are retried with exponential
//! backoff `retry_backoff_ms * 2^(attempt-1)`, capped at
//! [`MAX_BACKOFF_MS`]. Permanent failures (401, 400,
//! malformed JSON) return immediately.

use crate::config::ExtractionConfig;
use crate::error::{ApiError, ChartError};
use crate::pipeline::encode::encode_image;
use crate::pipeline::request::{ExtractionRequest, ExtractionResponse};
use crate::pipeline::transport::{DeplotTransport, HttpRequest, ReqwestTransport};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Upper bound on a single backoff sleep.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Outcome of a successful call, with bookkeeping for stats.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub response: ExtractionResponse,
    /// Base64 length of the image that was sent.
    pub encoded_len: usize,
    /// Number of HTTP requests issued (1 unless retries happened).
    pub attempts: u32,
    pub duration_ms: u64,
}

/// Send a chart image to Deplot and return the decoded response.
///
/// Checks run in this order, and each failure returns before any network
/// access: credential present, image non-empty, base64 length below
/// `config.max_payload_chars`.
///
/// # Errors
/// * [`ChartError::MissingCredential`]: no (or blank) API key
/// * [`ChartError::EmptyImage`] / [`ChartError::PayloadTooLarge`]
/// * [`ChartError::Api`]: transport failure, timeout, non-2xx, or a body
///   that does not match the response schema
pub async fn extract_chart_data(
    image_bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionResponse, ChartError> {
    call_deplot(image_bytes, config).await.map(|o| o.response)
}

/// Same as [`extract_chart_data`], also reporting attempts and timing.
pub async fn call_deplot(
    image_bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<CallOutcome, ChartError> {
    let start = Instant::now();

    let api_key = config.credential().ok_or(ChartError::MissingCredential)?;
    let payload = encode_image(image_bytes, config.max_payload_chars)?;

    let request = ExtractionRequest::for_chart(&payload, config);
    let body = serde_json::to_vec(&request)
        .map_err(|e| ChartError::Internal(format!("Failed to serialise request: {}", e)))?;

    let http_request = HttpRequest {
        url: config.endpoint.clone(),
        bearer: api_key.to_string(),
        body,
        timeout: Duration::from_secs(config.api_timeout_secs),
    };

    let transport = resolve_transport(config);
    info!(
        "Sending chart to {} ({} chars base64)",
        config.endpoint,
        payload.encoded_len()
    );

    let mut attempt: u32 = 0;
    loop {
        if attempt > 0 {
            sleep(backoff_delay(config.retry_backoff_ms, attempt)).await;
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_request_sent(attempt + 1, payload.encoded_len());
        }

        match send_once(transport.as_ref(), http_request.clone()).await {
            Ok(response) => {
                let duration = start.elapsed();
                debug!(
                    "Deplot call succeeded after {} attempt(s) in {:?}",
                    attempt + 1,
                    duration
                );
                return Ok(CallOutcome {
                    response,
                    encoded_len: payload.encoded_len(),
                    attempts: attempt + 1,
                    duration_ms: duration.as_millis() as u64,
                });
            }
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                attempt += 1;
                warn!(
                    "Deplot call failed ({}), retry {}/{}",
                    e, attempt, config.max_retries
                );
            }
            Err(e) => {
                warn!("Deplot call failed after {} attempt(s): {}", attempt + 1, e);
                return Err(ChartError::Api(e));
            }
        }
    }
}

/// One HTTP exchange: status check then schema decode.
async fn send_once(
    transport: &dyn DeplotTransport,
    request: HttpRequest,
) -> Result<ExtractionResponse, ApiError> {
    let response = transport.send(request).await?;
    if !response.is_success() {
        return Err(ApiError::Status {
            status: response.status,
            body: truncate_body(&response.body),
        });
    }
    ExtractionResponse::from_json(&response.body)
}

fn resolve_transport(config: &ExtractionConfig) -> Arc<dyn DeplotTransport> {
    match config.transport {
        Some(ref t) => Arc::clone(t),
        None => Arc::new(ReqwestTransport::new()),
    }
}

/// Delay before retry number `attempt` (1-based). Saturates instead of
/// overflowing for large attempt counts.
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    let ms = base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS);
    Duration::from_millis(ms)
}

/// Error bodies can be whole HTML pages; keep enough to diagnose.
fn truncate_body(body: &str) -> String {
    const MAX: usize = 500;
    let body = body.trim();
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
