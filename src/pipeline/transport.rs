//! HTTP transport seam for the Deplot call.
//!
//! The client never talks to `reqwest` directly; it goes through
//! [`DeplotTransport`] so tests (and embedders with their own HTTP stack)
//! can substitute an implementation. Status handling and JSON decoding stay
//! in [`crate::pipeline::client`], so a transport only moves bytes.

use crate::error::ApiError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A fully prepared outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    /// Bearer token, sent as `Authorization: Bearer <token>`.
    pub bearer: String,
    /// Serialised JSON body.
    pub body: Vec<u8>,
    pub timeout: Duration,
}

/// Status and body of a completed exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and returns the raw response.
///
/// Implementations return `Err` only when no HTTP response was obtained
/// (connection failure, timeout). Non-2xx statuses are `Ok`.
#[async_trait]
pub trait DeplotTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Default transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeplotTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let secs = request.timeout.as_secs();
        let response = self
            .client
            .post(&request.url)
            .bearer_auth(&request.bearer)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(request.timeout)
            .body(request.body)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, secs))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, secs))?;
        debug!("Deplot responded HTTP {} with {} bytes", status, body.len());

        Ok(HttpResponse { status, body })
    }
}

fn map_reqwest_error(e: reqwest::Error, secs: u64) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout { secs }
    } else {
        ApiError::Transport {
            message: e.to_string(),
        }
    }
}
