//! Configuration types for chart data extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The credential lives here too: it is
//! read once at start-up (see [`ExtractionConfig::from_env`]) and passed
//! explicitly to every call, never re-read from the environment mid-session.

use crate::error::ChartError;
use crate::pipeline::transport::DeplotTransport;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// NVIDIA-hosted Deplot endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://ai.api.nvidia.com/v1/vlm/google/deplot";

/// Environment variable holding the bearer token.
pub const API_KEY_ENV: &str = "NVIDIA_API_KEY";

/// Inline images must encode to fewer base64 characters than this.
pub const DEFAULT_MAX_PAYLOAD_CHARS: usize = 180_000;

/// Configuration for one or more chart extractions.
///
/// Built via [`ExtractionConfig::builder()`], [`ExtractionConfig::from_env()`],
/// or [`ExtractionConfig::default()`] (which carries no credential).
///
/// # Example
/// ```rust
/// use edgequake_chart2csv::{ExtractionConfig, RowPolicy};
///
/// let config = ExtractionConfig::builder()
///     .api_key("nvapi-test")
///     .api_timeout_secs(30)
///     .row_policy(RowPolicy::Pad)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 1024);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Bearer token for the endpoint. `None` or blank fails every call with
    /// [`ChartError::MissingCredential`].
    pub api_key: Option<String>,

    /// Deplot endpoint URL. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Maximum tokens the model may generate. Default: 1024.
    pub max_tokens: u32,

    /// Sampling temperature. Default: 0.2.
    pub temperature: f32,

    /// Nucleus-sampling mass. Default: 0.2.
    pub top_p: f32,

    /// Base64 length at or above which an image is rejected. Default: 180 000.
    pub max_payload_chars: usize,

    /// Per-request timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 60.
    pub download_timeout_secs: u64,

    /// Retries on a transient API failure. Default: 0 (one call, no retry).
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled after each attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// What to do with rows whose width differs from the header. Default: Strict.
    pub row_policy: RowPolicy,

    /// Run [`crate::pipeline::postprocess::clean_table_text`] before parsing. Default: true.
    pub clean_output: bool,

    /// Pre-constructed transport. Takes precedence over the built-in reqwest one.
    pub transport: Option<Arc<dyn DeplotTransport>>,

    /// Receives stage events (request sent, table parsed, failure).
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_tokens: 1024,
            temperature: 0.2,
            top_p: 0.2,
            max_payload_chars: DEFAULT_MAX_PAYLOAD_CHARS,
            api_timeout_secs: 60,
            download_timeout_secs: 60,
            max_retries: 0,
            retry_backoff_ms: 500,
            row_policy: RowPolicy::default(),
            clean_output: true,
            transport: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_payload_chars", &self.max_payload_chars)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("row_policy", &self.row_policy)
            .field("clean_output", &self.clean_output)
            .field("transport", &self.transport.as_ref().map(|_| "<dyn DeplotTransport>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default configuration with the credential read from `NVIDIA_API_KEY`.
    ///
    /// A missing variable is not an error here; it surfaces as
    /// [`ChartError::MissingCredential`] on the first extraction.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV).ok(),
            ..Self::default()
        }
    }

    /// The credential, if one is set and not blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn max_payload_chars(mut self, n: usize) -> Self {
        self.config.max_payload_chars = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn row_policy(mut self, policy: RowPolicy) -> Self {
        self.config.row_policy = policy;
        self
    }

    pub fn clean_output(mut self, v: bool) -> Self {
        self.config.clean_output = v;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn DeplotTransport>) -> Self {
        self.config.transport = Some(transport);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// The credential is deliberately not checked here so a config can be
    /// built before the key is known; extraction enforces it.
    pub fn build(self) -> Result<ExtractionConfig, ChartError> {
        let c = &self.config;
        if !(c.endpoint.starts_with("https://") || c.endpoint.starts_with("http://")) {
            return Err(ChartError::InvalidConfig(format!(
                "endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.endpoint
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(ChartError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_payload_chars == 0 {
            return Err(ChartError::InvalidConfig(
                "payload limit must be ≥ 1 character".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ChartError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the parser treats a data row whose cell count differs from the header.
///
/// | Policy | Short row | Long row |
/// |--------|-----------|----------|
/// | `Strict` | error | error |
/// | `Pad` | padded with `""` | truncated |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowPolicy {
    /// Reject the table with [`crate::error::ParseError::RowWidthMismatch`]. (default)
    #[default]
    Strict,
    /// Pad short rows with empty cells and truncate long ones.
    Pad,
}
