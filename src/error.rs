//! Error types for the edgequake-chart2csv library.
//!
//! Three layers mirror the three places an extraction can go wrong:
//!
//! * [`ChartError`]: **Fatal** for one extraction. Covers a missing credential,
//!   oversized image, unreadable input, or one of the two lower layers
//!   wrapped. Returned from every public entry point.
//!
//! * [`ApiError`]: the Deplot call itself failed (transport, timeout,
//!   non-2xx status, or a response body that does not match the expected
//!   `choices[0].message.content` schema).
//!
//! * [`ParseError`]: the endpoint answered, but its text is not a usable
//!   Markdown table. [`ChartError::Parse`] keeps the raw text alongside so
//!   the caller can show it for diagnosis.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-chart2csv library.
#[derive(Debug, Error)]
pub enum ChartError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No API key was configured; nothing was sent over the network.
    #[error("Missing credential: NVIDIA_API_KEY is not set.\nExport it or pass --api-key.")]
    MissingCredential,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Payload errors ────────────────────────────────────────────────────
    /// The base64 payload is at or above the endpoint's inline limit.
    #[error(
        "Image is too large: base64 payload is {encoded_len} characters (limit {limit}).\n\
Use an image smaller than ~{}KB.",
        .limit * 3 / 4 / 1000
    )]
    PayloadTooLarge { encoded_len: usize, limit: usize },

    /// The image contained no bytes.
    #[error("Image is empty")]
    EmptyImage,

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes are neither PNG nor JPEG.
    #[error("Unsupported image '{source_name}': expected PNG or JPEG, first bytes {magic:?}")]
    UnsupportedImage { source_name: String, magic: Vec<u8> },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The Deplot API call failed.
    #[error("Error calling API: {0}")]
    Api(#[from] ApiError),

    /// The endpoint's text could not be parsed as a Markdown table.
    #[error("Error parsing table: {source}")]
    Parse {
        #[source]
        source: ParseError,
        /// Text exactly as returned by the endpoint.
        raw: String,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Serialising the dataset to CSV failed.
    #[error("CSV export failed: {0}")]
    CsvExport(String),

    /// Could not create or write the output CSV file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChartError {
    /// The raw endpoint text attached to a parse failure, if any.
    pub fn raw_table(&self) -> Option<&str> {
        match self {
            ChartError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Failure of the outbound Deplot call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Connection, TLS, or request-building failure.
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// No response within the configured timeout.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body is not JSON or does not match the response schema.
    #[error("malformed response: {message}")]
    Decode { message: String },

    /// The response decoded but `choices` was empty.
    #[error("response contained no choices")]
    EmptyChoices,
}

impl ApiError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Auth failures and bad requests are permanent; overload and network
    /// trouble are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport { .. } | ApiError::Timeout { .. } => true,
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            ApiError::Decode { .. } | ApiError::EmptyChoices => false,
        }
    }
}

/// The endpoint text is not a well-formed Markdown table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("table text is empty")]
    Empty,

    /// A table needs a header, a separator, and at least one data line.
    #[error("expected at least 3 lines (header, separator, data), found {found}")]
    TooFewLines { found: usize },

    #[error("header line has no columns: {line:?}")]
    NoColumns { line: String },

    /// `row` is 1-based over data rows.
    #[error("row {row} has {found} cells but the header has {expected} columns")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
}
