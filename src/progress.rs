//! Progress-callback trait for extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to be told
//! when each stage of an extraction starts and finishes. The CLI uses this
//! to drive its spinner; a GUI front-end would use it to disable the
//! "extract" action while a request is in flight.
//!
//! # Example
//!
//! ```rust
//! use edgequake_chart2csv::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     requests: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_request_sent(&self, attempt: u32, encoded_len: usize) {
//!         self.requests.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("attempt {attempt}: {encoded_len} chars");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { requests: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as an extraction moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ExtractionProgressCallback: Send + Sync {
    /// The input has been resolved to `image_len` bytes.
    fn on_extraction_start(&self, source: &str, image_len: usize) {
        let _ = (source, image_len);
    }

    /// A request is about to be sent. `attempt` is 1-based.
    fn on_request_sent(&self, attempt: u32, encoded_len: usize) {
        let _ = (attempt, encoded_len);
    }

    /// The table was parsed.
    fn on_extraction_complete(&self, rows: usize, columns: usize) {
        let _ = (rows, columns);
    }

    /// The extraction failed; `error` is the display message.
    fn on_extraction_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
