//! Pipeline stages for chart-to-CSV extraction.
//!
//! Each submodule implements one step and is testable on its own; only
//! [`input`] and [`transport`] touch the network or file system.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ client ──▶ postprocess ──▶ table ──▶ export
//! (path/URL) (base64)  (Deplot)   (cleanup)       (parse)   (CSV)
//! ```
//!
//! 1. [`input`]        read a local file or download a URL; PNG/JPEG only
//! 2. [`encode`]       base64-encode and enforce the inline size limit
//! 3. [`client`]       build the request, call Deplot through a
//!    [`transport::DeplotTransport`], map errors
//! 4. [`postprocess`]  strip fences and blank lines the model adds
//! 5. [`table`]        Markdown table → [`crate::output::Dataset`]
//! 6. [`export`]       dataset → CSV text or file

pub mod client;
pub mod encode;
pub mod export;
pub mod input;
#[cfg(test)]
pub(crate) mod local_http;
pub mod postprocess;
pub mod request;
pub mod table;
pub mod transport;
