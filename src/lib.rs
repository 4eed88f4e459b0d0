//! # edgequake-chart2csv
//!
//! Recover the data table behind a chart image using Google's Deplot
//! vision-language model, hosted on the NVIDIA API catalogue.
//!
//! ## Why this crate?
//!
//! Bar and line charts in reports and slides usually outlive the spreadsheet
//! they were drawn from. Deplot reads a chart and answers with a Markdown
//! table of the underlying values; this crate wraps the HTTP call, turns the
//! Markdown into a typed [`Dataset`], and exports it as CSV.
//!
//! ## Pipeline Overview
//!
//! ```text
//! chart.png
//!  │
//!  ├─ 1. Input    resolve local file or download from URL (PNG/JPEG)
//!  ├─ 2. Encode   base64, reject payloads ≥ 180 000 chars
//!  ├─ 3. Deplot   POST with bearer token, typed response decode
//!  ├─ 4. Polish   strip fences / blank lines the model adds
//!  ├─ 5. Parse    Markdown table → Dataset
//!  └─ 6. Export   Dataset → CSV (extracted_data.csv)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_chart2csv::{extract, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential read once from NVIDIA_API_KEY.
//!     let config = ExtractionConfig::from_env();
//!     let output = extract("chart.png", &config).await?;
//!     println!("{}", output.dataset.to_csv()?);
//!     Ok(())
//! }
//! ```
//!
//! The two core units are also usable on their own:
//! [`extract_chart_data`] performs only the API call and
//! [`parse_markdown_table`] is a pure function over text.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `chart2csv` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, RowPolicy, API_KEY_ENV, DEFAULT_ENDPOINT};
pub use error::{ApiError, ChartError, ParseError};
pub use extract::{extract, extract_from_bytes, extract_sync, extract_to_csv};
pub use output::{Dataset, ExtractionOutput, ExtractionStats};
pub use pipeline::client::extract_chart_data;
pub use pipeline::export::{write_csv, CSV_FILE_NAME, CSV_MIME_TYPE};
pub use pipeline::request::{ExtractionRequest, ExtractionResponse};
pub use pipeline::table::{parse_markdown_table, parse_markdown_table_with};
pub use pipeline::transport::{DeplotTransport, HttpRequest, HttpResponse, ReqwestTransport};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
