//! Extraction entry points: chart image in, [`ExtractionOutput`] out.
//!
//! Each function runs one pass of the pipeline (see [`crate::pipeline`]).
//! Errors come back as [`ChartError`]; nothing here panics on bad input or a
//! failing endpoint. Progress callbacks, if configured, are told about the
//! failure before it is returned.

use crate::config::ExtractionConfig;
use crate::error::ChartError;
use crate::output::{ExtractionOutput, ExtractionStats};
use crate::pipeline::{client, export, input, postprocess, table};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Extract the data table from a chart given as a local path or URL.
///
/// # Example
/// ```rust,no_run
/// use edgequake_chart2csv::{extract, ExtractionConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ExtractionConfig::from_env();
///     let output = extract("sales_chart.png", &config).await?;
///     print!("{}", output.dataset.to_csv()?);
///     Ok(())
/// }
/// ```
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ChartError> {
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    let bytes = match input::resolve_input(input_str, config.download_timeout_secs).await {
        Ok(b) => b,
        Err(e) => return Err(report(config, e)),
    };
    run(input_str, &bytes, config).await
}

/// Extract the data table from an in-memory image (PNG or JPEG).
///
/// Unlike [`extract`], the bytes are not format-checked; the endpoint gets
/// whatever it is given.
pub async fn extract_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ChartError> {
    run("<memory>", bytes, config).await
}

/// Blocking wrapper around [`extract`] for callers without a runtime.
///
/// Returns [`ChartError::Internal`] when called from inside a tokio runtime;
/// use [`extract`] there instead.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ChartError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(ChartError::Internal(
            "extract_sync called from within a tokio runtime; use extract().await".into(),
        ));
    }
    tokio::runtime::Runtime::new()
        .map_err(|e| ChartError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_str, config))
}

/// Extract and write the dataset as CSV to `output_path`.
pub async fn extract_to_csv(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, ChartError> {
    let output = extract(input_str, config).await?;
    export::write_csv(&output.dataset, output_path).await?;
    Ok(output.stats)
}

async fn run(
    source: &str,
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ChartError> {
    let total_start = Instant::now();
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(source, bytes.len());
    }

    // ── Step 1: Call Deplot ──────────────────────────────────────────────
    let outcome = match client::call_deplot(bytes, config).await {
        Ok(o) => o,
        Err(e) => return Err(report(config, e)),
    };

    let raw_table = match outcome.response.table_text() {
        Ok(t) => t.to_string(),
        Err(e) => return Err(report(config, e.into())),
    };
    debug!("Deplot returned {} chars of table text", raw_table.len());

    // ── Step 2: Clean and parse ──────────────────────────────────────────
    let text = if config.clean_output {
        postprocess::clean_table_text(&raw_table)
    } else {
        raw_table.clone()
    };

    let dataset = match table::parse_markdown_table_with(&text, config.row_policy) {
        Ok(d) => d,
        Err(source) => {
            return Err(report(
                config,
                ChartError::Parse {
                    source,
                    raw: raw_table,
                },
            ))
        }
    };

    // ── Step 3: Stats ────────────────────────────────────────────────────
    let usage = outcome.response.usage;
    let stats = ExtractionStats {
        encoded_len: outcome.encoded_len,
        attempts: outcome.attempts,
        api_duration_ms: outcome.duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        rows: dataset.row_count(),
        columns: dataset.column_count(),
        prompt_tokens: usage.map(|u| u.prompt_tokens),
        completion_tokens: usage.map(|u| u.completion_tokens),
    };

    info!(
        "Extraction complete: {} rows × {} columns in {}ms",
        stats.rows, stats.columns, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(stats.rows, stats.columns);
    }

    Ok(ExtractionOutput {
        raw_table,
        dataset,
        stats,
    })
}

/// Forward a failure to the progress callback and hand it back.
fn report(config: &ExtractionConfig, err: ChartError) -> ChartError {
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_error(&err.to_string());
    }
    err
}
