//! CLI binary for edgequake-chart2csv.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_chart2csv::{
    extract, write_csv, ChartError, ExtractionConfig, ExtractionOutput,
    ExtractionProgressCallback, ProgressCallback, RowPolicy, CSV_FILE_NAME,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while the Deplot request is in flight.
struct SpinnerCallback {
    bar: ProgressBar,
}

impl SpinnerCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading chart…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ExtractionProgressCallback for SpinnerCallback {
    fn on_extraction_start(&self, source: &str, image_len: usize) {
        self.bar.set_message(format!(
            "{source} {}",
            dim(&format!("({:.1} KB)", image_len as f64 / 1024.0))
        ));
    }

    fn on_request_sent(&self, attempt: u32, _encoded_len: usize) {
        self.bar.set_prefix("Extracting");
        if attempt > 1 {
            self.bar.set_message(format!("data from chart… (attempt {attempt})"));
        } else {
            self.bar.set_message("data from chart…");
        }
    }

    fn on_extraction_complete(&self, rows: usize, columns: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Extracted {} rows × {} columns",
            green("✔"),
            bold(&rows.to_string()),
            bold(&columns.to_string())
        );
    }

    fn on_extraction_error(&self, _error: &str) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print the extracted table as CSV on stdout
  chart2csv chart.png

  # Save as CSV (the name the web app used)
  chart2csv chart.png -o extracted_data.csv

  # Aligned table for reading in the terminal, plus the raw Markdown
  chart2csv --table --raw chart.jpg

  # Chart from a URL, tolerate ragged rows
  chart2csv --row-policy pad https://example.com/figure.png

  # Full result (raw table, dataset, stats) as JSON
  chart2csv --json chart.png > result.json

LIMITS:
  PNG or JPEG only. The base64 payload must stay under 180 000 characters,
  i.e. images up to roughly 135 KB.

ENVIRONMENT VARIABLES:
  NVIDIA_API_KEY          Bearer token for ai.api.nvidia.com (required)
  CHART2CSV_ENDPOINT      Override the Deplot endpoint URL
  RUST_LOG                Fine-grained log filter (e.g. edgequake_chart2csv=debug)

  A `.env` file in the working directory is loaded at start-up.
"#;

/// Extract the data table behind a chart image with Deplot.
#[derive(Parser, Debug)]
#[command(
    name = "chart2csv",
    version,
    about = "Extract the data table behind a chart image with the Deplot vision model",
    long_about = "Send a chart image (PNG or JPEG, local file or URL) to Google's Deplot model \
on the NVIDIA API catalogue and turn the Markdown table it returns into CSV.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local image path or HTTP/HTTPS URL.
    input: String,

    /// Write CSV to this file instead of stdout.
    #[arg(short, long, env = "CHART2CSV_OUTPUT")]
    output: Option<PathBuf>,

    /// Write CSV to ./extracted_data.csv.
    #[arg(long, conflicts_with = "output")]
    save: bool,

    /// NVIDIA API key.
    #[arg(long, env = "NVIDIA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Deplot endpoint URL.
    #[arg(long, env = "CHART2CSV_ENDPOINT", default_value = edgequake_chart2csv::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Max output tokens.
    #[arg(long, env = "CHART2CSV_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: u32,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "CHART2CSV_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Nucleus sampling mass (0.0–1.0).
    #[arg(long, env = "CHART2CSV_TOP_P", default_value_t = 0.2)]
    top_p: f32,

    /// Retries on transient API failures (429, 5xx, timeouts).
    #[arg(long, env = "CHART2CSV_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// API call timeout in seconds.
    #[arg(long, env = "CHART2CSV_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, env = "CHART2CSV_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    /// Rows whose width differs from the header: strict (reject) or pad.
    #[arg(long, env = "CHART2CSV_ROW_POLICY", value_enum, default_value = "strict")]
    row_policy: RowPolicyArg,

    /// Parse the endpoint text exactly as returned, without cleanup.
    #[arg(long)]
    no_clean: bool,

    /// Also print an aligned table to stderr.
    #[arg(long)]
    table: bool,

    /// Also print the raw Markdown returned by the endpoint to stderr.
    #[arg(long)]
    raw: bool,

    /// Output structured JSON (ExtractionOutput) instead of CSV.
    #[arg(long, env = "CHART2CSV_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "CHART2CSV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CHART2CSV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CHART2CSV_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum RowPolicyArg {
    Strict,
    Pad,
}

impl From<RowPolicyArg> for RowPolicy {
    fn from(v: RowPolicyArg) -> Self {
        match v {
            RowPolicyArg::Strict => RowPolicy::Strict,
            RowPolicyArg::Pad => RowPolicy::Pad,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads env-backed flags.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(SpinnerCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run extraction ───────────────────────────────────────────────────
    let output = match extract(&cli.input, &config).await {
        Ok(o) => o,
        Err(e) => {
            if let Some(raw) = e.raw_table() {
                eprintln!("{}", red("Raw response from the endpoint:"));
                eprintln!("{raw}");
            }
            if matches!(e, ChartError::MissingCredential) {
                eprintln!("{}", dim("Get a key at https://build.nvidia.com and export NVIDIA_API_KEY."));
            }
            return Err(e).context("Extraction failed");
        }
    };

    if cli.raw && !cli.quiet {
        eprintln!("{}", bold("Raw data"));
        eprintln!("{}", output.raw_table.trim_end());
    }
    if cli.table && !cli.quiet {
        eprint!("{}", output.dataset.to_text_grid());
    }

    emit(&cli, &output).await?;
    Ok(())
}

/// Write the result where the flags ask for it.
async fn emit(cli: &Cli, output: &ExtractionOutput) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    let target = if cli.save {
        Some(PathBuf::from(CSV_FILE_NAME))
    } else {
        cli.output.clone()
    };

    match target {
        Some(path) => {
            write_csv(&output.dataset, &path)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!(
                    "{}  {} rows  {}ms  →  {}",
                    green("✔"),
                    output.stats.rows,
                    output.stats.total_duration_ms,
                    bold(&path.display().to_string()),
                );
            }
        }
        None => {
            let csv = output.dataset.to_csv().context("Failed to render CSV")?;
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(csv.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .endpoint(cli.endpoint.clone())
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .top_p(cli.top_p)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .row_policy(cli.row_policy.clone().into())
        .clean_output(!cli.no_clean);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
