//! Integration tests for the public extraction API.
//!
//! Every test runs against an in-process `DeplotTransport` that counts
//! calls, so nothing here touches the network.
//!
//! Run with:
//!   cargo test --test extract

use async_trait::async_trait;
use edgequake_chart2csv::{
    extract, extract_chart_data, extract_from_bytes, extract_sync, extract_to_csv,
    parse_markdown_table, parse_markdown_table_with, ApiError, ChartError, DeplotTransport,
    ExtractionConfig, HttpRequest, HttpResponse, ParseError, RowPolicy, CSV_FILE_NAME,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

const SAMPLE_BODY: &str =
    r#"{"choices":[{"message":{"content":"| a | b |\n|---|---|\n| 1 | 2 |"}}]}"#;

/// Returns the same response every time and records what it was sent.
struct MockTransport {
    status: u16,
    body: String,
    calls: AtomicUsize,
    last_request: Mutex<Option<HttpRequest>>,
}

impl MockTransport {
    fn new(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.to_string(),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeplotTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        Ok(HttpResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// Never answers in time.
struct TimeoutTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl DeplotTransport for TimeoutTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ApiError::Timeout {
            secs: request.timeout.as_secs(),
        })
    }
}

/// Route library logs into the test harness; `RUST_LOG` narrows them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

fn config_with(transport: Arc<dyn DeplotTransport>) -> ExtractionConfig {
    init_tracing();
    ExtractionConfig::builder()
        .api_key("nvapi-test")
        .transport(transport)
        .build()
        .expect("valid config")
}

fn chart_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([30, 90, 200])
        } else {
            Rgb([250, 250, 250])
        }
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("png encode");
    buf
}

// ── API client ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn oversize_payload_never_reaches_transport() {
    let mock = MockTransport::new(200, SAMPLE_BODY);
    // 135_000 bytes encode to exactly 180_000 base64 characters.
    let image = vec![0xABu8; 135_000];

    let err = extract_chart_data(&image, &config_with(mock.clone()))
        .await
        .unwrap_err();

    assert!(
        matches!(err, ChartError::PayloadTooLarge { encoded_len: 180_000, .. }),
        "got {err:?}"
    );
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn missing_credential_never_reaches_transport() {
    let mock = MockTransport::new(200, SAMPLE_BODY);
    let config = ExtractionConfig::builder()
        .transport(mock.clone())
        .build()
        .unwrap();

    let err = extract_chart_data(&chart_png(8, 8), &config).await.unwrap_err();

    assert!(matches!(err, ChartError::MissingCredential));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn credential_is_checked_before_size() {
    let mock = MockTransport::new(200, SAMPLE_BODY);
    let config = ExtractionConfig::builder()
        .api_key("")
        .transport(mock.clone())
        .build()
        .unwrap();

    let err = extract_chart_data(&vec![0u8; 200_000], &config)
        .await
        .unwrap_err();

    assert!(matches!(err, ChartError::MissingCredential));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn successful_call_then_parse_yields_dataset() {
    let mock = MockTransport::new(200, SAMPLE_BODY);

    let response = extract_chart_data(&chart_png(16, 16), &config_with(mock.clone()))
        .await
        .expect("call should succeed");
    let dataset = parse_markdown_table(response.table_text().unwrap()).unwrap();

    assert_eq!(dataset.headers(), ["a", "b"]);
    assert_eq!(dataset.rows().len(), 1);
    assert_eq!(dataset.rows()[0], ["1", "2"]);
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn request_carries_credential_and_inline_png() {
    let mock = MockTransport::new(200, SAMPLE_BODY);
    let png = chart_png(16, 16);

    extract_chart_data(&png, &config_with(mock.clone()))
        .await
        .unwrap();

    let request = mock.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request.bearer, "nvapi-test");
    assert_eq!(request.url, "https://ai.api.nvidia.com/v1/vlm/google/deplot");

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    let content = body["messages"][0]["content"].as_str().unwrap();
    assert!(content.starts_with("Generate underlying data table of the figure below: "));
    assert!(content.contains(r#"<img src="data:image/png;base64,"#));
    assert!(content.ends_with(r#"" />"#));
    assert_eq!(body["stream"], false);
    assert_eq!(body["max_tokens"], 1024);
}

#[tokio::test]
async fn http_500_is_api_error() {
    let mock = MockTransport::new(500, r#"{"detail":"Internal Server Error"}"#);

    let err = extract_chart_data(&chart_png(8, 8), &config_with(mock.clone()))
        .await
        .unwrap_err();

    match err {
        ChartError::Api(ApiError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("Internal Server Error"));
        }
        other => panic!("expected ApiError::Status, got {other:?}"),
    }
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn timeout_is_api_error() {
    let transport = Arc::new(TimeoutTransport {
        calls: AtomicUsize::new(0),
    });
    let config = ExtractionConfig::builder()
        .api_key("k")
        .api_timeout_secs(7)
        .transport(transport.clone())
        .build()
        .unwrap();

    let err = extract_chart_data(&chart_png(8, 8), &config).await.unwrap_err();

    assert!(matches!(err, ChartError::Api(ApiError::Timeout { secs: 7 })));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn timeouts_are_retried_when_configured() {
    let transport = Arc::new(TimeoutTransport {
        calls: AtomicUsize::new(0),
    });
    let config = ExtractionConfig::builder()
        .api_key("k")
        .max_retries(2)
        .retry_backoff_ms(1)
        .transport(transport.clone())
        .build()
        .unwrap();

    let err = extract_chart_data(&chart_png(8, 8), &config).await.unwrap_err();

    assert!(matches!(err, ChartError::Api(ApiError::Timeout { .. })));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn body_without_choices_is_api_error() {
    let mock = MockTransport::new(200, r#"{"status":"queued"}"#);

    let err = extract_chart_data(&chart_png(8, 8), &config_with(mock))
        .await
        .unwrap_err();

    assert!(matches!(err, ChartError::Api(ApiError::Decode { .. })));
}

// ── Full pipeline ────────────────────────────────────────────────────────────

#[tokio::test]
async fn extract_from_file_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("chart.png");
    std::fs::write(&image_path, chart_png(32, 24)).unwrap();
    let csv_path = dir.path().join(CSV_FILE_NAME);

    let body = serde_json::json!({
        "choices": [{ "message": { "content":
            "| Quarter | Revenue, $m |\n|:--|--:|\n| Q1 | 1,024 |\n| Q2 | 980 |" } }],
        "usage": { "prompt_tokens": 812, "completion_tokens": 31 }
    });
    let mock = MockTransport::new(200, &body.to_string());

    let stats = extract_to_csv(
        image_path.to_str().unwrap(),
        &csv_path,
        &config_with(mock.clone()),
    )
    .await
    .expect("extraction should succeed");

    assert_eq!(stats.rows, 2);
    assert_eq!(stats.columns, 2);
    assert_eq!(stats.completion_tokens, Some(31));
    assert_eq!(
        std::fs::read_to_string(&csv_path).unwrap(),
        "Quarter,\"Revenue, $m\"\nQ1,\"1,024\"\nQ2,980\n"
    );
}

#[tokio::test]
async fn csv_export_round_trips() {
    let content = "| City | Pop, 2020 | Motto |\n|---|---|---|\n| Paris | 2,148,000 | \"Fluctuat\" |\n| Lima | 9,751,000 |  |";
    let mock = MockTransport::new(
        200,
        &serde_json::json!({ "choices": [{ "message": { "content": content } }] }).to_string(),
    );

    let output = extract_from_bytes(&chart_png(8, 8), &config_with(mock))
        .await
        .unwrap();
    let csv_text = output.dataset.to_csv().unwrap();

    let mut rdr = csv::Reader::from_reader(csv_text.as_bytes());
    let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
    let rows: Vec<Vec<String>> = rdr
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();

    assert_eq!(headers, output.dataset.headers());
    assert_eq!(rows, output.dataset.rows());
}

#[tokio::test]
async fn non_image_file_is_rejected_before_call() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "just text").unwrap();
    let mock = MockTransport::new(200, SAMPLE_BODY);

    let err = extract(path.to_str().unwrap(), &config_with(mock.clone()))
        .await
        .unwrap_err();

    assert!(matches!(err, ChartError::UnsupportedImage { .. }));
    assert_eq!(mock.calls(), 0);
}

#[test]
fn sync_wrapper_runs_without_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chart.png");
    std::fs::write(&path, chart_png(8, 8)).unwrap();
    let mock = MockTransport::new(200, SAMPLE_BODY);

    let output = extract_sync(path.to_str().unwrap(), &config_with(mock)).unwrap();

    assert_eq!(output.dataset.headers(), ["a", "b"]);
}

// ── Parser ───────────────────────────────────────────────────────────────────

#[test]
fn parser_rejects_empty_and_single_line() {
    assert_eq!(parse_markdown_table(""), Err(ParseError::Empty));
    assert!(matches!(
        parse_markdown_table("single line only"),
        Err(ParseError::TooFewLines { .. })
    ));
}

#[test]
fn parser_is_idempotent() {
    let text = "| x | y |\n|---|---|\n| 0.5 | 1 |\n| 1.5 | 4 |";
    let first = parse_markdown_table(text).unwrap();
    let second = parse_markdown_table(text).unwrap();
    assert_eq!(first, second);
}

#[test]
fn ragged_rows_follow_policy() {
    let text = "| x | y |\n|---|---|\n| 1 |";
    assert!(matches!(
        parse_markdown_table_with(text, RowPolicy::Strict),
        Err(ParseError::RowWidthMismatch { row: 1, expected: 2, found: 1 })
    ));
    let padded = parse_markdown_table_with(text, RowPolicy::Pad).unwrap();
    assert_eq!(padded.rows()[0], ["1", ""]);
}
