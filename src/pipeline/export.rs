//! CSV export of a [`Dataset`].
//!
//! Output is UTF-8, comma-separated, header row first, no index column.
//! Quoting follows RFC 4180 via the `csv` crate, so cells containing commas,
//! quotes or newlines survive a round trip through any standard reader.

use crate::error::ChartError;
use crate::output::Dataset;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Default file name offered for the exported table.
pub const CSV_FILE_NAME: &str = "extracted_data.csv";

/// MIME type of the exported table.
pub const CSV_MIME_TYPE: &str = "text/csv";

/// Write `dataset` as CSV into any writer.
pub fn write_csv_to<W: Write>(dataset: &Dataset, writer: W) -> Result<(), ChartError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_writer(writer);

    wtr.write_record(dataset.headers())
        .map_err(|e| ChartError::CsvExport(e.to_string()))?;
    for row in dataset.rows() {
        wtr.write_record(row)
            .map_err(|e| ChartError::CsvExport(e.to_string()))?;
    }
    wtr.flush()
        .map_err(|e| ChartError::CsvExport(e.to_string()))?;
    Ok(())
}

impl Dataset {
    /// Serialise as CSV text.
    pub fn to_csv(&self) -> Result<String, ChartError> {
        let mut buf = Vec::new();
        write_csv_to(self, &mut buf)?;
        String::from_utf8(buf).map_err(|e| ChartError::CsvExport(e.to_string()))
    }
}

/// Write `dataset` to `path` atomically: temp file in the same directory,
/// then rename over the destination.
pub async fn write_csv(dataset: &Dataset, path: impl AsRef<Path>) -> Result<(), ChartError> {
    let path = path.as_ref();
    let csv = dataset.to_csv()?;

    let write_err = |source: std::io::Error| ChartError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("csv.tmp");
    tokio::fs::write(&tmp_path, csv.as_bytes())
        .await
        .map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }

    debug!(
        "Wrote {} rows × {} columns to {}",
        dataset.row_count(),
        dataset.column_count(),
        path.display()
    );
    Ok(())
}
