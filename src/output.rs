//! Result types: the parsed [`Dataset`] and the per-extraction
//! [`ExtractionOutput`].

use serde::{Deserialize, Serialize};

/// A table of string cells with ordered, possibly duplicated, column names.
///
/// Every row has exactly `headers.len()` cells; the parser guarantees this
/// under both row policies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Assemble a dataset. Callers outside the parser are responsible for
    /// row widths matching `headers`.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All cells of the first column named `name`. Rows too short to reach
    /// the column (possible for hand-built or deserialised datasets) yield `""`.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// Render as an aligned plain-text grid for terminal display.
    pub fn to_text_grid(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let render = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = render(&self.headers);
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|w| "─".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for row in &self.rows {
            out.push('\n');
            out.push_str(&render(row));
        }
        out.push('\n');
        out
    }
}

/// Everything produced by one chart extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Table text exactly as the endpoint returned it.
    pub raw_table: String,
    pub dataset: Dataset,
    pub stats: ExtractionStats,
}

/// Bookkeeping for one extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Base64 length of the image payload.
    pub encoded_len: usize,
    /// HTTP requests issued, including retries.
    pub attempts: u32,
    /// Wall-clock time of the API call.
    pub api_duration_ms: u64,
    /// Wall-clock time of the whole extraction.
    pub total_duration_ms: u64,
    pub rows: usize,
    pub columns: usize,
    /// Token usage if the endpoint reported it.
    pub prompt_tokens: Option<usize>,
    pub completion_tokens: Option<usize>,
}
