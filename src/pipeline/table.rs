//! Markdown table parsing: pipe-delimited text → [`Dataset`].
//!
//! The accepted shape is the one Deplot emits:
//!
//! ```text
//! | Year | Sales |      ← line 0: header
//! |------|-------|      ← line 1: separator, skipped without inspection
//! | 2019 | 10    |      ← lines 2..: one row each
//! ```
//!
//! Each line is split on `|` and the first and last pieces are dropped (they
//! are what sits outside the leading and trailing pipe). Cells are trimmed.
//! Nothing here performs I/O, so parsing is deterministic and idempotent.

use crate::config::RowPolicy;
use crate::error::ParseError;
use crate::output::Dataset;

/// Parse a Markdown table, rejecting rows whose width differs from the header.
pub fn parse_markdown_table(text: &str) -> Result<Dataset, ParseError> {
    parse_markdown_table_with(text, RowPolicy::Strict)
}

/// Parse a Markdown table with an explicit [`RowPolicy`].
pub fn parse_markdown_table_with(text: &str, policy: RowPolicy) -> Result<Dataset, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 3 {
        return Err(ParseError::TooFewLines { found: lines.len() });
    }

    let headers = split_cells(lines[0]);
    if headers.is_empty() {
        return Err(ParseError::NoColumns {
            line: lines[0].to_string(),
        });
    }
    let width = headers.len();

    let mut rows = Vec::with_capacity(lines.len() - 2);
    for (i, line) in lines.iter().enumerate().skip(2) {
        let mut cells = split_cells(line);
        if cells.len() != width {
            match policy {
                RowPolicy::Strict => {
                    return Err(ParseError::RowWidthMismatch {
                        row: i - 1,
                        expected: width,
                        found: cells.len(),
                    });
                }
                RowPolicy::Pad => cells.resize(width, String::new()),
            }
        }
        rows.push(cells);
    }

    Ok(Dataset::new(headers, rows))
}

/// Split one table line into trimmed cells, dropping the outer pieces.
fn split_cells(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < 2 {
        return Vec::new();
    }
    parts[1..parts.len() - 1]
        .iter()
        .map(|c| c.trim().to_string())
        .collect()
}
