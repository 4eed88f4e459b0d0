//! Post-processing: deterministic cleanup of Deplot's table text.
//!
//! The parser in [`crate::pipeline::table`] treats line 0 as the header and
//! line 1 as the separator, so anything that shifts lines (a leading code
//! fence, a stray blank line, a `\r` glued to the last cell) corrupts the
//! whole dataset. These rules only touch layout, never cell content.
//!
//! Rules (applied in order):
//! 1. Strip one outer Markdown code fence
//! 2. Normalise line endings (CRLF / CR → LF)
//! 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, …)
//! 4. Trim trailing whitespace per line
//! 5. Drop blank lines

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup rule to raw endpoint text.
pub fn clean_table_text(input: &str) -> String {
    let s = strip_code_fence(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    s.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 1: Strip outer code fence ───────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?```\s*$").expect("static regex")
});

fn strip_code_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}
