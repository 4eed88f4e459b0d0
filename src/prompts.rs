//! The instruction sent to Deplot with every chart.
//!
//! Deplot is a single-task model: it was fine-tuned on exactly this phrasing
//! and ignores system messages, so the prompt is a fixed prefix followed by
//! the image embedded inline as an HTML `<img>` data URI.

/// Fixed instruction prefix placed before the inline image.
pub const DEPLOT_INSTRUCTION: &str = "Generate underlying data table of the figure below: ";

/// Render the inline image reference for a base64 payload.
pub fn inline_image(mime_type: &str, b64: &str) -> String {
    format!(r#"<img src="data:{mime_type};base64,{b64}" />"#)
}

/// Build the full user-message content for one chart.
pub fn chart_prompt(mime_type: &str, b64: &str) -> String {
    let mut content = String::with_capacity(DEPLOT_INSTRUCTION.len() + b64.len() + 40);
    content.push_str(DEPLOT_INSTRUCTION);
    content.push_str(&inline_image(mime_type, b64));
    content
}
