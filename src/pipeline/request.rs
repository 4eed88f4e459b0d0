//! Wire types for the Deplot chat-completions call.
//!
//! The response schema is typed rather than probed with dynamic field
//! access: a body that decodes but lacks `choices[0].message.content` is an
//! [`ApiError`], never a panic.

use crate::config::ExtractionConfig;
use crate::error::ApiError;
use crate::pipeline::encode::ImagePayload;
use crate::prompts::chart_prompt;
use serde::{Deserialize, Serialize};

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Request body for `POST /v1/vlm/google/deplot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub stream: bool,
}

impl ExtractionRequest {
    /// A single user turn carrying the instruction and the inline image.
    pub fn for_chart(payload: &ImagePayload, config: &ExtractionConfig) -> Self {
        Self {
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: chart_prompt(payload.mime_type, &payload.b64),
            }],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            stream: false,
        }
    }
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: usize,
    #[serde(default)]
    pub completion_tokens: usize,
}

impl ExtractionResponse {
    /// Decode a JSON body, mapping any schema mismatch to [`ApiError::Decode`].
    pub fn from_json(body: &str) -> Result<Self, ApiError> {
        serde_json::from_str(body).map_err(|e| ApiError::Decode {
            message: e.to_string(),
        })
    }

    /// The Markdown table text from the first choice.
    pub fn table_text(&self) -> Result<&str, ApiError> {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or(ApiError::EmptyChoices)
    }
}
