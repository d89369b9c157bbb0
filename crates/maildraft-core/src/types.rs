//! Core types for maildraft.
//!
//! Two groups live here:
//! - mailbox records handed between the reader, decoder and pipeline
//!   ([`RawMessage`], [`UnreadMessage`]);
//! - the OpenAI-compatible chat completions wire format used by every
//!   completion provider.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Mailbox records
// ─────────────────────────────────────────────

/// A message as fetched from the mailbox, not yet decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawMessage {
    /// Mailbox-assigned identifier, the idempotency key.
    pub id: String,
    /// Full RFC 5322 message bytes.
    pub raw: Vec<u8>,
}

/// A decoded unread message, ready to be answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnreadMessage {
    /// Mailbox-assigned identifier (see [`RawMessage::id`]).
    pub id: String,
    /// Decoded `From` header, e.g. `Иван Петров <ivan@example.com>`.
    pub sender: String,
    /// Display name from `From`, decoded and unquoted. Empty when absent.
    pub sender_name: String,
    /// Bare address extracted from `From`, e.g. `ivan@example.com`.
    pub sender_address: String,
    /// Decoded subject (empty when absent).
    pub subject: String,
    /// Decoded text/plain body. Empty when the message has no such part.
    pub body: String,
    /// Original `Message-ID`, used for `In-Reply-To`.
    pub message_id: Option<String>,
}

// ─────────────────────────────────────────────
// Chat messages (OpenAI chat completions format)
// ─────────────────────────────────────────────

/// A chat message in the OpenAI format.
///
/// Only the two roles the reply prompt uses are modelled.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role")]
pub enum Message {
    #[serde(rename = "system")]
    System { content: String },

    #[serde(rename = "user")]
    User { content: String },
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System { content } | Message::User { content } => content,
        }
    }
}

// ─────────────────────────────────────────────
// Request / response bodies
// ─────────────────────────────────────────────

/// Request body for an OpenAI-compatible chat completion API.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub stream: bool,
}

/// Raw chat completion response from an OpenAI-compatible API.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: Option<String>,
    pub choices: Vec<ChatChoice>,
    pub usage: Option<UsageInfo>,
}

impl ChatCompletionResponse {
    /// Text of `choices[0].message.content`, if any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

/// A single choice in a chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
}

/// The assistant message within a chat completion choice.
#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
}

/// Token usage statistics from the completion service.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UsageInfo {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
