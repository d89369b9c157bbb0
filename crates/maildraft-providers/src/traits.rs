//! Completion gateway trait — the seam between the pipeline and whatever
//! service writes the reply.
//!
//! `HttpCompletionGateway` in `http_provider.rs` covers every
//! OpenAI-compatible API; tests substitute their own implementations.

use async_trait::async_trait;

/// Why a reply could not be generated for one message.
///
/// Every variant is recoverable at the batch level: the message is left
/// unprocessed and the next one is attempted.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The request never got an HTTP response (DNS, connect, TLS, timeout).
    #[error("completion request failed: {0}")]
    Transport(String),

    /// 401 / 403 from the service.
    #[error("completion service rejected the API key (HTTP {status})")]
    Auth { status: u16 },

    /// Any other non-success status.
    #[error("completion service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Success status but the body is not a chat completion.
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    /// The first choice carried no text.
    #[error("completion service returned an empty reply")]
    EmptyReply,

    /// The gateway could not be constructed from its configuration.
    #[error("completion client misconfigured: {0}")]
    Client(String),
}

/// Produces a reply for a single email.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Generate a reply to one email.
    ///
    /// # Arguments
    /// * `body`    — Decoded text body (may be empty).
    /// * `subject` — Decoded subject.
    /// * `sender`  — Decoded `From`, display name included.
    ///
    /// # Returns
    /// The trimmed, non-empty reply text.
    async fn generate(
        &self,
        body: &str,
        subject: &str,
        sender: &str,
    ) -> Result<String, GenerationError>;

    /// Display name for logging.
    fn display_name(&self) -> &str;

    /// Model the replies come from.
    fn model(&self) -> &str;
}
