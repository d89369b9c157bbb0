//! Reply prompt construction.

use maildraft_core::types::Message;

/// Default system instruction.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an email assistant. Analyze the email, \
determine its essence, and propose a polite, to-the-point draft reply.";

/// Stands in for the body when the message has no text/plain content.
pub const EMPTY_BODY_PLACEHOLDER: &str = "(no text content)";

/// Build the two-message conversation sent to the completion service.
///
/// `system_prompt` replaces [`DEFAULT_SYSTEM_PROMPT`] when given.
pub fn build_messages(
    system_prompt: Option<&str>,
    body: &str,
    subject: &str,
    sender: &str,
) -> Vec<Message> {
    let system = system_prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    let body = if body.trim().is_empty() {
        EMPTY_BODY_PLACEHOLDER
    } else {
        body
    };

    vec![
        Message::system(system),
        Message::user(format!("Subject: {subject}\nFrom: {sender}\n\n{body}")),
    ]
}
