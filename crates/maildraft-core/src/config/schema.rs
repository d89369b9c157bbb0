//! Configuration schema.
//!
//! Hierarchy: `Config` → `MailboxConfig`, `RelayConfig`, `CompletionConfig`,
//! `PipelineConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};

use super::loader::provider_key_var;
use crate::error::ConfigError;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.maildraft/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub mailbox: MailboxConfig,
    pub relay: RelayConfig,
    pub completion: CompletionConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Check that every value a run needs is present.
    ///
    /// All missing keys are reported at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing: Vec<String> = Vec::new();

        if self.mailbox.host.trim().is_empty() {
            missing.push("mailbox.host (IMAP_HOST)".into());
        }
        if self.mailbox.username.is_empty() {
            missing.push("mailbox.username (IMAP_USER)".into());
        }
        if self.mailbox.password.is_empty() {
            missing.push("mailbox.password (IMAP_PASS)".into());
        }
        if self.completion.api_key.is_empty() {
            missing.push(format!(
                "completion.apiKey ({})",
                provider_key_var(&self.completion.provider)
            ));
        }
        if self.pipeline.mode == DeliveryMode::Send && self.relay.host.trim().is_empty() {
            missing.push("relay.host (SMTP_HOST)".into());
        }

        if !missing.is_empty() {
            return Err(ConfigError::MissingRequired { keys: missing });
        }

        if self.pipeline.batch_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.batchLimit".into(),
                message: "must be at least 1".into(),
            });
        }
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(ConfigError::InvalidValue {
                key: "completion.temperature".into(),
                message: format!("{} is outside 0.0 – 2.0", self.completion.temperature),
            });
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────
// Mailbox (IMAP)
// ─────────────────────────────────────────────

/// IMAP mailbox settings: where unread mail is read and drafts are stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MailboxConfig {
    /// IMAP server hostname.
    pub host: String,
    /// IMAP server port (default 993 for IMAPS).
    pub port: u16,
    /// IMAP login username.
    pub username: String,
    /// IMAP login password.
    pub password: String,
    /// Use IMAPS (TLS from the start). Default true.
    pub use_ssl: bool,
    /// Folder polled for unread mail (default "INBOX").
    pub inbox: String,
    /// Folder drafts are appended to (default "Drafts"). Must exist.
    pub drafts_folder: String,
    /// Identity used as `From` on drafts/replies; falls back to `username`.
    pub from_address: String,
    /// Per-read network timeout in seconds.
    pub timeout_secs: u64,
}

impl MailboxConfig {
    /// The address replies are sent from.
    pub fn effective_from(&self) -> &str {
        if self.from_address.is_empty() {
            &self.username
        } else {
            &self.from_address
        }
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 993,
            username: String::new(),
            password: String::new(),
            use_ssl: true,
            inbox: "INBOX".to_string(),
            drafts_folder: "Drafts".to_string(),
            from_address: String::new(),
            timeout_secs: 30,
        }
    }
}

// ─────────────────────────────────────────────
// Relay (SMTP, send mode only)
// ─────────────────────────────────────────────

/// Outbound SMTP relay settings, used in send mode.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelayConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port (default 587 for STARTTLS).
    pub port: u16,
    /// SMTP login username (empty = no authentication).
    pub username: String,
    /// SMTP login password.
    pub password: String,
    /// Use STARTTLS (default true).
    pub use_tls: bool,
    /// Use implicit TLS/SMTPS (default false, for port 465).
    pub use_ssl: bool,
    /// Connection timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            username: String::new(),
            password: String::new(),
            use_tls: true,
            use_ssl: false,
            timeout_secs: 30,
        }
    }
}

// ─────────────────────────────────────────────
// Completion service
// ─────────────────────────────────────────────

/// Completion service settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionConfig {
    /// Provider name from the registry (default "deepseek").
    pub provider: String,
    /// API key for authentication.
    pub api_key: String,
    /// Custom API base URL (overrides provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Model identifier (defaults to the provider's default model).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Maximum tokens to generate per reply.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0). Kept low for on-topic replies.
    pub temperature: f64,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Send the key in this header instead of `Authorization: Bearer`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_header: Option<String>,
    /// Replaces the built-in system instruction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: "deepseek".to_string(),
            api_key: String::new(),
            api_base: None,
            model: None,
            max_tokens: 500,
            temperature: 0.2,
            timeout_secs: 60,
            auth_header: None,
            system_prompt: None,
        }
    }
}

// ─────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────

/// Where a generated reply ends up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Append to the drafts folder for review.
    #[default]
    Draft,
    /// Send directly through the SMTP relay.
    Send,
}

impl std::fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryMode::Draft => f.write_str("draft"),
            DeliveryMode::Send => f.write_str("send"),
        }
    }
}

impl std::str::FromStr for DeliveryMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" | "drafts" => Ok(DeliveryMode::Draft),
            "send" => Ok(DeliveryMode::Send),
            other => Err(ConfigError::InvalidValue {
                key: "pipeline.mode".into(),
                message: format!("expected \"draft\" or \"send\", got \"{other}\""),
            }),
        }
    }
}

/// Per-run behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Draft (default) or send.
    pub mode: DeliveryMode,
    /// Maximum number of messages attempted per run.
    pub batch_limit: usize,
    /// Processed-registry file (`~` is expanded).
    pub processed_file: String,
    /// Body characters passed to the completion service.
    pub max_body_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: DeliveryMode::Draft,
            batch_limit: 5,
            processed_file: "~/.maildraft/processed_ids.json".to_string(),
            max_body_chars: 12000,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
