//! Draft delivery — IMAP APPEND to the drafts folder, or SMTP send.

use std::time::Duration;

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{debug, info};

use maildraft_core::config::{DeliveryMode, MailboxConfig, RelayConfig};

use crate::composer::Draft;
use crate::error::DeliveryError;
use crate::imap::ImapClient;

/// Where composed replies go.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Store or send one draft.
    async fn deliver(&self, draft: &Draft) -> Result<(), DeliveryError>;

    /// Delivery target, for logs and the run summary.
    fn mode(&self) -> DeliveryMode;

    /// Whether a successful `deliver` actually persisted something.
    ///
    /// `false` for dry runs; such messages are never marked processed.
    fn persists(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────
// Draft mode — IMAP APPEND
// ─────────────────────────────────────────────

/// Appends drafts to the configured drafts folder with the `\Draft` flag.
///
/// Opens a fresh connection per draft and never selects the inbox.
#[derive(Clone, Debug)]
pub struct ImapDraftWriter {
    config: MailboxConfig,
}

impl ImapDraftWriter {
    pub fn new(config: MailboxConfig) -> Self {
        Self { config }
    }

    async fn append(&self, data: &[u8]) -> Result<(), crate::error::MailError> {
        let mut client = ImapClient::connect(
            &self.config.host,
            self.config.port,
            self.config.use_ssl,
            Duration::from_secs(self.config.timeout_secs),
        )
        .await?;

        let result = async {
            client
                .login(&self.config.username, &self.config.password)
                .await?;
            let now = chrono::Local::now().fixed_offset();
            client
                .append_draft(&self.config.drafts_folder, &now, data)
                .await
        }
        .await;

        if let Err(e) = client.logout().await {
            debug!(error = %e, "IMAP logout failed");
        }
        result
    }
}

#[async_trait]
impl Delivery for ImapDraftWriter {
    async fn deliver(&self, draft: &Draft) -> Result<(), DeliveryError> {
        let data = draft.encoded();
        self.append(&data)
            .await
            .map_err(|source| DeliveryError::Append {
                folder: self.config.drafts_folder.clone(),
                source,
            })?;

        info!(
            folder = %self.config.drafts_folder,
            to = %draft.recipient,
            subject = %draft.subject,
            bytes = data.len(),
            "draft saved"
        );
        Ok(())
    }

    fn mode(&self) -> DeliveryMode {
        DeliveryMode::Draft
    }
}

// ─────────────────────────────────────────────
// Send mode — SMTP
// ─────────────────────────────────────────────

/// Sends replies through the configured SMTP relay.
pub struct SmtpReplySender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl std::fmt::Debug for SmtpReplySender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpReplySender")
            .field("host", &self.host)
            .finish()
    }
}

impl SmtpReplySender {
    /// Build the transport: implicit TLS (`useSsl`), STARTTLS (`useTls`) or
    /// plain. Credentials are only attached when a username is set.
    pub fn new(config: &RelayConfig) -> Result<Self, DeliveryError> {
        if config.host.trim().is_empty() {
            return Err(DeliveryError::RelayConfig("SMTP host not configured".into()));
        }

        let builder = if config.use_ssl {
            // Implicit TLS (SMTPS, port 465)
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| DeliveryError::RelayConfig(format!("SMTP relay error: {e}")))?
        } else if config.use_tls {
            // STARTTLS (port 587)
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| DeliveryError::RelayConfig(format!("SMTP STARTTLS error: {e}")))?
        } else {
            // Plain (no TLS)
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            host: config.host.clone(),
        })
    }
}

#[async_trait]
impl Delivery for SmtpReplySender {
    async fn deliver(&self, draft: &Draft) -> Result<(), DeliveryError> {
        self.transport.send(draft.message().clone()).await?;
        info!(relay = %self.host, to = %draft.recipient, subject = %draft.subject, "reply sent");
        Ok(())
    }

    fn mode(&self) -> DeliveryMode {
        DeliveryMode::Send
    }
}

// ─────────────────────────────────────────────
// Dry run
// ─────────────────────────────────────────────

/// Logs drafts instead of delivering them.
#[derive(Clone, Debug)]
pub struct LoggingDelivery {
    mode: DeliveryMode,
}

impl LoggingDelivery {
    /// `mode` is the delivery that would have happened.
    pub fn new(mode: DeliveryMode) -> Self {
        Self { mode }
    }
}

#[async_trait]
impl Delivery for LoggingDelivery {
    async fn deliver(&self, draft: &Draft) -> Result<(), DeliveryError> {
        info!(
            mode = %self.mode,
            to = %draft.recipient,
            subject = %draft.subject,
            "dry run, not delivering"
        );
        debug!(body = %draft.body, "dry-run draft body");
        Ok(())
    }

    fn mode(&self) -> DeliveryMode {
        self.mode
    }

    fn persists(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::DraftComposer;

    #[test]
    fn test_smtp_requires_host() {
        let err = SmtpReplySender::new(&RelayConfig::default()).unwrap_err();
        assert!(matches!(err, DeliveryError::RelayConfig(_)));
    }

    #[test]
    fn test_smtp_builds_each_tls_mode() {
        let mut config = RelayConfig {
            host: "smtp.example.com".into(),
            ..RelayConfig::default()
        };
        assert!(SmtpReplySender::new(&config).is_ok());

        config.use_ssl = true;
        config.port = 465;
        assert!(SmtpReplySender::new(&config).is_ok());

        config.use_ssl = false;
        config.use_tls = false;
        config.username = "user".into();
        let sender = SmtpReplySender::new(&config).unwrap();
        assert_eq!(sender.mode(), DeliveryMode::Send);
        assert!(sender.persists());
    }

    #[test]
    fn test_draft_writer_mode() {
        let writer = ImapDraftWriter::new(MailboxConfig::default());
        assert_eq!(writer.mode(), DeliveryMode::Draft);
        assert!(writer.persists());
    }

    #[tokio::test]
    async fn test_logging_delivery_does_not_persist() {
        let delivery = LoggingDelivery::new(DeliveryMode::Draft);
        let draft = DraftComposer::new("me@example.com")
            .unwrap()
            .compose("ann@example.com", "Hi", "Hello", None)
            .unwrap();

        delivery.deliver(&draft).await.unwrap();
        assert!(!delivery.persists());
        assert_eq!(delivery.mode(), DeliveryMode::Draft);
    }
}
