//! Pipeline orchestrator — one pass over unread mail.
//!
//! For each selected message: decode → generate → compose → deliver →
//! mark processed → save registry. Messages are handled strictly one after
//! another; a failure on one message never stops the batch.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use maildraft_core::config::DeliveryMode;
use maildraft_core::utils::truncate_chars;
use maildraft_core::{ProcessedRegistry, RawMessage, RegistryError};
use maildraft_mail::{
    decode, ComposeError, DecodeError, Delivery, DeliveryError, DraftComposer, MailError,
    MailSource,
};
use maildraft_providers::{CompletionGateway, GenerationError};

/// Errors that abort the whole run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The mailbox could not be read at all.
    #[error("mailbox unavailable: {0}")]
    Mailbox(#[from] MailError),

    /// A delivered message could not be recorded. Continuing would risk
    /// answering it again on the next run.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Why a single message was left unprocessed.
#[derive(Debug, thiserror::Error)]
pub enum MessageFailure {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("compose failed: {0}")]
    Compose(#[from] ComposeError),

    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Outcome of one run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Messages returned by the mailbox reader.
    pub unread: usize,
    /// Messages the pipeline tried to answer.
    pub attempted: usize,
    /// Ids delivered (or, in a dry run, composed) successfully.
    pub delivered: Vec<String>,
    /// Ids that failed, with the reason.
    pub failed: Vec<(String, MessageFailure)>,
}

impl RunReport {
    /// `true` when every attempted message was delivered.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Wires the reader, completion gateway, composer and delivery together.
pub struct Pipeline {
    source: Arc<dyn MailSource>,
    gateway: Arc<dyn CompletionGateway>,
    composer: DraftComposer,
    delivery: Arc<dyn Delivery>,
    /// Max messages attempted per run.
    batch_limit: usize,
    /// Body characters passed to the gateway.
    max_body_chars: usize,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn MailSource>,
        gateway: Arc<dyn CompletionGateway>,
        composer: DraftComposer,
        delivery: Arc<dyn Delivery>,
        batch_limit: usize,
        max_body_chars: usize,
    ) -> Self {
        Self {
            source,
            gateway,
            composer,
            delivery,
            batch_limit,
            max_body_chars,
        }
    }

    /// Delivery target of this pipeline.
    pub fn mode(&self) -> DeliveryMode {
        self.delivery.mode()
    }

    /// Run one pass.
    ///
    /// Each successfully delivered id is added to `registry` and the registry
    /// is saved before the next message is touched.
    pub async fn run(&self, registry: &mut ProcessedRegistry) -> Result<RunReport, PipelineError> {
        info!(
            mode = %self.delivery.mode(),
            limit = self.batch_limit,
            provider = self.gateway.display_name(),
            model = self.gateway.model(),
            dry_run = !self.delivery.persists(),
            "starting run"
        );

        let fetched = self.source.fetch_unread(self.batch_limit, registry).await?;

        let mut report = RunReport {
            unread: fetched.len(),
            ..RunReport::default()
        };

        let selected: Vec<RawMessage> = fetched
            .into_iter()
            .filter(|raw| {
                let done = registry.contains(&raw.id);
                if done {
                    debug!(id = %raw.id, "already processed, skipping");
                }
                !done
            })
            .take(self.batch_limit)
            .collect();

        for raw in selected {
            report.attempted += 1;

            match self.process(&raw).await {
                Ok(()) => {
                    if self.delivery.persists() {
                        registry.mark_processed(raw.id.clone());
                        if let Err(e) = registry.save() {
                            error!(id = %raw.id, error = %e, "failed to record processed message, stopping");
                            return Err(e.into());
                        }
                    }
                    report.delivered.push(raw.id);
                }
                Err(failure) => {
                    warn!(id = %raw.id, error = %failure, "message left unprocessed");
                    report.failed.push((raw.id, failure));
                }
            }
        }

        info!(
            unread = report.unread,
            attempted = report.attempted,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "run finished"
        );
        Ok(report)
    }

    /// Decode, generate, compose and deliver one message.
    async fn process(&self, raw: &RawMessage) -> Result<(), MessageFailure> {
        let message = decode(&raw.id, &raw.raw)?;
        let body = truncate_chars(&message.body, self.max_body_chars);
        if body.len() < message.body.len() {
            debug!(id = %message.id, max_chars = self.max_body_chars, "body truncated");
        }

        debug!(id = %message.id, from = %message.sender, subject = %message.subject, "generating reply");
        let reply = self
            .gateway
            .generate(body, &message.subject, &message.sender)
            .await?;

        let draft = self.composer.reply_to(&message, &reply)?;

        self.delivery.deliver(&draft).await?;
        info!(id = %message.id, to = %draft.recipient, mode = %self.delivery.mode(), "reply delivered");
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
