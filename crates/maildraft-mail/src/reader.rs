//! Unread-mail source.
//!
//! The reader opens the inbox read-only (EXAMINE) and fetches bodies with
//! `BODY.PEEK[]`, so a run leaves every message exactly as unread as it
//! found it. Which messages already have a draft is tracked by the caller's
//! [`ProcessedRegistry`], not by mailbox flags.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use maildraft_core::config::MailboxConfig;
use maildraft_core::{ProcessedRegistry, RawMessage};

use crate::error::MailError;
use crate::imap::ImapClient;

/// Where unread mail comes from.
#[async_trait]
pub trait MailSource: Send + Sync {
    /// Up to `limit` unread messages not yet in `registry`, oldest first.
    ///
    /// Registry entries are skipped before the limit applies, so already
    /// answered mail never uses up a slot.
    async fn fetch_unread(
        &self,
        limit: usize,
        registry: &ProcessedRegistry,
    ) -> Result<Vec<RawMessage>, MailError>;
}

/// Message identifier: UIDVALIDITY-qualified UID, or the bare UID when the
/// server does not announce a UIDVALIDITY.
pub fn message_id(uid_validity: Option<u32>, uid: u32) -> String {
    match uid_validity {
        Some(validity) => format!("{validity}:{uid}"),
        None => uid.to_string(),
    }
}

/// Reads unread mail over IMAP.
#[derive(Clone, Debug)]
pub struct ImapMailboxReader {
    config: MailboxConfig,
}

impl ImapMailboxReader {
    pub fn new(config: MailboxConfig) -> Self {
        Self { config }
    }

    /// Connect, log in and open the inbox read-only.
    async fn open(&self) -> Result<(ImapClient, Option<u32>), MailError> {
        let mut client = ImapClient::connect(
            &self.config.host,
            self.config.port,
            self.config.use_ssl,
            Duration::from_secs(self.config.timeout_secs),
        )
        .await?;

        let opened = async {
            client
                .login(&self.config.username, &self.config.password)
                .await?;
            client.examine(&self.config.inbox).await
        }
        .await;

        match opened {
            Ok(uid_validity) => Ok((client, uid_validity)),
            Err(e) => {
                close(client).await;
                Err(e)
            }
        }
    }

    /// Fresh session after a broken fetch. `None` ends the read phase.
    async fn reopen(&self, uid_validity: Option<u32>) -> Option<ImapClient> {
        match self.open().await {
            Ok((client, validity)) if validity == uid_validity => {
                debug!(inbox = %self.config.inbox, "reconnected");
                Some(client)
            }
            Ok((client, _)) => {
                warn!(inbox = %self.config.inbox, "UIDVALIDITY changed, stopping read phase");
                close(client).await;
                None
            }
            Err(e) => {
                warn!(error = %e, "reconnect failed, stopping read phase");
                None
            }
        }
    }
}

#[async_trait]
impl MailSource for ImapMailboxReader {
    async fn fetch_unread(
        &self,
        limit: usize,
        registry: &ProcessedRegistry,
    ) -> Result<Vec<RawMessage>, MailError> {
        let (mut client, uid_validity) = self.open().await?;
        if uid_validity.is_none() {
            warn!(inbox = %self.config.inbox, "server sent no UIDVALIDITY, using bare UIDs");
        }

        let unseen = match client.uid_search_unseen().await {
            Ok(unseen) => unseen,
            Err(e) => {
                close(client).await;
                return Err(e);
            }
        };
        let pending: Vec<(u32, String)> = unseen
            .iter()
            .map(|&uid| (uid, message_id(uid_validity, uid)))
            .filter(|(_, id)| !registry.contains(id))
            .take(limit)
            .collect();

        info!(
            inbox = %self.config.inbox,
            unseen = unseen.len(),
            selected = pending.len(),
            limit,
            "unread messages found"
        );

        // A failed fetch costs only that message: the session is dropped and
        // the next message is fetched over a new one.
        let mut messages = Vec::with_capacity(pending.len());
        let mut session = Some(client);
        for (uid, id) in pending {
            if session.is_none() {
                match self.reopen(uid_validity).await {
                    Some(client) => session = Some(client),
                    None => break,
                }
            }
            let Some(client) = session.as_mut() else {
                break;
            };

            match client.uid_fetch_peek(uid).await {
                Ok(Some(raw)) => {
                    debug!(id = %id, bytes = raw.len(), "fetched message");
                    messages.push(RawMessage { id, raw });
                }
                Ok(None) => warn!(id = %id, "server returned no body, skipping"),
                Err(MailError::Command { status, .. }) => {
                    warn!(id = %id, status = %status, "fetch refused, skipping");
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "fetch failed, skipping");
                    session = None;
                }
            }
        }

        if let Some(client) = session {
            close(client).await;
        }
        Ok(messages)
    }
}

async fn close(mut client: ImapClient) {
    if let Err(e) = client.logout().await {
        debug!(error = %e, "IMAP logout failed");
    }
}
