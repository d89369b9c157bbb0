//! maildraft mail — the mailbox side of the pipeline.
//!
//! This crate provides:
//! - **imap**: a minimal async IMAP client (read-only inbox access + APPEND)
//! - **reader**: `MailSource` and its IMAP implementation
//! - **decoder**: raw message bytes → `UnreadMessage`
//! - **composer**: `lettre`-built replies
//! - **delivery**: drafts folder, SMTP relay, or dry-run logging

pub mod composer;
pub mod decoder;
pub mod delivery;
pub mod error;
pub mod imap;
pub mod reader;

pub use composer::{Draft, DraftComposer};
pub use decoder::decode;
pub use delivery::{Delivery, ImapDraftWriter, LoggingDelivery, SmtpReplySender};
pub use error::{ComposeError, DecodeError, DeliveryError, MailError};
pub use reader::{ImapMailboxReader, MailSource};
