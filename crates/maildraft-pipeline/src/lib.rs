//! maildraft pipeline — one pass from unread mail to delivered replies.
//!
//! [`Pipeline`] ties a [`maildraft_mail::MailSource`], a
//! [`maildraft_providers::CompletionGateway`] and a
//! [`maildraft_mail::Delivery`] together and records progress in a
//! [`maildraft_core::ProcessedRegistry`].

pub mod pipeline;

pub use pipeline::{MessageFailure, Pipeline, PipelineError, RunReport};
