//! Completion provider layer for maildraft.
//!
//! # Architecture
//!
//! - [`traits::CompletionGateway`] — trait the pipeline generates replies through
//! - [`registry`] — static specs for the supported providers
//! - [`prompt`] — system instruction and user turn for one email
//! - [`http_provider::HttpCompletionGateway`] — OpenAI-compatible HTTP client

pub mod http_provider;
pub mod prompt;
pub mod registry;
pub mod traits;

// Re-export main types for convenience
pub use http_provider::HttpCompletionGateway;
pub use prompt::{build_messages, DEFAULT_SYSTEM_PROMPT, EMPTY_BODY_PLACEHOLDER};
pub use registry::{find_by_name, ProviderSpec, PROVIDERS};
pub use traits::{CompletionGateway, GenerationError};
