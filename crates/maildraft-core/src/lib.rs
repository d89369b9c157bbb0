//! maildraft-core — shared types, configuration and the processed-message
//! registry.

pub mod config;
pub mod error;
pub mod processed;
pub mod types;
pub mod utils;

pub use error::{ConfigError, RegistryError};
pub use processed::ProcessedRegistry;
pub use types::{RawMessage, UnreadMessage};
