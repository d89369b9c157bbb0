//! Run-level error types shared across the workspace.
//!
//! Anything in here aborts a run before (or instead of) touching a message.
//! Per-message failures live next to the component that produces them.

use std::path::PathBuf;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {}", keys.join(", "))]
    MissingRequired { keys: Vec<String> },

    #[error("invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Processed-set registry errors.
///
/// A registry that cannot be read is never treated as empty: doing so would
/// re-answer mail that already has a draft.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read processed registry {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("processed registry {path} is corrupt: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write processed registry {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
