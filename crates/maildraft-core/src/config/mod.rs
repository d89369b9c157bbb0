//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use maildraft_core::config;
//!
//! let cfg = config::load_config(None).expect("config");
//! println!("Drafts folder: {}", cfg.mailbox.drafts_folder);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{apply_env_overrides, get_config_path, load_config, provider_key_var, save_config};
pub use schema::{CompletionConfig, Config, DeliveryMode, MailboxConfig, PipelineConfig, RelayConfig};
