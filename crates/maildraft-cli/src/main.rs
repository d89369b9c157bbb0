//! maildraft CLI — entry point.
//!
//! # Commands
//!
//! - `maildraft run [--config PATH] [--mode draft|send] [--limit N] [--dry-run] [--logs]`
//!   — answer unread mail once
//! - `maildraft status [--config PATH]` — show configuration and registry state
//! - `maildraft onboard` — write a default config file

mod helpers;
mod onboard;
mod run_cmd;
mod status;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use maildraft_core::config::DeliveryMode;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// maildraft — draft replies to unread mail with a language model
#[derive(Parser)]
#[command(name = "maildraft", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process unread mail once and exit
    Run {
        /// Config file (default: ~/.maildraft/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Delivery mode: "draft" or "send"
        #[arg(short, long)]
        mode: Option<DeliveryMode>,

        /// Max messages to process in this run
        #[arg(short, long)]
        limit: Option<usize>,

        /// Generate and compose but deliver nothing
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and registry status
    Status {
        /// Config file (default: ~/.maildraft/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write a default configuration file
    Onboard,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            mode,
            limit,
            dry_run,
            logs,
        } => {
            init_logging(logs);
            run_cmd::run(run_cmd::RunArgs {
                config,
                mode,
                limit,
                dry_run,
            })
            .await
        }
        Commands::Status { config } => status::run(config.as_deref()),
        Commands::Onboard => onboard::run(),
    }
}

/// Initialize tracing/logging.
///
/// `--logs` forces debug output for maildraft crates; otherwise `RUST_LOG`
/// applies, falling back to `info`.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("maildraft=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_flags() {
        let cli = Cli::try_parse_from([
            "maildraft", "run", "--mode", "send", "--limit", "3", "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                mode,
                limit,
                dry_run,
                logs,
                config,
            } => {
                assert_eq!(mode, Some(DeliveryMode::Send));
                assert_eq!(limit, Some(3));
                assert!(dry_run);
                assert!(!logs);
                assert!(config.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn parse_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["maildraft", "run", "--mode", "fax"]).is_err());
    }

    #[test]
    fn parse_status_with_config() {
        let cli = Cli::try_parse_from(["maildraft", "status", "-c", "/tmp/md.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Status { config: Some(ref p) } if p == &PathBuf::from("/tmp/md.json")
        ));
    }
}
