//! `maildraft onboard` — write a default configuration file.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use maildraft_core::config::{get_config_path, provider_key_var, save_config, Config};

use crate::helpers::print_title;

/// Run the onboard command.
pub fn run() -> Result<()> {
    print_title("maildraft setup");

    let config_path = get_config_path();
    if create_default_config(&config_path)? {
        println!(
            "  {} created config at {}",
            "✓".green(),
            config_path.display()
        );
    } else {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    }

    let defaults = Config::default();
    println!();
    println!("  Fill in the mailbox and completion sections, or set:");
    println!(
        "    {}",
        format!(
            "IMAP_HOST IMAP_USER IMAP_PASS {}",
            provider_key_var(&defaults.completion.provider)
        )
        .dimmed()
    );
    println!();
    println!(
        "{}",
        "  Setup complete! Run `maildraft status` to check, then `maildraft run`.".green()
    );
    println!();

    Ok(())
}

/// Write a default config at `path` unless one is already there.
///
/// Returns `true` when a file was created.
fn create_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
