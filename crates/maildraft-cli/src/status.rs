//! `maildraft status` — show configuration and registry state.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use maildraft_core::config::{get_config_path, load_config, provider_key_var, DeliveryMode};
use maildraft_core::utils::{expand_home, mask_secret};
use maildraft_core::ProcessedRegistry;
use maildraft_providers::find_by_name;

use crate::helpers::{endpoint, mark, print_title};

/// Run the status command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);
    let config = load_config(Some(&path)).context("failed to load configuration")?;

    print_title("maildraft status");

    println!(
        "  {:<16} {} {}",
        "Config:".bold(),
        path.display(),
        mark(path.exists(), "(not found, using defaults)")
    );

    // Mailbox
    let mailbox = &config.mailbox;
    println!(
        "  {:<16} {}{}",
        "Mailbox:".bold(),
        endpoint(&mailbox.username, &mailbox.host, mailbox.port),
        if mailbox.use_ssl { "" } else { " (plain)" }
    );
    println!(
        "  {:<16} {} → {}",
        "Folders:".bold(),
        mailbox.inbox,
        mailbox.drafts_folder
    );

    // Mode
    println!("  {:<16} {}", "Mode:".bold(), config.pipeline.mode);
    if config.pipeline.mode == DeliveryMode::Send {
        let relay = &config.relay;
        println!(
            "  {:<16} {}",
            "Relay:".bold(),
            endpoint(&relay.username, &relay.host, relay.port)
        );
    }
    println!(
        "  {:<16} {} per run",
        "Batch limit:".bold(),
        config.pipeline.batch_limit
    );

    // Completion provider
    let completion = &config.completion;
    match find_by_name(&completion.provider) {
        Some(spec) => {
            let model = completion
                .model
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(spec.default_model);
            println!(
                "  {:<16} {} {}",
                "Provider:".bold(),
                spec.display_name,
                format!("({model})").dimmed()
            );
        }
        None => println!(
            "  {:<16} {}",
            "Provider:".bold(),
            format!("unknown provider '{}'", completion.provider).red()
        ),
    }
    let key_status = if completion.api_key.is_empty() {
        format!(
            "{}",
            format!("· not set ({})", provider_key_var(&completion.provider)).dimmed()
        )
    } else {
        format!("{} {}", "✓".green(), mask_secret(&completion.api_key).dimmed())
    };
    println!("  {:<16} {}", "API key:".bold(), key_status);

    // Registry
    let registry_path = expand_home(&config.pipeline.processed_file);
    let registry_status = match ProcessedRegistry::load(&registry_path) {
        Ok(registry) => format!("{} processed", registry.len()),
        Err(e) => format!("{}", e.to_string().red()),
    };
    println!(
        "  {:<16} {} {}",
        "Registry:".bold(),
        registry_path.display(),
        registry_status.dimmed()
    );

    // Validation
    println!();
    match config.validate() {
        Ok(()) => println!("  {}", "Ready to run.".green()),
        Err(e) => println!("  {} {}", "✗".red(), e),
    }
    println!();

    Ok(())
}
