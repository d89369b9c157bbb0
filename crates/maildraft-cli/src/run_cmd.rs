//! `maildraft run` — one pass over unread mail.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

use maildraft_core::config::{load_config, Config, DeliveryMode};
use maildraft_core::utils::expand_home;
use maildraft_core::ProcessedRegistry;
use maildraft_mail::{
    Delivery, DraftComposer, ImapDraftWriter, ImapMailboxReader, LoggingDelivery, SmtpReplySender,
};
use maildraft_pipeline::{Pipeline, RunReport};
use maildraft_providers::HttpCompletionGateway;

/// Command-line overrides for a run.
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub mode: Option<DeliveryMode>,
    pub limit: Option<usize>,
    pub dry_run: bool,
}

/// Run the pipeline once. Fatal errors bubble up as a non-zero exit.
pub async fn run(args: RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref()).context("failed to load configuration")?;
    let config = apply_overrides(config, &args);
    config.validate().context("configuration is incomplete")?;

    let registry_path = expand_home(&config.pipeline.processed_file);
    let mut registry = ProcessedRegistry::load(&registry_path)
        .context("failed to load the processed-message registry")?;

    let pipeline = build_pipeline(&config, args.dry_run)?;
    info!(
        processed_file = %registry_path.display(),
        known = registry.len(),
        "registry ready"
    );

    let report = pipeline
        .run(&mut registry)
        .await
        .context("run aborted")?;

    print_summary(&report, pipeline.mode(), args.dry_run);
    Ok(())
}

/// CLI flags win over file and environment.
fn apply_overrides(mut config: Config, args: &RunArgs) -> Config {
    if let Some(mode) = args.mode {
        config.pipeline.mode = mode;
    }
    if let Some(limit) = args.limit {
        config.pipeline.batch_limit = limit;
    }
    config
}

/// Wire the IMAP reader, HTTP gateway, composer and delivery together.
fn build_pipeline(config: &Config, dry_run: bool) -> Result<Pipeline> {
    let gateway = HttpCompletionGateway::new(&config.completion)
        .context("failed to set up the completion gateway")?;
    let composer = DraftComposer::new(config.mailbox.effective_from())
        .context("invalid sender address (mailbox.fromAddress / mailbox.username)")?;

    let delivery: Arc<dyn Delivery> = if dry_run {
        Arc::new(LoggingDelivery::new(config.pipeline.mode))
    } else {
        match config.pipeline.mode {
            DeliveryMode::Draft => Arc::new(ImapDraftWriter::new(config.mailbox.clone())),
            DeliveryMode::Send => Arc::new(
                SmtpReplySender::new(&config.relay).context("failed to set up the SMTP relay")?,
            ),
        }
    };

    Ok(Pipeline::new(
        Arc::new(ImapMailboxReader::new(config.mailbox.clone())),
        Arc::new(gateway),
        composer,
        delivery,
        config.pipeline.batch_limit,
        config.pipeline.max_body_chars,
    ))
}

fn print_summary(report: &RunReport, mode: DeliveryMode, dry_run: bool) {
    let verb = match (dry_run, mode) {
        (true, _) => "composed (dry run)",
        (false, DeliveryMode::Draft) => "saved as drafts",
        (false, DeliveryMode::Send) => "sent",
    };

    println!();
    println!(
        "  {:<12} {} unread, {} attempted",
        "Mailbox:".bold(),
        report.unread,
        report.attempted
    );
    println!(
        "  {:<12} {} {}",
        "Replies:".bold(),
        report.delivered.len().to_string().green(),
        verb
    );
    if !report.failed.is_empty() {
        println!(
            "  {:<12} {}",
            "Failed:".bold(),
            report.failed.len().to_string().red()
        );
        for (id, failure) in &report.failed {
            println!("    {} {}", id.dimmed(), failure);
        }
    }
    println!();
}
