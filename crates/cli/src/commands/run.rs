//! `chatsieve run` — Classify a JSON-lines event stream.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chatsieve_filter::Classifier;
use chatsieve_ingest::{
    DispatchStats, Dispatcher, EventSource, JsonLinesSource, Outcome, PolicySignals,
};
use clap::ValueEnum;
use tracing::info;

use super::load_config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line per outcome
    Text,
    /// One JSON object per outcome
    Json,
}

pub async fn run(
    config_path: Option<&Path>,
    input: Option<PathBuf>,
    format: OutputFormat,
    flagged_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    let source = match &input {
        Some(path) => JsonLinesSource::open(path).await?,
        None => JsonLinesSource::stdin(),
    }
    .with_buffer(config.ingest.channel_capacity);

    let classifier = Classifier::new(config.filter.clone())?
        .with_signals(Arc::new(PolicySignals::from_config(&config.ingest)));
    info!(
        rules = classifier.chain().len(),
        batch_size = config.ingest.batch_size,
        source = %source.name(),
        "Starting classification"
    );

    let events = source.start().await?;
    let (mut outcomes, handle) = Dispatcher::new(classifier, &config.ingest).start(events);

    while let Some(outcome) = outcomes.recv().await {
        if flagged_only && !outcome.is_flagged() {
            continue;
        }
        match format {
            OutputFormat::Text => println!("{}", format_text(&outcome)),
            OutputFormat::Json => println!("{}", serde_json::to_string(&outcome)?),
        }
    }

    let stats = handle.await?;
    eprintln!("{}", format_stats(&stats));
    Ok(())
}

/// `FLAGGED alice [copy_paste] <description> (first sent by bob) | <preview>`
pub fn format_text(outcome: &Outcome) -> String {
    let event = &outcome.event;
    match &outcome.verdict {
        Some(verdict) => {
            let origin = verdict
                .evidence
                .as_ref()
                .map(|e| format!(" (first sent by {})", e.trigger_sender_id))
                .unwrap_or_default();
            format!(
                "FLAGGED {} {}{} | {}",
                event.sender_id,
                verdict,
                origin,
                event.preview()
            )
        }
        None => format!("ok      {} | {}", event.sender_id, event.preview()),
    }
}

pub fn format_stats(stats: &DispatchStats) -> String {
    let mut out = String::from("📊 Summary\n==========\n");
    out.push_str(&format!("  Received:  {}\n", stats.received));
    out.push_str(&format!("  Clean:     {}\n", stats.clean));
    out.push_str(&format!("  Flagged:   {}\n", stats.flagged_total()));
    for (rule, count) in &stats.flagged {
        out.push_str(&format!("    {:<20} {count}\n", rule.as_str()));
    }
    out.push_str(&format!(
        "  Skipped:   {} (reply {}, exempt {}, empty {})\n",
        stats.skipped_total(),
        stats.skipped_reply,
        stats.skipped_exempt,
        stats.skipped_empty
    ));
    out.push_str(&format!("  Failed:    {}", stats.failed));
    out
}
