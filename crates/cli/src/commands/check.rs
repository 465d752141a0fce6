//! `chatsieve check` — Classify a single message.

use std::path::Path;
use std::sync::Arc;

use chatsieve_core::{ChatEvent, Classification, SkipReason};
use chatsieve_filter::Classifier;
use chatsieve_ingest::PolicySignals;

use super::load_config;

pub fn run(
    config_path: Option<&Path>,
    sender: String,
    emotes: Vec<String>,
    reply: bool,
    text: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let mut classifier = Classifier::new(config.filter)?
        .with_signals(Arc::new(PolicySignals::from_config(&config.ingest)));

    let mut event = ChatEvent::new(sender, text).with_emotes(emotes);
    if reply {
        event = event.reply();
    }

    println!("{}", describe(&classifier.classify(&event)?));
    Ok(())
}

fn describe(classification: &Classification) -> String {
    match classification {
        Classification::Clean => "✅ clean".to_string(),
        Classification::Skipped(reason) => {
            let why = match reason {
                SkipReason::Reply => "reply",
                SkipReason::Exempt => "exempt sender",
                SkipReason::Empty => "empty message",
            };
            format!("⏭️  skipped ({why})")
        }
        Classification::Flagged(verdict) => format!("🚫 flagged {verdict}"),
    }
}
