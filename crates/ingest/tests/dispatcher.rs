//! End-to-end: sources → dispatcher → outcomes.

use std::sync::Arc;
use std::time::Duration;

use chatsieve_config::{FilterConfig, IngestConfig};
use chatsieve_core::{ChatEvent, IngestError, RuleTag};
use chatsieve_filter::Classifier;
use chatsieve_ingest::{
    DispatchStats, Dispatcher, EventSource, JsonLinesSource, MemorySource, Outcome, PolicySignals,
};
use chrono::{DateTime, TimeDelta, Utc};

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn msg(sender: &str, text: &str, secs: i64) -> ChatEvent {
    ChatEvent::new(sender, text).at(t0() + TimeDelta::seconds(secs))
}

async fn drive(source: &dyn EventSource, ingest: IngestConfig) -> (Vec<Outcome>, DispatchStats) {
    let classifier = Classifier::new(FilterConfig::default())
        .unwrap()
        .with_signals(Arc::new(PolicySignals::from_config(&ingest)));
    let dispatcher =
        Dispatcher::new(classifier, &ingest).with_tick_interval(Duration::from_millis(1));

    let events = source.start().await.unwrap();
    let (mut outcomes, handle) = dispatcher.start(events);
    let mut collected = Vec::new();
    while let Some(outcome) = outcomes.recv().await {
        collected.push(outcome);
    }
    (collected, handle.await.unwrap())
}

#[tokio::test]
async fn outcomes_keep_arrival_order() {
    let events: Vec<ChatEvent> = (0..60)
        .map(|i| {
            let text = format!("unique chat line {}", "x".repeat(i % 4 + 1));
            msg(&format!("viewer{i}"), &text, i as i64)
        })
        .collect();
    let expected: Vec<String> = events.iter().map(|e| e.sender_id.clone()).collect();

    let ingest = IngestConfig {
        batch_size: 7,
        ..IngestConfig::default()
    };
    let (outcomes, stats) = drive(&MemorySource::new(events), ingest).await;

    let senders: Vec<String> = outcomes.iter().map(|o| o.event.sender_id.clone()).collect();
    assert_eq!(senders, expected);
    assert_eq!(stats.received, 60);
    assert!(stats.ticks >= 60 / 7);
}

#[tokio::test]
async fn copy_paste_across_senders_carries_evidence() {
    let source = MemorySource::new([
        msg("alice", "free followers at example dot com", 0),
        msg("bob", "free followers at example dot com", 2),
    ]);
    let (outcomes, stats) = drive(&source, IngestConfig::default()).await;

    assert_eq!(outcomes.len(), 2);
    assert!(!outcomes[0].is_flagged());
    let verdict = outcomes[1].verdict.as_ref().unwrap();
    assert_eq!(verdict.rule, RuleTag::CopyPaste);
    let evidence = verdict.evidence.as_ref().unwrap();
    assert_eq!(evidence.trigger_sender_id, "alice");
    assert_eq!(stats.flagged_for(RuleTag::CopyPaste), 1);
}

#[tokio::test]
async fn failures_do_not_stall_the_queue() {
    let source = MemorySource::from_items([
        Ok(msg("a", "first message here", 0)),
        Err(IngestError::InvalidPayload("line 2: expected value".into())),
        Ok(msg("", "blank sender", 2)),
        Ok(msg("b", "last message here", 3)),
    ]);
    let (outcomes, stats) = drive(&source, IngestConfig::default()).await;

    let texts: Vec<&str> = outcomes.iter().map(|o| o.event.raw_text.as_str()).collect();
    assert_eq!(texts, ["first message here", "last message here"]);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.received, 4);
}

#[tokio::test]
async fn configured_exempt_senders_are_skipped() {
    let ingest = IngestConfig {
        exempt_senders: vec!["Nightbot".into()],
        ..IngestConfig::default()
    };
    let source = MemorySource::new([
        msg("nightbot", "FOLLOW THE RULES", 0),
        msg("viewer", "FOLLOW THE RULES", 1),
    ]);
    let (outcomes, stats) = drive(&source, ingest).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].event.sender_id, "viewer");
    assert_eq!(stats.skipped_exempt, 1);
    assert_eq!(stats.flagged_for(RuleTag::AllCaps), 1);
}

#[tokio::test]
async fn batch_size_one_still_drains_everything() {
    let ingest = IngestConfig {
        batch_size: 1,
        ..IngestConfig::default()
    };
    let source = MemorySource::new((0..5).map(|i| msg("u", &format!("spam {i}"), i)));
    let (outcomes, stats) = drive(&source, ingest).await;
    assert_eq!(outcomes.len(), 5);
    assert_eq!(stats.received, 5);
}

#[tokio::test]
async fn json_lines_stream_end_to_end() {
    let input = concat!(
        r#"{"sender_id":"a","raw_text":"","emote_tokens":["Kappa","Kappa","Kappa","Kappa","Kappa","Kappa","Kappa"],"timestamp":"2024-05-01T12:00:00Z"}"#,
        "\n",
        "{broken\n",
        r#"{"sender_id":"b","raw_text":"good game everyone","timestamp":"2024-05-01T12:00:01Z"}"#,
        "\n",
    );
    let source = JsonLinesSource::from_reader("fixture", input.as_bytes());
    let (outcomes, stats) = drive(&source, IngestConfig::default()).await;

    assert_eq!(outcomes.len(), 2);
    let verdict = outcomes[0].verdict.as_ref().unwrap();
    assert_eq!(verdict.rule, RuleTag::EmoteCount);
    assert_eq!((verdict.limit, verdict.reached), (6, 7));
    assert!(!outcomes[1].is_flagged());
    assert_eq!(stats.failed, 1);
}
