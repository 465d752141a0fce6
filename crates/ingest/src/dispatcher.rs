//! The processing loop.
//!
//! One tokio task owns the [`Classifier`]. It moves everything the sources
//! deliver into a FIFO queue and classifies at most `batch_size` queued events
//! per tick, sleeping `tick_interval` between ticks while work remains. Events
//! are never reordered and each one is fully classified before the next.
//!
//! A per-event failure (undecodable payload, malformed event) is logged,
//! counted and skipped; it never stalls the queue.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chatsieve_config::IngestConfig;
use chatsieve_core::{
    ChatEvent, Classification, DomainEvent, Error, EventBus, RuleTag, SkipReason, Verdict,
};
use chatsieve_filter::Classifier;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::source::SourceItem;

/// A classified, non-skipped event.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub event: ChatEvent,
    /// `None` when the event is clean
    pub verdict: Option<Verdict>,
}

impl Outcome {
    pub fn is_flagged(&self) -> bool {
        self.verdict.is_some()
    }
}

/// Counters for one run of the loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Items taken off the queue, failures included
    pub received: u64,
    pub clean: u64,
    pub flagged: BTreeMap<RuleTag, u64>,
    pub skipped_reply: u64,
    pub skipped_exempt: u64,
    pub skipped_empty: u64,
    pub failed: u64,
    pub ticks: u64,
}

impl DispatchStats {
    pub fn flagged_total(&self) -> u64 {
        self.flagged.values().sum()
    }

    pub fn skipped_total(&self) -> u64 {
        self.skipped_reply + self.skipped_exempt + self.skipped_empty
    }

    pub fn flagged_for(&self, rule: RuleTag) -> u64 {
        self.flagged.get(&rule).copied().unwrap_or(0)
    }

    fn record(&mut self, classification: &Classification) {
        match classification {
            Classification::Clean => self.clean += 1,
            Classification::Flagged(verdict) => *self.flagged.entry(verdict.rule).or_insert(0) += 1,
            Classification::Skipped(SkipReason::Reply) => self.skipped_reply += 1,
            Classification::Skipped(SkipReason::Exempt) => self.skipped_exempt += 1,
            Classification::Skipped(SkipReason::Empty) => self.skipped_empty += 1,
        }
    }
}

/// Drives a classifier from an event channel.
pub struct Dispatcher {
    classifier: Classifier,
    batch_size: usize,
    tick_interval: Duration,
    output_capacity: usize,
    bus: Option<Arc<EventBus>>,
}

impl Dispatcher {
    pub fn new(classifier: Classifier, config: &IngestConfig) -> Self {
        Self {
            classifier,
            batch_size: config.batch_size.max(1),
            tick_interval: config.tick_interval(),
            output_capacity: config.channel_capacity.max(1),
            bus: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Zero yields to the runtime between ticks instead of sleeping.
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Also publish flagged/failed events on `bus`.
    pub fn with_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Spawn the loop.
    ///
    /// The loop ends when `events` is closed and the queue is drained, or when
    /// the returned outcome receiver is dropped. The join handle yields the
    /// final statistics.
    pub fn start(
        self,
        mut events: mpsc::Receiver<SourceItem>,
    ) -> (mpsc::Receiver<Outcome>, JoinHandle<DispatchStats>) {
        let (tx, rx) = mpsc::channel::<Outcome>(self.output_capacity);
        let batch_size = self.batch_size;
        let tick_interval = self.tick_interval;
        let mut worker = Worker {
            classifier: self.classifier,
            bus: self.bus,
            output: tx,
            stats: DispatchStats::default(),
            latest: None,
        };

        let handle = tokio::spawn(async move {
            let mut pending: VecDeque<SourceItem> = VecDeque::new();
            let mut open = true;

            loop {
                if pending.is_empty() {
                    if !open {
                        break;
                    }
                    match events.recv().await {
                        Some(item) => pending.push_back(item),
                        None => break,
                    }
                }

                while open {
                    match events.try_recv() {
                        Ok(item) => pending.push_back(item),
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => open = false,
                    }
                }

                worker.stats.ticks += 1;
                for _ in 0..batch_size {
                    let Some(item) = pending.pop_front() else {
                        break;
                    };
                    if !worker.handle(item).await {
                        debug!("Outcome receiver dropped, stopping dispatch loop");
                        return worker.stats;
                    }
                }
                worker.sweep();

                if !pending.is_empty() {
                    if tick_interval.is_zero() {
                        tokio::task::yield_now().await;
                    } else {
                        tokio::time::sleep(tick_interval).await;
                    }
                }
            }

            info!(
                received = worker.stats.received,
                flagged = worker.stats.flagged_total(),
                failed = worker.stats.failed,
                "Dispatch loop finished"
            );
            worker.stats
        });

        (rx, handle)
    }
}

struct Worker {
    classifier: Classifier,
    bus: Option<Arc<EventBus>>,
    output: mpsc::Sender<Outcome>,
    stats: DispatchStats,
    /// Latest event timestamp seen; the reference time for idle sweeps
    latest: Option<DateTime<Utc>>,
}

impl Worker {
    /// Classify one item. Returns `false` once nobody listens for outcomes.
    async fn handle(&mut self, item: SourceItem) -> bool {
        self.stats.received += 1;

        let event = match item {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Dropping undeliverable event");
                self.fail("ingest", e.into());
                return true;
            }
        };

        if self.latest.is_none_or(|latest| event.timestamp > latest) {
            self.latest = Some(event.timestamp);
        }

        let classification = match self.classifier.classify(&event) {
            Ok(c) => c,
            Err(e) => {
                warn!(sender = %event.sender_id, error = %e, "Skipping event");
                self.fail(&format!("sender {}", event.sender_id), e.into());
                return true;
            }
        };
        self.stats.record(&classification);

        let verdict = match classification {
            Classification::Skipped(reason) => {
                self.publish(DomainEvent::MessageSkipped {
                    sender_id: event.sender_id.clone(),
                    reason,
                    timestamp: event.timestamp,
                });
                return true;
            }
            Classification::Clean => None,
            Classification::Flagged(verdict) => {
                self.publish(DomainEvent::MessageFlagged {
                    sender_id: event.sender_id.clone(),
                    rule: verdict.rule,
                    description: verdict.description(),
                    content_preview: event.preview(),
                    timestamp: event.timestamp,
                });
                Some(verdict)
            }
        };

        self.output.send(Outcome { event, verdict }).await.is_ok()
    }

    fn sweep(&mut self) {
        if let Some(now) = self.latest {
            self.classifier.sweep_idle(now);
        }
    }

    fn fail(&mut self, context: &str, error: Error) {
        self.stats.failed += 1;
        self.publish(DomainEvent::EventFailed {
            context: context.to_string(),
            error_message: error.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.bus {
            bus.publish(event);
        }
    }
}
