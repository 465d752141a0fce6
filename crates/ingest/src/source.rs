//! Event source trait and the in-memory source.
//!
//! A source is anything that can hand over chat events: a JSON-lines stream,
//! a platform connection, a test fixture. Each source runs on its own task
//! and pushes into an mpsc channel the dispatcher reads from.

use async_trait::async_trait;
use chatsieve_core::{ChatEvent, IngestError};
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

/// Items a source delivers: an event, or a per-item failure that the
/// dispatcher logs and skips.
pub type SourceItem = Result<ChatEvent, IngestError>;

/// A producer of chat events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Start producing. The returned channel closes when the source is
    /// exhausted or its connection ends.
    async fn start(&self) -> Result<mpsc::Receiver<SourceItem>, IngestError>;
}

/// Replays a fixed list of items, then closes.
///
/// Can be started once; a second `start` reports the source as not configured.
pub struct MemorySource {
    items: Mutex<Option<Vec<SourceItem>>>,
}

impl MemorySource {
    pub fn new(events: impl IntoIterator<Item = ChatEvent>) -> Self {
        Self::from_items(events.into_iter().map(Ok))
    }

    /// Build from raw items, including failures to deliver.
    pub fn from_items(items: impl IntoIterator<Item = SourceItem>) -> Self {
        Self {
            items: Mutex::new(Some(items.into_iter().collect())),
        }
    }
}

#[async_trait]
impl EventSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn start(&self) -> Result<mpsc::Receiver<SourceItem>, IngestError> {
        let items = self
            .items
            .lock()
            .await
            .take()
            .ok_or_else(|| IngestError::NotConfigured("memory source already started".into()))?;

        let (tx, rx) = mpsc::channel(items.len().max(1));
        tokio::spawn(async move {
            let total = items.len();
            for item in items {
                if tx.send(item).await.is_err() {
                    debug!("Memory source receiver dropped");
                    return;
                }
            }
            debug!(total, "Memory source exhausted");
        });
        Ok(rx)
    }
}
