//! Sliding-window state behind the redundancy rules.
//!
//! Three independent collections:
//! - per-sender history, a ring buffer of [`HISTORY_CAPACITY`] entries,
//! - the cross-sender duplicate window,
//! - the cross-sender emote-signature window.
//!
//! Windows are pruned lazily: every query first drops entries with
//! `now - timestamp >= window`. Pruning is a linear pass, so a lookup costs
//! O(window population). The global windows are bounded by time only; a burst
//! of traffic inside one window grows them until the burst ages out.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Most recent messages kept per sender, regardless of age.
pub const HISTORY_CAPACITY: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserHistoryEntry {
    pub cleaned: String,
    pub raw: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalDuplicateEntry {
    pub sender_id: String,
    pub cleaned: String,
    pub raw: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmoteSignatureEntry {
    pub sender_id: String,
    pub signature: String,
    pub timestamp: DateTime<Utc>,
}

/// All mutable state of one classifier.
///
/// Only the classifier that owns the store mutates it.
#[derive(Debug, Default)]
pub struct StateStore {
    histories: HashMap<String, VecDeque<UserHistoryEntry>>,
    duplicates: VecDeque<GlobalDuplicateEntry>,
    signatures: VecDeque<EmoteSignatureEntry>,
}

/// An entry is expired once `now - timestamp >= window`. Entries stamped in
/// the future never expire early.
fn expired(now: DateTime<Utc>, timestamp: DateTime<Utc>, window: Duration) -> bool {
    match (now - timestamp).to_std() {
        Ok(elapsed) => elapsed >= window,
        Err(_) => false,
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Per-sender history ─────────────────────────────────────────

    /// Append to a sender's history, evicting the oldest entry past capacity.
    pub fn record_user_message(&mut self, sender_id: &str, entry: UserHistoryEntry) {
        let history = self
            .histories
            .entry(sender_id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(HISTORY_CAPACITY + 1));
        history.push_back(entry);
        while history.len() > HISTORY_CAPACITY {
            history.pop_front();
        }
    }

    /// A sender's history inside `window`, oldest first.
    pub fn recent_user_history(
        &mut self,
        sender_id: &str,
        now: DateTime<Utc>,
        window: Duration,
    ) -> &[UserHistoryEntry] {
        match self.histories.get_mut(sender_id) {
            Some(history) => {
                history.retain(|e| !expired(now, e.timestamp, window));
                history.make_contiguous()
            }
            None => &[],
        }
    }

    /// Drop senders whose whole history has aged out of `window`.
    /// Returns how many senders were removed.
    pub fn sweep_idle(&mut self, now: DateTime<Utc>, window: Duration) -> usize {
        let before = self.histories.len();
        self.histories
            .retain(|_, history| history.iter().any(|e| !expired(now, e.timestamp, window)));
        before - self.histories.len()
    }

    // ── Cross-sender duplicate window ──────────────────────────────

    pub fn recent_duplicates(
        &mut self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> &VecDeque<GlobalDuplicateEntry> {
        self.duplicates.retain(|e| !expired(now, e.timestamp, window));
        &self.duplicates
    }

    pub fn record_duplicate(&mut self, entry: GlobalDuplicateEntry) {
        self.duplicates.push_back(entry);
    }

    // ── Cross-sender emote-signature window ────────────────────────

    pub fn recent_signatures(
        &mut self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> &VecDeque<EmoteSignatureEntry> {
        self.signatures.retain(|e| !expired(now, e.timestamp, window));
        &self.signatures
    }

    pub fn record_signature(&mut self, entry: EmoteSignatureEntry) {
        self.signatures.push_back(entry);
    }

    // ── Introspection ──────────────────────────────────────────────

    /// Senders with a history, including ones not yet swept.
    pub fn sender_count(&self) -> usize {
        self.histories.len()
    }

    /// Unpruned size of the duplicate window.
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }

    /// Unpruned size of the signature window.
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    /// Unpruned history length of one sender.
    pub fn history_len(&self, sender_id: &str) -> usize {
        self.histories.get(sender_id).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty() && self.duplicates.is_empty() && self.signatures.is_empty()
    }

    pub fn clear(&mut self) {
        self.histories.clear();
        self.duplicates.clear();
        self.signatures.clear();
    }
}
