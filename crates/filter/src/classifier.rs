//! Rule chain and classifier.
//!
//! [`RuleChain`] is stateless: it evaluates its rules in order against a
//! caller-supplied [`StateStore`] and stops at the first verdict.
//! [`Classifier`] owns a chain, a store and the host signals, and is what the
//! dispatcher drives.

use std::sync::Arc;

use chatsieve_config::FilterConfig;
use chatsieve_core::{
    ChatEvent, Classification, EventFlags, FilterError, HostSignals, RuleTag, SkipReason, Verdict,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::normalize::{NormalizedMessage, normalize};
use crate::rules::{Rule, RuleContext, build_chain};
use crate::store::StateStore;

/// Ordered, first-match-wins list of rules.
pub struct RuleChain {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleChain {
    /// Build the chain for `config`, leaving out disabled rules.
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            rules: build_chain(config),
        }
    }

    /// Evaluate rules in order. Later rules do not run once one fires.
    pub fn evaluate(
        &self,
        event: &ChatEvent,
        message: &NormalizedMessage,
        store: &mut StateStore,
        now: DateTime<Utc>,
    ) -> Option<Verdict> {
        let mut ctx = RuleContext {
            event,
            message,
            store,
            now,
        };
        self.rules.iter().find_map(|rule| rule.evaluate(&mut ctx))
    }

    /// Tags of the active rules in evaluation order.
    pub fn tags(&self) -> Vec<RuleTag> {
        self.rules.iter().map(|r| r.tag()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// One independent spam classifier, e.g. per chat room.
///
/// Not shared between tasks: a single processing loop owns
/// it and classifies events one at a time.
pub struct Classifier {
    config: FilterConfig,
    chain: RuleChain,
    store: StateStore,
    signals: Arc<dyn HostSignals>,
}

impl Classifier {
    /// Create a classifier with an empty store that trusts event flags.
    pub fn new(config: FilterConfig) -> Result<Self, FilterError> {
        config
            .validate()
            .map_err(|e| FilterError::InvalidSettings(e.to_string()))?;
        Ok(Self {
            chain: RuleChain::from_config(&config),
            config,
            store: StateStore::new(),
            signals: Arc::new(EventFlags),
        })
    }

    /// Replace the host signal source.
    pub fn with_signals(mut self, signals: Arc<dyn HostSignals>) -> Self {
        self.signals = signals;
        self
    }

    /// Classify one event against the current window state.
    ///
    /// Skipped events (replies, exempt senders, empty messages) leave the
    /// store untouched. The event timestamp is the reference time for every
    /// window.
    pub fn classify(&mut self, event: &ChatEvent) -> Result<Classification, FilterError> {
        if self.config.ignore_replies && self.signals.is_reply(event) {
            debug!(sender = %event.sender_id, "Reply ignored");
            return Ok(Classification::Skipped(SkipReason::Reply));
        }

        if self.signals.is_exempt(event) {
            debug!(
                sender = %event.sender_id,
                preview = %event.preview(),
                "Exempt sender, not classified"
            );
            return Ok(Classification::Skipped(SkipReason::Exempt));
        }

        let Some(message) = normalize(event)? else {
            return Ok(Classification::Skipped(SkipReason::Empty));
        };

        match self
            .chain
            .evaluate(event, &message, &mut self.store, event.timestamp)
        {
            Some(verdict) => {
                info!(
                    sender = %event.sender_id,
                    rule = %verdict.rule,
                    preview = %event.preview(),
                    "Message flagged: {}",
                    verdict.description()
                );
                Ok(Classification::Flagged(verdict))
            }
            None => Ok(Classification::Clean),
        }
    }

    /// Forget senders with no recent history. Returns how many were dropped.
    pub fn sweep_idle(&mut self, now: DateTime<Utc>) -> usize {
        let removed = self.store.sweep_idle(now, self.config.per_user_window());
        if removed > 0 {
            debug!(removed, remaining = self.store.sender_count(), "Swept idle senders");
        }
        removed
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn chain(&self) -> &RuleChain {
        &self.chain
    }

    /// Drop all window state.
    pub fn reset(&mut self) {
        self.store.clear();
    }
}
