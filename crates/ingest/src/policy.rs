//! Exemption policy layered on top of the host's own flags.

use chatsieve_config::IngestConfig;
use chatsieve_core::{ChatEvent, HostSignals};

/// Host signals plus a configured list of always-exempt senders.
///
/// Rules:
/// - an event the host already marked exempt stays exempt
/// - a sender in `exempt_senders` is exempt (ASCII case-insensitive)
/// - `"*"` in the list exempts everyone
/// - replies come from the event flag only
#[derive(Debug, Clone, Default)]
pub struct PolicySignals {
    exempt_senders: Vec<String>,
}

impl PolicySignals {
    pub fn new(exempt_senders: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            exempt_senders: exempt_senders
                .into_iter()
                .map(|s| {
                    let s: String = s.into();
                    s.trim().to_string()
                })
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.exempt_senders.iter().cloned())
    }

    fn listed(&self, sender_id: &str) -> bool {
        self.exempt_senders
            .iter()
            .any(|s| s == "*" || s.eq_ignore_ascii_case(sender_id))
    }
}

impl HostSignals for PolicySignals {
    fn is_exempt(&self, event: &ChatEvent) -> bool {
        event.is_exempt || self.listed(&event.sender_id)
    }

    fn is_reply(&self, event: &ChatEvent) -> bool {
        event.is_reply
    }
}
