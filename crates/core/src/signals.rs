//! Host signals — the capability interface for host-dependent facts.
//!
//! Whether a sender is privileged or a message is a reply can only be decided
//! by the host platform (badges, markup, thread metadata). The classifier never
//! looks at those details itself; it asks through [`HostSignals`].

use crate::message::ChatEvent;

/// Host-provided facts about an event.
pub trait HostSignals: Send + Sync {
    /// Sender must never be classified (moderator, broadcaster, ...).
    fn is_exempt(&self, event: &ChatEvent) -> bool;

    /// Event is a reply to another message.
    fn is_reply(&self, event: &ChatEvent) -> bool;
}

/// Trusts the flags the ingest adapter already set on the event.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventFlags;

impl HostSignals for EventFlags {
    fn is_exempt(&self, event: &ChatEvent) -> bool {
        event.is_exempt
    }

    fn is_reply(&self, event: &ChatEvent) -> bool {
        event.is_reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_flags_reads_event_fields() {
        let signals = EventFlags;
        let plain = ChatEvent::new("u", "hello");
        assert!(!signals.is_exempt(&plain));
        assert!(!signals.is_reply(&plain));

        let flagged = ChatEvent::new("u", "hello").exempt().reply();
        assert!(signals.is_exempt(&flagged));
        assert!(signals.is_reply(&flagged));
    }
}
