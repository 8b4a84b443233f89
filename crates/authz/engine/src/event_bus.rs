//! Event bus for authorization lifecycle events
//!
//! Publishes engine events over a broadcast channel for the ledger and
//! notification services. Send errors from having zero receivers are
//! ignored; the audit log, not the bus, is the durable record.

use authz_types::AuthzEvent;
use std::collections::HashMap;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Broadcast publisher with per-type counters
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<AuthzEvent>,
    event_counts: HashMap<&'static str, u64>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            sender,
            event_counts: HashMap::new(),
        }
    }

    /// Publish an event
    pub fn publish(&mut self, event: AuthzEvent) {
        *self.event_counts.entry(event.kind()).or_insert(0) += 1;
        let _ = self.sender.send(event);
    }

    /// Subscribe to events (returns a receiver)
    pub fn subscribe(&self) -> broadcast::Receiver<AuthzEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Events published so far, by kind
    pub fn event_counts(&self) -> &HashMap<&'static str, u64> {
        &self.event_counts
    }

    /// Count for one event kind
    pub fn count_of(&self, kind: &str) -> u64 {
        self.event_counts.get(kind).copied().unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authz_types::SessionId;

    #[test]
    fn test_publish_without_subscribers() {
        let mut bus = EventBus::new();
        bus.publish(AuthzEvent::SessionApproved {
            session_id: SessionId::new("session-1"),
        });
        assert_eq!(bus.count_of("session_approved"), 1);
    }

    #[test]
    fn test_subscriber_receives_events() {
        let mut bus = EventBus::new();
        let mut receiver = bus.subscribe();

        let event = AuthzEvent::SessionExpired {
            session_id: SessionId::new("session-1"),
        };
        bus.publish(event.clone());

        assert_eq!(receiver.try_recv().unwrap(), event);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_counts_accumulate_by_kind() {
        let mut bus = EventBus::new();
        for i in 0..3 {
            bus.publish(AuthzEvent::SessionApproved {
                session_id: SessionId::new(format!("session-{}", i)),
            });
        }
        bus.publish(AuthzEvent::SessionExpired {
            session_id: SessionId::new("session-9"),
        });

        assert_eq!(bus.count_of("session_approved"), 3);
        assert_eq!(bus.count_of("session_expired"), 1);
        assert_eq!(bus.count_of("officer_authorized"), 0);
    }
}
