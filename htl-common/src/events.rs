//! Event types for the HTL event system
//!
//! Provides shared event definitions and the EventBus used to fan live vote
//! activity out to the tally merger and any connected SSE clients.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// HTL event types
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LabEvent {
    /// A vote was durably recorded
    ///
    /// Emitted by the vote store after a successful insert only, never for
    /// a duplicate rejection, so each recorded vote produces exactly one
    /// event. `seq` is the vote row's monotonic sequence; the tally merge
    /// uses it to stay idempotent under replay.
    ///
    /// Triggers:
    /// - Tally merger: apply a +1 increment for (round_id, item_id)
    /// - SSE: update live percentages on all connected UIs
    VoteRecorded {
        /// Monotonic vote sequence (votes.id)
        seq: i64,
        /// Round the vote belongs to
        round_id: String,
        /// Item that was chosen
        item_id: String,
        /// Visitor who voted
        visitor_id: Uuid,
        /// When the vote was recorded
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The local visitor restarted the experiment
    ///
    /// Triggers:
    /// - SSE: reset connected UIs to round one
    SessionReset {
        /// The freshly rotated visitor id
        visitor_id: Uuid,
        /// Session counter after the increment
        session_number: i64,
        /// When the reset happened
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl LabEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            LabEvent::VoteRecorded { .. } => "VoteRecorded",
            LabEvent::SessionReset { .. } => "SessionReset",
        }
    }
}

/// Central event distribution bus for application-wide events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// Dropping a receiver cancels that subscription; there is no separate
/// unsubscribe call.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LabEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Returns a receiver that will receive all events emitted after
    /// subscription. Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<LabEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: LabEvent) -> Result<usize, broadcast::error::SendError<LabEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Used for events where it is acceptable if no component is currently
    /// listening.
    pub fn emit_lossy(&self, event: LabEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote_event(seq: i64) -> LabEvent {
        LabEvent::VoteRecorded {
            seq,
            round_id: "round-1".to_string(),
            item_id: "a".to_string(),
            visitor_id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_emit_and_receive() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit(vote_event(1)).expect("emit should succeed");

        let received = rx.try_recv().expect("Should receive event");
        assert_eq!(received.event_type(), "VoteRecorded");
    }

    #[test]
    fn test_eventbus_emit_lossy_without_subscribers() {
        let bus = EventBus::new(2);
        // No subscribers; must not panic
        bus.emit_lossy(vote_event(1));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_multiple_subscribers() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(vote_event(7)).expect("emit should succeed");

        assert_eq!(rx1.try_recv().expect("rx1").event_type(), "VoteRecorded");
        assert_eq!(rx2.try_recv().expect("rx2").event_type(), "VoteRecorded");
    }

    #[test]
    fn test_event_serialization_round_trip() {
        let event = vote_event(42);
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("\"type\":\"VoteRecorded\""));
        assert!(json.contains("\"seq\":42"));

        let back: LabEvent = serde_json::from_str(&json).expect("deserialize");
        match back {
            LabEvent::VoteRecorded { seq, round_id, item_id, .. } => {
                assert_eq!(seq, 42);
                assert_eq!(round_id, "round-1");
                assert_eq!(item_id, "a");
            }
            _ => panic!("Wrong event type deserialized"),
        }
    }
}
