//! Broadcast channel for check-in events.
//!
//! [`CheckinFeed`] wraps a [`tokio::sync::broadcast`] channel. State
//! mutations publish a [`CheckinEvent`] through the feed, and WebSocket
//! connections subscribe to receive filtered events.

use tokio::sync::broadcast;

use super::CheckinEvent;

/// Broadcast bus for [`CheckinEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity.
/// When the ring buffer is full, the oldest events are dropped for
/// lagging receivers.
#[derive(Debug, Clone)]
pub struct CheckinFeed {
    sender: broadcast::Sender<CheckinEvent>,
}

impl CheckinFeed {
    /// Creates a new `CheckinFeed` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    /// If there are no active receivers, the event is silently dropped.
    pub fn publish(&self, event: CheckinEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future events.
    ///
    /// Each WebSocket connection should call this once on connect.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CheckinEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{EventId, RegistrationId};
    use chrono::Utc;

    fn make_event(event_id: EventId) -> CheckinEvent {
        CheckinEvent::AttendanceRecorded {
            event_id,
            registration_id: RegistrationId::new(),
            full_name: "Maria Silva Santos".to_string(),
            validated_by: "front-desk".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let feed = CheckinFeed::new(100);
        let count = feed.publish(make_event(EventId::new()));
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn subscriber_receives_event() {
        let feed = CheckinFeed::new(100);
        let mut rx = feed.subscribe();

        let id = EventId::new();
        feed.publish(make_event(id));

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected to receive event");
        };
        assert_eq!(event.event_id(), id);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let feed = CheckinFeed::new(100);
        let mut rx1 = feed.subscribe();
        let mut rx2 = feed.subscribe();

        let id = EventId::new();
        let count = feed.publish(make_event(id));
        assert_eq!(count, 2);

        let e1 = rx1.recv().await;
        let e2 = rx2.recv().await;
        let Ok(e1) = e1 else {
            panic!("rx1 failed");
        };
        let Ok(e2) = e2 else {
            panic!("rx2 failed");
        };
        assert_eq!(e1.event_id(), e2.event_id());
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let feed = CheckinFeed::new(100);
        assert_eq!(feed.receiver_count(), 0);

        let _rx1 = feed.subscribe();
        assert_eq!(feed.receiver_count(), 1);

        let _rx2 = feed.subscribe();
        assert_eq!(feed.receiver_count(), 2);

        drop(_rx1);
        assert_eq!(feed.receiver_count(), 1);
    }
}
