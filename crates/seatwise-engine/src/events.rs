//! # Event Publisher
//!
//! Outbound side of the domain-event channel.
//!
//! Publishing never blocks a booking: a full buffer or a dropped receiver
//! loses the event and logs a warning. The receiver belongs to whatever
//! pushes updates to floor staff.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use seatwise_core::events::DomainEvent;

/// Cloneable sender of [`DomainEvent`]s.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: Option<mpsc::Sender<DomainEvent>>,
}

impl EventPublisher {
    /// Creates a bounded channel and returns both ends.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DomainEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (EventPublisher { tx: Some(tx) }, rx)
    }

    /// A publisher that discards everything.
    pub fn disabled() -> Self {
        EventPublisher { tx: None }
    }

    pub fn publish(&self, event: DomainEvent) {
        let Some(tx) = &self.tx else {
            return;
        };

        let kind = event.kind();
        match tx.try_send(event) {
            Ok(()) => debug!(kind, "Published event"),
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(kind, restaurant_id = %event.restaurant_id(), "Event channel full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                warn!(kind, restaurant_id = %event.restaurant_id(), "Event channel closed, dropping event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reordered(restaurant_id: &str) -> DomainEvent {
        DomainEvent::WaitlistReordered {
            restaurant_id: restaurant_id.into(),
            positions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_full_channel_drops_without_blocking() {
        let (publisher, mut rx) = EventPublisher::channel(1);
        publisher.publish(reordered("r1"));
        publisher.publish(reordered("r2"));

        assert_eq!(rx.recv().await.unwrap().restaurant_id(), "r1");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_channel_is_ignored() {
        let (publisher, rx) = EventPublisher::channel(4);
        drop(rx);
        publisher.publish(reordered("r1"));
        EventPublisher::disabled().publish(reordered("r1"));
    }
}
