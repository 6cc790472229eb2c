use tokio::sync::broadcast::{self, Receiver, Sender};

use crate::types::NavigatorEvent;

/// Events a single operation can publish in one batch: an optional
/// fallback notice followed by exactly one terminal outcome.
const EVENTS_PER_OPERATION: usize = 2;

/// `BatchStarted` plus `BatchFinished`.
const EVENTS_PER_BATCH: usize = 2;

/// Floor so small batches still leave room for seed events and a
/// subscriber that polls late.
const MIN_CAPACITY: usize = 64;

/// Ceiling on retained events; the channel preallocates every slot.
const MAX_CAPACITY: usize = 1 << 16;

/// Operations a default bus is sized for.
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// Broadcast bus of [`NavigatorEvent`]s. Every subscriber sees every event
/// published after it subscribed; a subscriber that falls more than
/// `capacity` events behind gets `RecvError::Lagged` and resumes from the
/// oldest retained event.
pub struct EventBus {
    tx: Sender<NavigatorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// A bus that retains a whole batch of `operations`, so a subscriber
    /// that only starts reading after `execute_all` returns still sees
    /// every outcome.
    pub fn for_batch_size(operations: usize) -> Self {
        Self::new(Self::capacity_for(operations))
    }

    pub fn capacity_for(operations: usize) -> usize {
        operations
            .saturating_mul(EVENTS_PER_OPERATION)
            .saturating_add(EVENTS_PER_BATCH)
            .clamp(MIN_CAPACITY, MAX_CAPACITY)
    }

    pub fn publish(&self, event: NavigatorEvent) {
        // No receivers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> Receiver<NavigatorEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::for_batch_size(DEFAULT_BATCH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BatchId;

    fn dropped(index: usize) -> NavigatorEvent {
        NavigatorEvent::OperationDropped {
            batch_id: BatchId("b".into()),
            index,
            reason: "rejected".into(),
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        bus.publish(NavigatorEvent::SeedAdded {
            vertex_type: "road".into(),
        });
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(NavigatorEvent::SeedAdded {
            vertex_type: "junction".into(),
        });
        match rx.recv().await.unwrap() {
            NavigatorEvent::SeedAdded { vertex_type } => assert_eq!(vertex_type, "junction"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_capacity_for_batch() {
        assert_eq!(EventBus::capacity_for(0), MIN_CAPACITY);
        assert_eq!(EventBus::capacity_for(10), MIN_CAPACITY);
        assert_eq!(EventBus::capacity_for(500), 1002);
        assert_eq!(EventBus::capacity_for(usize::MAX), MAX_CAPACITY);
    }

    #[test]
    fn test_sized_bus_retains_whole_batch() {
        let operations = 100;
        let bus = EventBus::for_batch_size(operations);
        let mut rx = bus.subscribe();

        bus.publish(NavigatorEvent::BatchStarted {
            batch_id: BatchId("b".into()),
            operations,
        });
        for i in 0..operations {
            bus.publish(NavigatorEvent::OperationFellBack {
                batch_id: BatchId("b".into()),
                index: i,
                reason: "limit rejected".into(),
            });
            bus.publish(dropped(i));
        }
        bus.publish(NavigatorEvent::BatchFinished {
            batch_id: BatchId("b".into()),
            succeeded: 0,
            dropped: operations,
            failed: 0,
        });

        let mut received = 0;
        while let Ok(event) = rx.try_recv() {
            received += 1;
            if received == 1 {
                assert!(matches!(event, NavigatorEvent::BatchStarted { .. }));
            }
        }
        assert_eq!(received, operations * 2 + 2);
    }

    #[test]
    fn test_undersized_bus_lags() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..5 {
            bus.publish(dropped(i));
        }
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(3))
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(NavigatorEvent::OperationDropped { index: 3, .. })
        ));
    }
}
