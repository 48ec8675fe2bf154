// ── Event bus ──
//
// In-process broadcast of relationship changes and invalidation signals.
// Delivery is at-most-once per live subscriber, in publication order.
// Late subscribers see nothing published before they subscribed.

use tokio::sync::broadcast;
use tracing::trace;

use crate::model::BusEvent;

/// Fan-out channel shared by every controller of one engine.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusEvent>,
}

impl EventBus {
    /// `capacity` is how far a subscriber may fall behind before it lags.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Send `event` to every current subscriber. Never fails; returns how
    /// many subscribers it reached.
    pub fn publish(&self, event: BusEvent) -> usize {
        let delivered = self.sender.send(event).unwrap_or(0);
        trace!(delivered, "bus event published");
        delivered
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> BusSubscription {
        BusSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// What a subscriber pulls off the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Event(BusEvent),
    /// The subscriber fell behind and missed this many events.
    Lagged(u64),
}

/// One listener's handle on the bus.
#[derive(Debug)]
pub struct BusSubscription {
    receiver: broadcast::Receiver<BusEvent>,
}

impl BusSubscription {
    /// Next delivery, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Delivery> {
        match self.receiver.recv().await {
            Ok(event) => Some(Delivery::Event(event)),
            Err(broadcast::error::RecvError::Lagged(n)) => Some(Delivery::Lagged(n)),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv). `None` when nothing is
    /// queued or the bus is gone.
    pub fn try_recv(&mut self) -> Option<Delivery> {
        match self.receiver.try_recv() {
            Ok(event) => Some(Delivery::Event(event)),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Some(Delivery::Lagged(n)),
            Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RelationshipKey, ToggleEvent};
    use melodex_api::RelationshipKind;

    fn changed(id: u64, status: bool) -> BusEvent {
        BusEvent::StatusChanged(ToggleEvent::new(RelationshipKey::favorite(id), status, None))
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let bus = EventBus::new(8);
        assert_eq!(bus.publish(BusEvent::ForceRefreshAll), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        assert_eq!(bus.publish(changed(1, true)), 2);
        bus.publish(BusEvent::AllCleared {
            kind: RelationshipKind::Like,
        });

        for sub in [&mut a, &mut b] {
            assert_eq!(sub.recv().await, Some(Delivery::Event(changed(1, true))));
            assert_eq!(
                sub.recv().await,
                Some(Delivery::Event(BusEvent::AllCleared {
                    kind: RelationshipKind::Like
                }))
            );
        }
    }

    #[test]
    fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::new(8);
        let _early = bus.subscribe();
        bus.publish(changed(1, true));

        let mut late = bus.subscribe();
        assert_eq!(late.try_recv(), None);
    }

    #[test]
    fn slow_subscriber_is_told_it_lagged() {
        let bus = EventBus::new(2);
        let mut slow = bus.subscribe();
        for id in 0..5 {
            bus.publish(changed(id, true));
        }

        assert_eq!(slow.try_recv(), Some(Delivery::Lagged(3)));
        assert_eq!(slow.try_recv(), Some(Delivery::Event(changed(3, true))));
    }
}
