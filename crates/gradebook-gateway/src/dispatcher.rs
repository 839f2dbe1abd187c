use std::sync::Arc;

use tokio::sync::broadcast;

use gradebook_types::events::GatewayEvent;

/// Capacity of the fan-out channel. Slow subscribers that fall further behind
/// than this skip events rather than blocking senders.
const CHANNEL_CAPACITY: usize = 1024;

/// Fans gateway events out to every connected client.
///
/// There is no per-user routing: each connection receives every event and the
/// client filters on `user_id`.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    broadcast_tx: broadcast::Sender<GatewayEvent>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(DispatcherInner { broadcast_tx }),
        }
    }

    /// Subscribe to gateway events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast an event to all connected clients.
    ///
    /// Sending with no subscribers is not an error; the event is dropped.
    pub fn broadcast(&self, event: GatewayEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(user_id: &str) -> GatewayEvent {
        GatewayEvent::Notification {
            user_id: user_id.into(),
            content: "Welcome".into(),
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_every_event() {
        let dispatcher = Dispatcher::new();
        let mut a = dispatcher.subscribe();
        let mut b = dispatcher.subscribe();

        let event = notification("u1");
        dispatcher.broadcast(event.clone());

        assert_eq!(a.recv().await.unwrap(), event);
        assert_eq!(b.recv().await.unwrap(), event);
    }

    #[test]
    fn test_broadcast_without_subscribers_is_ignored() {
        let dispatcher = Dispatcher::default();
        dispatcher.broadcast(notification("u1"));

        let mut late = dispatcher.subscribe();
        assert!(late.try_recv().is_err());
    }
}
