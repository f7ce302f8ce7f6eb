//! Manager events for observers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Broadcast channel capacity for manager events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Events emitted by the fetcher manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetcherManagerEvent {
    /// A fetcher was started and registered.
    FetcherStarted { stream_id: String },
    /// A fetcher was stopped and removed.
    FetcherStopped { stream_id: String },
    /// A scheduled restart pass ran over the whole registry.
    FetchersRestarted { count: usize },
    /// A health pass found a fetcher not alive and degraded its stream.
    QualityDegraded { stream_id: String },
    /// A playlist moved on to the item at `index`.
    PlaylistAdvanced { playlist_id: String, index: usize },
    /// Every remaining playlist item was unreachable; the scan stopped.
    PlaylistExhausted { playlist_id: String },
}

/// Broadcasts manager events to any number of subscribers.
pub struct EventBroadcaster {
    tx: broadcast::Sender<FetcherManagerEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FetcherManagerEvent> {
        self.tx.subscribe()
    }

    /// Send an event; having no receivers is not an error.
    pub fn emit(&self, event: FetcherManagerEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_without_subscribers_is_silent() {
        let broadcaster = EventBroadcaster::new();
        broadcaster.emit(FetcherManagerEvent::FetchersRestarted { count: 0 });
    }

    #[test]
    fn subscribers_receive_events() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.emit(FetcherManagerEvent::FetcherStarted {
            stream_id: "stream-1".to_string(),
        });

        assert_eq!(
            rx.try_recv().unwrap(),
            FetcherManagerEvent::FetcherStarted {
                stream_id: "stream-1".to_string()
            }
        );
    }
}
