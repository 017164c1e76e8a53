//! Inbound event queue.
//!
//! Producers (HTTP ingestion, the activity manager) push lifecycle events
//! through cloneable [`EventPublisher`]s; the [`EventFeed`] loop hands each
//! one to the listener, which spawns its dispatch. Producers never wait on
//! a handler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use events::NotificationEvent;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::listener::NotificationEventListener;

/// Sending half of the feed.
#[derive(Clone)]
pub struct EventPublisher {
    sender: mpsc::UnboundedSender<NotificationEvent>,
    sequence: Arc<AtomicU64>,
}

impl EventPublisher {
    /// Queue an event. Returns `false` when the feed has shut down.
    pub fn emit(&self, event: NotificationEvent) -> bool {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let kind = event.kind();
        match self.sender.send(event) {
            Ok(()) => {
                debug!(seq, event = kind, "Event queued");
                true
            }
            Err(_) => {
                warn!(seq, event = kind, "Event feed closed, dropping event");
                false
            }
        }
    }

    /// Number of events emitted so far.
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("sequence", &self.current_sequence())
            .finish()
    }
}

/// Receiving half of the feed.
pub struct EventFeed {
    receiver: mpsc::UnboundedReceiver<NotificationEvent>,
}

impl EventFeed {
    pub fn channel() -> (EventPublisher, EventFeed) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let publisher = EventPublisher {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        };
        (publisher, EventFeed { receiver })
    }

    pub async fn recv(&mut self) -> Option<NotificationEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<NotificationEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drive the listener until every publisher is dropped. A listener whose
    /// activity manager holds a publisher keeps the loop alive, so the owner
    /// stops it by aborting the task (see `NotificationService::shutdown`).
    pub async fn run(mut self, listener: NotificationEventListener) {
        while let Some(event) = self.receiver.recv().await {
            listener.receive(event);
        }
        debug!("Event feed drained, all publishers dropped");
    }
}
