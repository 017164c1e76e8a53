//! Best-effort fan-out of notification envelopes to live subscribers.

use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::message::WebSocketMessageBody;

/// Envelopes buffered per subscriber before the slowest one starts lagging.
pub const NOTIFICATION_BUFFER: usize = 256;

/// Publishing never blocks and never reports back to the caller's handler.
/// A subscriber that falls more than [`NOTIFICATION_BUFFER`] envelopes behind
/// loses the oldest ones; with no subscriber the envelope is gone.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WebSocketMessageBody>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(NOTIFICATION_BUFFER);
        Self { sender }
    }

    /// Returns whether anyone was listening.
    pub fn publish(&self, body: WebSocketMessageBody) -> bool {
        match self.sender.send(body) {
            Ok(receivers) => {
                trace!(receivers, "Notification fanned out");
                true
            }
            Err(broadcast::error::SendError(body)) => {
                debug!(
                    message_type = body.message_type().as_str(),
                    link_id = body.link_id(),
                    "No notification subscribers, dropping"
                );
                false
            }
        }
    }

    /// Only envelopes published after this call are seen.
    pub fn subscribe(&self) -> broadcast::Receiver<WebSocketMessageBody> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
