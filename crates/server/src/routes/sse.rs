use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use events::WebSocketMessageBody;
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use crate::state::AppState;

pub const SSE_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

fn message_to_sse_event(message: &WebSocketMessageBody, seq: u64) -> Result<Event, Infallible> {
    let data = serde_json::to_string(message).unwrap_or_else(|_| "{}".to_string());

    Ok(Event::default()
        .id(seq.to_string())
        .event(message.message_type().as_str())
        .data(data))
}

/// Live notification stream. Envelopes published before the client
/// connected are not replayed.
pub async fn notifications_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_bus.subscribe();
    let seq_counter = Arc::new(AtomicU64::new(0));

    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let seq_counter = Arc::clone(&seq_counter);
        async move {
            match result {
                Ok(message) => {
                    let seq = seq_counter.fetch_add(1, Ordering::SeqCst);
                    Some(message_to_sse_event(&message, seq))
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notification SSE client lagged, envelopes lost");
                    None
                }
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(SSE_KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}
