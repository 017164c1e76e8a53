use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use events::NotificationEvent;
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct AcceptedResponse {
    pub accepted: bool,
    #[serde(rename = "type")]
    pub event_type: String,
}

/// Queue a lifecycle event from the protocol engine. Handling happens in the
/// background; the response only confirms the event was queued.
pub async fn ingest_event(
    State(state): State<AppState>,
    Json(event): Json<NotificationEvent>,
) -> Result<(StatusCode, Json<AcceptedResponse>), AppError> {
    let event_type = event.kind();
    tracing::debug!(event = event_type, correlation_id = %event.correlation_id(), "Event received");

    mirror_partner(&state, &event).await;

    if !state.publisher.emit(event) {
        return Err(AppError::Unavailable("Notification core is not running".to_string()));
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            accepted: true,
            event_type: event_type.to_string(),
        }),
    ))
}

/// Keep the partner directory in step with the engine's partner snapshots.
/// Runs before the event is queued so exchange events that follow resolve.
/// A failed write is logged and the event still goes to the core.
async fn mirror_partner(state: &AppState, event: &NotificationEvent) {
    let result = match event {
        NotificationEvent::PartnerAdded { partner }
        | NotificationEvent::PartnerAccepted { partner }
        | NotificationEvent::PartnerRequestReceived { partner }
        | NotificationEvent::PartnerRequestCompleted { partner } => {
            state.partners.save(partner).await.map(|_| ())
        }
        NotificationEvent::PartnerRemoved { partner } => {
            state.partners.delete(partner.id).await.map(|deleted| {
                if !deleted {
                    tracing::debug!(partner_id = %partner.id, "Removed partner was not in the directory");
                }
            })
        }
        _ => Ok(()),
    };

    if let Err(e) = result {
        tracing::warn!(
            event = event.kind(),
            partner_id = %event.correlation_id(),
            "Failed to mirror partner into the directory: {}",
            e
        );
    }
}
