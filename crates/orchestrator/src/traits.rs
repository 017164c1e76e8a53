//! Collaborator contracts of the notification core.

use async_trait::async_trait;
use bpa_core::{CredentialExchange, Partner, PartnerApi, PartnerProof};
use db::PartnerRepository;
use events::{EventBus, WebSocketMessageBody};
use uuid::Uuid;

use crate::error::Result;

/// Read-only partner lookups. Absence is a normal outcome.
#[async_trait]
pub trait PartnerDirectory: Send + Sync {
    async fn lookup_by_connection_id(&self, connection_id: &str) -> Result<Option<PartnerApi>>;

    async fn lookup_by_partner_id(&self, partner_id: Uuid) -> Result<Option<PartnerApi>>;
}

/// Activity log and task writes. Every operation is an idempotent upsert or
/// transition keyed by the correlation id of its argument.
#[async_trait]
pub trait TaskActivityStore: Send + Sync {
    async fn complete_credential_offered_task(&self, exchange: &CredentialExchange) -> Result<()>;

    async fn add_credential_offered_task(&self, exchange: &CredentialExchange) -> Result<()>;

    async fn add_credential_issued_activity(&self, exchange: &CredentialExchange) -> Result<()>;

    async fn add_credential_accepted_activity(&self, exchange: &CredentialExchange) -> Result<()>;

    async fn add_credential_problem_activity(&self, exchange: &CredentialExchange) -> Result<()>;

    async fn complete_partner_request_task(&self, partner: &Partner) -> Result<()>;

    async fn add_partner_request_received_task(&self, partner: &Partner) -> Result<()>;

    async fn add_partner_added_activity(&self, partner: &Partner) -> Result<()>;

    async fn add_partner_accepted_activity(&self, partner: &Partner) -> Result<()>;

    async fn add_presentation_exchange_task(&self, proof: &PartnerProof) -> Result<()>;

    async fn complete_presentation_exchange_task(&self, proof: &PartnerProof) -> Result<()>;

    async fn decline_presentation_exchange_task(&self, proof: &PartnerProof) -> Result<()>;

    async fn delete_presentation_exchange_task(&self, proof: &PartnerProof) -> Result<()>;
}

/// Best-effort push to live subscribers.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, message: WebSocketMessageBody);
}

#[async_trait]
impl PartnerDirectory for PartnerRepository {
    async fn lookup_by_connection_id(&self, connection_id: &str) -> Result<Option<PartnerApi>> {
        let partner = self.find_by_connection_id(connection_id).await?;
        Ok(partner.map(PartnerApi::from))
    }

    async fn lookup_by_partner_id(&self, partner_id: Uuid) -> Result<Option<PartnerApi>> {
        let partner = self.find_by_id(partner_id).await?;
        Ok(partner.map(PartnerApi::from))
    }
}

impl NotificationSink for EventBus {
    fn publish(&self, message: WebSocketMessageBody) {
        EventBus::publish(self, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use events::WebSocketMessageType;

    #[tokio::test]
    async fn test_event_bus_as_sink() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let sink: &dyn NotificationSink = &bus;

        sink.publish(WebSocketMessageBody::notification_event(
            WebSocketMessageType::OnPartnerRemoved,
            "p-1",
            None,
            None,
        ));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.message_type(), WebSocketMessageType::OnPartnerRemoved);
    }
}
