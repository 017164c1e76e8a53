//! Lifecycle event dispatch.
//!
//! One handler per event kind. Each resolves the partner, checks the
//! task-relevance policy, writes to the activity store and publishes a
//! notification envelope. Events whose partner cannot be resolved are
//! dropped with a warning; a partner removed while its events are in flight
//! is an expected race.

use std::sync::Arc;

use bpa_core::{CredentialExchange, Partner, PartnerApi, PartnerProof, PresentationExchangeRole};
use events::{ActivityNotice, NotificationEvent, WebSocketMessageBody, WebSocketMessageType};
use serde::Serialize;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::config::ActivityLogConfig;
use crate::error::{OrchestratorError, Result};
use crate::traits::{NotificationSink, PartnerDirectory, TaskActivityStore};

/// How a dispatched event ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Context resolved and policy applied. The policy may still have
    /// decided that nothing needed doing.
    Handled,
    /// Partner could not be resolved; no side effects.
    Dropped,
}

#[derive(Clone)]
pub struct NotificationEventListener {
    partners: Arc<dyn PartnerDirectory>,
    activities: Arc<dyn TaskActivityStore>,
    sink: Arc<dyn NotificationSink>,
    config: Arc<ActivityLogConfig>,
}

impl NotificationEventListener {
    pub fn new(
        partners: Arc<dyn PartnerDirectory>,
        activities: Arc<dyn TaskActivityStore>,
        sink: Arc<dyn NotificationSink>,
        config: Arc<ActivityLogConfig>,
    ) -> Self {
        Self {
            partners,
            activities,
            sink,
            config,
        }
    }

    /// Dispatch on a fresh task. The caller never waits and never sees a
    /// failure; failures are logged.
    pub fn receive(&self, event: NotificationEvent) {
        let listener = self.clone();
        tokio::spawn(async move {
            let kind = event.kind();
            let correlation_id = event.correlation_id();
            if let Err(e) = listener.dispatch(event).await {
                error!(
                    event = kind,
                    correlation_id = %correlation_id,
                    error = %e,
                    "Failed to handle notification event"
                );
            }
        });
    }

    pub async fn dispatch(&self, event: NotificationEvent) -> Result<Dispatch> {
        debug!(
            event = event.kind(),
            correlation_id = %event.correlation_id(),
            "Handling notification event"
        );

        match event {
            NotificationEvent::CredentialAdded { credential } => self.on_credential_added(&credential).await,
            NotificationEvent::CredentialOffered { credential } => {
                self.on_credential_offered(&credential).await
            }
            NotificationEvent::CredentialIssued { credential } => {
                self.activities.add_credential_issued_activity(&credential).await?;
                Ok(Dispatch::Handled)
            }
            NotificationEvent::CredentialAccepted { credential } => {
                self.on_credential_outcome(&credential, WebSocketMessageType::OnCredentialAccepted)
                    .await
            }
            NotificationEvent::CredentialProblem { credential } => {
                self.on_credential_outcome(&credential, WebSocketMessageType::OnCredentialProblem)
                    .await
            }
            NotificationEvent::PartnerRequestCompleted { partner } => {
                self.publish_partner(WebSocketMessageType::OnPartnerRequestCompleted, &partner);
                self.activities.complete_partner_request_task(&partner).await?;
                Ok(Dispatch::Handled)
            }
            NotificationEvent::PartnerRequestReceived { partner } => {
                self.on_partner_request_received(&partner).await
            }
            NotificationEvent::PartnerAdded { partner } => {
                self.publish_partner(WebSocketMessageType::OnPartnerAdded, &partner);
                self.activities.add_partner_added_activity(&partner).await?;
                Ok(Dispatch::Handled)
            }
            NotificationEvent::PartnerAccepted { partner } => {
                self.publish_partner(WebSocketMessageType::OnPartnerAccepted, &partner);
                self.activities.add_partner_accepted_activity(&partner).await?;
                Ok(Dispatch::Handled)
            }
            NotificationEvent::PartnerRemoved { partner } => {
                self.publish_partner(WebSocketMessageType::OnPartnerRemoved, &partner);
                Ok(Dispatch::Handled)
            }
            NotificationEvent::PresentationRequestCompleted { proof } => {
                self.on_presentation_completed(&proof).await
            }
            NotificationEvent::PresentationRequestDeclined { proof } => {
                let outcome = self
                    .handle_presentation_request_event(
                        &proof,
                        WebSocketMessageType::OnPresentationRequestDeclined,
                    )
                    .await?;
                if outcome == Dispatch::Handled {
                    self.activities.decline_presentation_exchange_task(&proof).await?;
                }
                Ok(outcome)
            }
            NotificationEvent::PresentationRequestDeleted { proof } => {
                let outcome = self
                    .handle_presentation_request_event(
                        &proof,
                        WebSocketMessageType::OnPresentationRequestDeleted,
                    )
                    .await?;
                if outcome == Dispatch::Handled {
                    self.activities.delete_presentation_exchange_task(&proof).await?;
                }
                Ok(outcome)
            }
            NotificationEvent::PresentationRequestReceived { proof } => {
                self.handle_presentation_request_event(
                    &proof,
                    WebSocketMessageType::OnPresentationRequestReceived,
                )
                .await
            }
            NotificationEvent::PresentationRequestSent { proof } => {
                self.handle_presentation_request_event(&proof, WebSocketMessageType::OnPresentationRequestSent)
                    .await
            }
            NotificationEvent::ActivityNotification { notice } => {
                self.publish_notice(WebSocketMessageType::ActivityNotification, notice)
            }
            NotificationEvent::TaskAdded { notice } => self.publish_notice(WebSocketMessageType::TaskAdded, notice),
            NotificationEvent::TaskCompleted { notice } => {
                self.publish_notice(WebSocketMessageType::TaskCompleted, notice)
            }
        }
    }

    async fn on_credential_added(&self, credential: &CredentialExchange) -> Result<Dispatch> {
        let Some(partner) = self.partner_for_credential(credential, "credential.added").await? else {
            return Ok(Dispatch::Dropped);
        };

        if self.config.auto_respond_credential_offer() {
            self.publish(
                WebSocketMessageType::OnCredentialAdded,
                credential.id,
                Some(to_info(credential)?),
                Some(partner),
            );
        }
        // Auto-responded offers never opened a task; completion is then a no-op.
        self.activities.complete_credential_offered_task(credential).await?;
        Ok(Dispatch::Handled)
    }

    async fn on_credential_offered(&self, credential: &CredentialExchange) -> Result<Dispatch> {
        let Some(partner) = self.partner_for_credential(credential, "credential.offered").await? else {
            return Ok(Dispatch::Dropped);
        };

        if !self.config.is_credential_task_state(credential.state) {
            debug!(
                credential_exchange_id = %credential.id,
                state = credential.state.as_str(),
                "Credential offer needs no operator action"
            );
            return Ok(Dispatch::Handled);
        }

        self.publish(
            WebSocketMessageType::OnCredentialOffered,
            credential.id,
            Some(to_info(credential)?),
            Some(partner),
        );
        self.activities.add_credential_offered_task(credential).await?;
        Ok(Dispatch::Handled)
    }

    async fn on_credential_outcome(
        &self,
        credential: &CredentialExchange,
        message_type: WebSocketMessageType,
    ) -> Result<Dispatch> {
        let Some(partner) = self.partner_for_credential(credential, message_type.as_str()).await? else {
            return Ok(Dispatch::Dropped);
        };

        self.publish(message_type, credential.id, Some(to_info(credential)?), Some(partner));
        match message_type {
            WebSocketMessageType::OnCredentialProblem => {
                self.activities.add_credential_problem_activity(credential).await?
            }
            _ => self.activities.add_credential_accepted_activity(credential).await?,
        }
        Ok(Dispatch::Handled)
    }

    async fn on_partner_request_received(&self, partner: &Partner) -> Result<Dispatch> {
        if !self.config.is_connection_task_state(partner.state) {
            debug!(
                partner_id = %partner.id,
                state = partner.state.map(|s| s.as_str()),
                "Connection request needs no operator action"
            );
            return Ok(Dispatch::Handled);
        }

        self.activities.add_partner_request_received_task(partner).await?;
        self.publish_partner(WebSocketMessageType::OnPartnerRequestReceived, partner);
        Ok(Dispatch::Handled)
    }

    async fn on_presentation_completed(&self, proof: &PartnerProof) -> Result<Dispatch> {
        let partner_id = require_partner_id(proof, "presentation_request.completed")?;
        let Some(partner) = self.partners.lookup_by_partner_id(partner_id).await? else {
            warn!(proof_id = %proof.id, partner_id = %partner_id, "Partner not found, dropping presentation event");
            return Ok(Dispatch::Dropped);
        };

        let message_type = match proof.role {
            PresentationExchangeRole::Prover => WebSocketMessageType::OnPresentationProved,
            PresentationExchangeRole::Verifier => WebSocketMessageType::OnPresentationVerified,
        };
        let info = to_info(proof)?;

        self.activities.complete_presentation_exchange_task(proof).await?;
        self.publish(message_type, proof.id, Some(info), Some(partner));
        Ok(Dispatch::Handled)
    }

    /// Shared by the received, sent, declined and deleted presentation
    /// events: ensure the task exists, then notify when the state is
    /// task-worthy.
    async fn handle_presentation_request_event(
        &self,
        proof: &PartnerProof,
        message_type: WebSocketMessageType,
    ) -> Result<Dispatch> {
        let partner_id = require_partner_id(proof, message_type.as_str())?;
        let Some(partner) = self.partners.lookup_by_partner_id(partner_id).await? else {
            warn!(proof_id = %proof.id, partner_id = %partner_id, "Partner not found, dropping presentation event");
            return Ok(Dispatch::Dropped);
        };

        self.activities.add_presentation_exchange_task(proof).await?;

        if self.config.is_presentation_task_state(proof.state) {
            self.publish(message_type, proof.id, Some(to_info(proof)?), Some(partner));
        }
        Ok(Dispatch::Handled)
    }

    async fn partner_for_credential(
        &self,
        credential: &CredentialExchange,
        event: &str,
    ) -> Result<Option<PartnerApi>> {
        let partner = self
            .partners
            .lookup_by_connection_id(&credential.connection_id)
            .await?;
        if partner.is_none() {
            warn!(
                event,
                credential_exchange_id = %credential.id,
                connection_id = %credential.connection_id,
                "No partner for connection, dropping event"
            );
        }
        Ok(partner)
    }

    fn publish_partner(&self, message_type: WebSocketMessageType, partner: &Partner) {
        self.publish(message_type, partner.id, None, Some(PartnerApi::from(partner)));
    }

    fn publish_notice(&self, message_type: WebSocketMessageType, notice: ActivityNotice) -> Result<Dispatch> {
        let info = to_info(&notice.activity)?;
        self.publish(message_type, notice.activity.id, Some(info), Some(notice.partner));
        Ok(Dispatch::Handled)
    }

    fn publish(
        &self,
        message_type: WebSocketMessageType,
        link_id: Uuid,
        info: Option<serde_json::Value>,
        partner: Option<PartnerApi>,
    ) {
        debug!(message_type = message_type.as_str(), link_id = %link_id, "Publishing notification");
        self.sink.publish(WebSocketMessageBody::notification_event(
            message_type,
            link_id.to_string(),
            info,
            partner,
        ));
    }
}

fn require_partner_id(proof: &PartnerProof, event: &'static str) -> Result<Uuid> {
    proof
        .partner_id
        .ok_or_else(|| OrchestratorError::malformed(event, proof.id, "presentation exchange carries no partner id"))
}

fn to_info<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bpa_core::{
        Activity, ActivityKind, ActivityLink, ActivityRole, ActivityState, ConnectionState,
        CredentialExchangeRole, CredentialExchangeState, PresentationExchangeState,
    };
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct StaticDirectory {
        by_connection: HashMap<String, PartnerApi>,
        by_id: HashMap<Uuid, PartnerApi>,
    }

    impl StaticDirectory {
        fn with(partner: &Partner) -> Self {
            let api = PartnerApi::from(partner);
            let mut dir = Self::default();
            if let Some(conn) = &partner.connection_id {
                dir.by_connection.insert(conn.clone(), api.clone());
            }
            dir.by_id.insert(partner.id, api);
            dir
        }
    }

    #[async_trait]
    impl PartnerDirectory for StaticDirectory {
        async fn lookup_by_connection_id(&self, connection_id: &str) -> Result<Option<PartnerApi>> {
            Ok(self.by_connection.get(connection_id).cloned())
        }

        async fn lookup_by_partner_id(&self, partner_id: Uuid) -> Result<Option<PartnerApi>> {
            Ok(self.by_id.get(&partner_id).cloned())
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<(&'static str, Uuid)>>,
        fail: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn record(&self, op: &'static str, id: Uuid) -> Result<()> {
            self.calls.lock().unwrap().push((op, id));
            if self.fail {
                return Err(OrchestratorError::Directory("store unavailable".to_string()));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<(&'static str, Uuid)> {
            self.calls.lock().unwrap().clone()
        }

        fn ops(&self) -> Vec<&'static str> {
            self.calls().into_iter().map(|(op, _)| op).collect()
        }
    }

    #[async_trait]
    impl TaskActivityStore for RecordingStore {
        async fn complete_credential_offered_task(&self, e: &CredentialExchange) -> Result<()> {
            self.record("complete_credential_offered_task", e.id)
        }
        async fn add_credential_offered_task(&self, e: &CredentialExchange) -> Result<()> {
            self.record("add_credential_offered_task", e.id)
        }
        async fn add_credential_issued_activity(&self, e: &CredentialExchange) -> Result<()> {
            self.record("add_credential_issued_activity", e.id)
        }
        async fn add_credential_accepted_activity(&self, e: &CredentialExchange) -> Result<()> {
            self.record("add_credential_accepted_activity", e.id)
        }
        async fn add_credential_problem_activity(&self, e: &CredentialExchange) -> Result<()> {
            self.record("add_credential_problem_activity", e.id)
        }
        async fn complete_partner_request_task(&self, p: &Partner) -> Result<()> {
            self.record("complete_partner_request_task", p.id)
        }
        async fn add_partner_request_received_task(&self, p: &Partner) -> Result<()> {
            self.record("add_partner_request_received_task", p.id)
        }
        async fn add_partner_added_activity(&self, p: &Partner) -> Result<()> {
            self.record("add_partner_added_activity", p.id)
        }
        async fn add_partner_accepted_activity(&self, p: &Partner) -> Result<()> {
            self.record("add_partner_accepted_activity", p.id)
        }
        async fn add_presentation_exchange_task(&self, p: &PartnerProof) -> Result<()> {
            self.record("add_presentation_exchange_task", p.id)
        }
        async fn complete_presentation_exchange_task(&self, p: &PartnerProof) -> Result<()> {
            self.record("complete_presentation_exchange_task", p.id)
        }
        async fn decline_presentation_exchange_task(&self, p: &PartnerProof) -> Result<()> {
            self.record("decline_presentation_exchange_task", p.id)
        }
        async fn delete_presentation_exchange_task(&self, p: &PartnerProof) -> Result<()> {
            self.record("delete_presentation_exchange_task", p.id)
        }
    }

    struct ChannelSink(mpsc::UnboundedSender<WebSocketMessageBody>);

    impl NotificationSink for ChannelSink {
        fn publish(&self, message: WebSocketMessageBody) {
            let _ = self.0.send(message);
        }
    }

    struct Fixture {
        listener: NotificationEventListener,
        store: Arc<RecordingStore>,
        sent: mpsc::UnboundedReceiver<WebSocketMessageBody>,
    }

    impl Fixture {
        fn new(directory: StaticDirectory, config: ActivityLogConfig) -> Self {
            Self::with_store(directory, config, RecordingStore::default())
        }

        fn with_store(directory: StaticDirectory, config: ActivityLogConfig, store: RecordingStore) -> Self {
            let store = Arc::new(store);
            let (tx, sent) = mpsc::unbounded_channel();
            let listener = NotificationEventListener::new(
                Arc::new(directory),
                store.clone(),
                Arc::new(ChannelSink(tx)),
                Arc::new(config),
            );
            Self { listener, store, sent }
        }

        fn published(&mut self) -> Vec<WebSocketMessageBody> {
            let mut out = Vec::new();
            while let Ok(message) = self.sent.try_recv() {
                out.push(message);
            }
            out
        }
    }

    fn acme() -> Partner {
        Partner::new("did:sov:acme")
            .with_alias("Acme")
            .with_connection_id("conn-1")
    }

    fn credential(state: CredentialExchangeState) -> CredentialExchange {
        CredentialExchange::new("conn-1", CredentialExchangeRole::Holder, state)
    }

    fn proof(partner: &Partner, role: PresentationExchangeRole, state: PresentationExchangeState) -> PartnerProof {
        PartnerProof::new(partner.id, role, state)
    }

    #[tokio::test]
    async fn test_credential_offered_outside_task_states_does_nothing() {
        let partner = acme();
        let mut f = Fixture::new(StaticDirectory::with(&partner), ActivityLogConfig::default());

        for state in [
            CredentialExchangeState::ProposalSent,
            CredentialExchangeState::RequestSent,
            CredentialExchangeState::CredentialAcked,
        ] {
            let outcome = f
                .listener
                .dispatch(NotificationEvent::CredentialOffered {
                    credential: credential(state),
                })
                .await
                .unwrap();
            assert_eq!(outcome, Dispatch::Handled);
        }

        assert!(f.store.calls().is_empty());
        assert!(f.published().is_empty());
    }

    #[tokio::test]
    async fn test_credential_offered_in_task_state_notifies_and_opens_task() {
        let partner = acme();
        let mut f = Fixture::new(StaticDirectory::with(&partner), ActivityLogConfig::default());
        let offer = credential(CredentialExchangeState::OfferReceived);

        f.listener
            .dispatch(NotificationEvent::CredentialOffered {
                credential: offer.clone(),
            })
            .await
            .unwrap();

        assert_eq!(f.store.calls(), vec![("add_credential_offered_task", offer.id)]);
        let published = f.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].message_type(), WebSocketMessageType::OnCredentialOffered);
        assert_eq!(published[0].link_id(), offer.id.to_string());
        assert_eq!(published[0].partner().map(|p| p.id), Some(partner.id));
        assert_eq!(published[0].info().unwrap()["state"], "offer_received");
    }

    #[tokio::test]
    async fn test_credential_offered_unknown_connection_dropped() {
        let mut f = Fixture::new(StaticDirectory::default(), ActivityLogConfig::default());

        let outcome = f
            .listener
            .dispatch(NotificationEvent::CredentialOffered {
                credential: credential(CredentialExchangeState::OfferReceived),
            })
            .await
            .unwrap();

        assert_eq!(outcome, Dispatch::Dropped);
        assert!(f.store.calls().is_empty());
        assert!(f.published().is_empty());
    }

    #[tokio::test]
    async fn test_credential_added_completes_task_regardless_of_flag() {
        for auto_respond in [false, true] {
            let partner = acme();
            let config = ActivityLogConfig::default().with_auto_respond_credential_offer(auto_respond);
            let mut f = Fixture::new(StaticDirectory::with(&partner), config);
            let added = credential(CredentialExchangeState::CredentialAcked);

            f.listener
                .dispatch(NotificationEvent::CredentialAdded {
                    credential: added.clone(),
                })
                .await
                .unwrap();

            assert_eq!(f.store.calls(), vec![("complete_credential_offered_task", added.id)]);
            let published = f.published();
            assert_eq!(published.len(), usize::from(auto_respond));
            if auto_respond {
                assert_eq!(published[0].message_type(), WebSocketMessageType::OnCredentialAdded);
            }
        }
    }

    #[tokio::test]
    async fn test_credential_issued_records_activity_without_notification() {
        let mut f = Fixture::new(StaticDirectory::default(), ActivityLogConfig::default());
        let issued = CredentialExchange::new(
            "conn-unknown",
            CredentialExchangeRole::Issuer,
            CredentialExchangeState::CredentialIssued,
        );

        let outcome = f
            .listener
            .dispatch(NotificationEvent::CredentialIssued {
                credential: issued.clone(),
            })
            .await
            .unwrap();

        assert_eq!(outcome, Dispatch::Handled);
        assert_eq!(f.store.calls(), vec![("add_credential_issued_activity", issued.id)]);
        assert!(f.published().is_empty());
    }

    #[tokio::test]
    async fn test_credential_accepted_and_problem() {
        let partner = acme();
        let mut f = Fixture::new(StaticDirectory::with(&partner), ActivityLogConfig::default());

        f.listener
            .dispatch(NotificationEvent::CredentialAccepted {
                credential: credential(CredentialExchangeState::CredentialAcked),
            })
            .await
            .unwrap();
        f.listener
            .dispatch(NotificationEvent::CredentialProblem {
                credential: credential(CredentialExchangeState::Problem).with_error("bad schema"),
            })
            .await
            .unwrap();

        assert_eq!(
            f.store.ops(),
            vec!["add_credential_accepted_activity", "add_credential_problem_activity"]
        );
        let types: Vec<_> = f.published().iter().map(|m| m.message_type()).collect();
        assert_eq!(
            types,
            vec![
                WebSocketMessageType::OnCredentialAccepted,
                WebSocketMessageType::OnCredentialProblem
            ]
        );
    }

    #[tokio::test]
    async fn test_partner_request_outside_connection_states_does_nothing() {
        let partner = acme().with_state(ConnectionState::Active);
        let mut f = Fixture::new(StaticDirectory::with(&partner), ActivityLogConfig::default());

        let outcome = f
            .listener
            .dispatch(NotificationEvent::PartnerRequestReceived { partner })
            .await
            .unwrap();

        assert_eq!(outcome, Dispatch::Handled);
        assert!(f.store.calls().is_empty());
        assert!(f.published().is_empty());
    }

    #[tokio::test]
    async fn test_partner_request_in_connection_states_opens_task() {
        let partner = acme().with_state(ConnectionState::Request);
        let mut f = Fixture::new(StaticDirectory::default(), ActivityLogConfig::default());

        f.listener
            .dispatch(NotificationEvent::PartnerRequestReceived {
                partner: partner.clone(),
            })
            .await
            .unwrap();

        assert_eq!(f.store.calls(), vec![("add_partner_request_received_task", partner.id)]);
        let published = f.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].message_type(), WebSocketMessageType::OnPartnerRequestReceived);
        assert!(published[0].info().is_none());
    }

    #[tokio::test]
    async fn test_configured_connection_states_gate_request_task() {
        let config = ActivityLogConfig::default().with_connection_states(vec![ConnectionState::Response]);
        let mut f = Fixture::new(StaticDirectory::default(), config);

        let requested = acme().with_state(ConnectionState::Request);
        f.listener
            .dispatch(NotificationEvent::PartnerRequestReceived { partner: requested })
            .await
            .unwrap();
        assert!(f.store.calls().is_empty());

        let responded = acme().with_state(ConnectionState::Response);
        f.listener
            .dispatch(NotificationEvent::PartnerRequestReceived {
                partner: responded.clone(),
            })
            .await
            .unwrap();
        assert_eq!(f.store.calls(), vec![("add_partner_request_received_task", responded.id)]);
        assert_eq!(f.published().len(), 1);
    }

    #[tokio::test]
    async fn test_partner_events() {
        let partner = acme();
        let mut f = Fixture::new(StaticDirectory::default(), ActivityLogConfig::default());

        for event in [
            NotificationEvent::PartnerAdded {
                partner: partner.clone(),
            },
            NotificationEvent::PartnerAccepted {
                partner: partner.clone(),
            },
            NotificationEvent::PartnerRequestCompleted {
                partner: partner.clone(),
            },
        ] {
            f.listener.dispatch(event).await.unwrap();
        }

        assert_eq!(
            f.store.ops(),
            vec![
                "add_partner_added_activity",
                "add_partner_accepted_activity",
                "complete_partner_request_task"
            ]
        );
        assert_eq!(f.published().len(), 3);
    }

    #[tokio::test]
    async fn test_partner_removed_notifies_only() {
        let partner = acme();
        let mut f = Fixture::new(StaticDirectory::default(), ActivityLogConfig::default());

        f.listener
            .dispatch(NotificationEvent::PartnerRemoved {
                partner: partner.clone(),
            })
            .await
            .unwrap();

        assert!(f.store.calls().is_empty());
        let published = f.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].message_type(), WebSocketMessageType::OnPartnerRemoved);
        assert_eq!(published[0].link_id(), partner.id.to_string());
    }

    #[tokio::test]
    async fn test_presentation_completed_subtype_by_role() {
        let partner = acme();
        let cases = [
            (PresentationExchangeRole::Prover, WebSocketMessageType::OnPresentationProved),
            (PresentationExchangeRole::Verifier, WebSocketMessageType::OnPresentationVerified),
        ];

        for (role, expected) in cases {
            let mut f = Fixture::new(StaticDirectory::with(&partner), ActivityLogConfig::default());
            let done = proof(&partner, role, PresentationExchangeState::Done);

            f.listener
                .dispatch(NotificationEvent::PresentationRequestCompleted { proof: done.clone() })
                .await
                .unwrap();

            assert_eq!(f.store.calls(), vec![("complete_presentation_exchange_task", done.id)]);
            let published = f.published();
            assert_eq!(published.len(), 1);
            assert_eq!(published[0].message_type(), expected);
        }
    }

    #[tokio::test]
    async fn test_presentation_received_in_task_state() {
        let partner = acme();
        let mut f = Fixture::new(StaticDirectory::with(&partner), ActivityLogConfig::default());
        let request = proof(
            &partner,
            PresentationExchangeRole::Prover,
            PresentationExchangeState::RequestReceived,
        );

        f.listener
            .dispatch(NotificationEvent::PresentationRequestReceived {
                proof: request.clone(),
            })
            .await
            .unwrap();

        assert_eq!(f.store.calls(), vec![("add_presentation_exchange_task", request.id)]);
        let published = f.published();
        assert_eq!(published.len(), 1);
        assert_eq!(
            published[0].message_type(),
            WebSocketMessageType::OnPresentationRequestReceived
        );
    }

    #[tokio::test]
    async fn test_presentation_sent_outside_task_state_records_without_notifying() {
        let partner = acme();
        let mut f = Fixture::new(StaticDirectory::with(&partner), ActivityLogConfig::default());
        let request = proof(
            &partner,
            PresentationExchangeRole::Verifier,
            PresentationExchangeState::RequestSent,
        );

        f.listener
            .dispatch(NotificationEvent::PresentationRequestSent { proof: request })
            .await
            .unwrap();

        assert_eq!(f.store.ops(), vec!["add_presentation_exchange_task"]);
        assert!(f.published().is_empty());
    }

    #[tokio::test]
    async fn test_configured_presentation_states_notify_sent_requests() {
        let partner = acme();
        let config = ActivityLogConfig::default()
            .with_presentation_exchange_states(vec![PresentationExchangeState::RequestSent]);
        let mut f = Fixture::new(StaticDirectory::with(&partner), config);
        let request = proof(
            &partner,
            PresentationExchangeRole::Verifier,
            PresentationExchangeState::RequestSent,
        );

        f.listener
            .dispatch(NotificationEvent::PresentationRequestSent { proof: request })
            .await
            .unwrap();

        assert_eq!(f.store.ops(), vec!["add_presentation_exchange_task"]);
        let published = f.published();
        assert_eq!(published.len(), 1);
        assert_eq!(
            published[0].message_type(),
            WebSocketMessageType::OnPresentationRequestSent
        );
    }

    #[tokio::test]
    async fn test_presentation_declined_and_deleted_transition_after_helper() {
        let partner = acme();
        let mut f = Fixture::new(StaticDirectory::with(&partner), ActivityLogConfig::default());
        let declined = proof(&partner, PresentationExchangeRole::Prover, PresentationExchangeState::Declined);
        let deleted = proof(
            &partner,
            PresentationExchangeRole::Prover,
            PresentationExchangeState::RequestReceived,
        );

        f.listener
            .dispatch(NotificationEvent::PresentationRequestDeclined { proof: declined })
            .await
            .unwrap();
        f.listener
            .dispatch(NotificationEvent::PresentationRequestDeleted { proof: deleted })
            .await
            .unwrap();

        assert_eq!(
            f.store.ops(),
            vec![
                "add_presentation_exchange_task",
                "decline_presentation_exchange_task",
                "add_presentation_exchange_task",
                "delete_presentation_exchange_task"
            ]
        );
        // Only the deleted request was still in a task-worthy state.
        let published = f.published();
        assert_eq!(published.len(), 1);
        assert_eq!(
            published[0].message_type(),
            WebSocketMessageType::OnPresentationRequestDeleted
        );
    }

    #[tokio::test]
    async fn test_presentation_unknown_partner_dropped() {
        let stranger = acme();
        let mut f = Fixture::new(StaticDirectory::default(), ActivityLogConfig::default());

        let outcome = f
            .listener
            .dispatch(NotificationEvent::PresentationRequestDeclined {
                proof: proof(&stranger, PresentationExchangeRole::Prover, PresentationExchangeState::Declined),
            })
            .await
            .unwrap();

        assert_eq!(outcome, Dispatch::Dropped);
        assert!(f.store.calls().is_empty());
        assert!(f.published().is_empty());
    }

    #[tokio::test]
    async fn test_presentation_without_partner_id_is_malformed() {
        let partner = acme();
        let mut f = Fixture::new(StaticDirectory::with(&partner), ActivityLogConfig::default());
        let mut request = proof(
            &partner,
            PresentationExchangeRole::Prover,
            PresentationExchangeState::RequestReceived,
        );
        request.partner_id = None;

        let err = f
            .listener
            .dispatch(NotificationEvent::PresentationRequestReceived { proof: request })
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::MalformedEvent { .. }));
        assert!(f.store.calls().is_empty());
        assert!(f.published().is_empty());
    }

    #[tokio::test]
    async fn test_activity_and_task_notices_forwarded() {
        let partner = acme();
        let mut f = Fixture::new(StaticDirectory::default(), ActivityLogConfig::default());
        let activity = Activity::new(
            partner.id,
            ActivityLink::Partner(partner.id),
            ActivityKind::ConnectionRequest,
            ActivityRole::ConnectionRequestRecipient,
            ActivityState::ConnectionRequestReceived,
        )
        .as_task();
        let notice = ActivityNotice::new(activity.clone(), PartnerApi::from(&partner));

        for event in [
            NotificationEvent::ActivityNotification { notice: notice.clone() },
            NotificationEvent::TaskAdded { notice: notice.clone() },
            NotificationEvent::TaskCompleted { notice },
        ] {
            f.listener.dispatch(event).await.unwrap();
        }

        assert!(f.store.calls().is_empty());
        let published = f.published();
        let types: Vec<_> = published.iter().map(|m| m.message_type()).collect();
        assert_eq!(
            types,
            vec![
                WebSocketMessageType::ActivityNotification,
                WebSocketMessageType::TaskAdded,
                WebSocketMessageType::TaskCompleted
            ]
        );
        assert!(published.iter().all(|m| m.link_id() == activity.id.to_string()));
        assert_eq!(published[0].info().unwrap()["kind"], "connection_request");
    }

    #[tokio::test]
    async fn test_store_failure_is_not_retried() {
        let partner = acme();
        let mut f = Fixture::with_store(
            StaticDirectory::with(&partner),
            ActivityLogConfig::default(),
            RecordingStore::failing(),
        );

        let result = f
            .listener
            .dispatch(NotificationEvent::PartnerAdded { partner })
            .await;

        assert!(result.is_err());
        assert_eq!(f.store.calls().len(), 1);
        assert_eq!(f.published().len(), 1);
    }

    #[tokio::test]
    async fn test_receive_dispatches_off_the_caller() {
        let partner = acme();
        let mut f = Fixture::new(StaticDirectory::with(&partner), ActivityLogConfig::default());

        f.listener.receive(NotificationEvent::PartnerRemoved { partner });

        let message = tokio::time::timeout(Duration::from_secs(5), f.sent.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.message_type(), WebSocketMessageType::OnPartnerRemoved);
    }

    #[tokio::test]
    async fn test_receive_swallows_failures() {
        let partner = acme();
        let f = Fixture::with_store(
            StaticDirectory::with(&partner),
            ActivityLogConfig::default(),
            RecordingStore::failing(),
        );

        f.listener.receive(NotificationEvent::PartnerAccepted { partner });

        for _ in 0..50 {
            if !f.store.calls().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(f.store.ops(), vec!["add_partner_accepted_activity"]);
    }
}
