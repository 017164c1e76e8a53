//! Activity log and task bookkeeping on top of the sqlite repositories.
//!
//! Writes are keyed by `(correlation id, kind)`. Creating an activity is an
//! insert-if-absent, closing a task is a conditional update that only moves
//! OPEN rows, so redelivered or racing events never duplicate a record and
//! never leave a task stuck open. Follow-up `task.added`, `task.completed`
//! and `activity.created` events go back onto the inbound feed, and only
//! when a row actually changed.

use std::sync::Arc;

use async_trait::async_trait;
use bpa_core::{
    Activity, ActivityKind, ActivityLink, ActivityRole, ActivityState, CredentialExchange,
    CredentialExchangeRole, Partner, PartnerApi, PartnerProof, PresentationExchangeRole,
    PresentationExchangeState, TaskState,
};
use db::{ActivityFilter, ActivityRepository};
use events::{ActivityNotice, NotificationEvent};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::feed::EventPublisher;
use crate::state_machine::TaskStateMachine;
use crate::traits::{PartnerDirectory, TaskActivityStore};

pub struct ActivityManager {
    activities: ActivityRepository,
    partners: Arc<dyn PartnerDirectory>,
    feed: EventPublisher,
}

impl ActivityManager {
    pub fn new(
        activities: ActivityRepository,
        partners: Arc<dyn PartnerDirectory>,
        feed: EventPublisher,
    ) -> Self {
        Self {
            activities,
            partners,
            feed,
        }
    }

    /// Activities newest first. Deleted tasks are never listed.
    pub async fn list_activities(&self, filter: ActivityFilter) -> Result<Vec<Activity>> {
        Ok(self.activities.find_all(filter).await?)
    }

    async fn credential_partner(&self, exchange: &CredentialExchange) -> Result<Option<PartnerApi>> {
        match exchange.partner_id {
            Some(partner_id) => self.partners.lookup_by_partner_id(partner_id).await,
            None => {
                self.partners
                    .lookup_by_connection_id(&exchange.connection_id)
                    .await
            }
        }
    }

    async fn proof_partner(&self, proof: &PartnerProof) -> Result<Option<PartnerApi>> {
        match (proof.partner_id, proof.connection_id.as_deref()) {
            (Some(partner_id), _) => self.partners.lookup_by_partner_id(partner_id).await,
            (None, Some(connection_id)) => self.partners.lookup_by_connection_id(connection_id).await,
            (None, None) => Ok(None),
        }
    }

    async fn record(&self, activity: Activity, partner: PartnerApi) -> Result<()> {
        let created = self.activities.insert_if_absent(&activity).await?;
        if !created {
            debug!(
                correlation_id = %activity.correlation_id(),
                kind = activity.kind.as_str(),
                "Activity already recorded"
            );
            return Ok(());
        }

        info!(
            activity_id = %activity.id,
            correlation_id = %activity.correlation_id(),
            kind = activity.kind.as_str(),
            task = activity.is_task(),
            "Activity recorded"
        );

        let notice = ActivityNotice::new(activity, partner);
        let event = if notice.activity.is_task() {
            NotificationEvent::TaskAdded { notice }
        } else {
            NotificationEvent::ActivityNotification { notice }
        };
        self.feed.emit(event);
        Ok(())
    }

    async fn finish_task(
        &self,
        link_id: Uuid,
        kind: ActivityKind,
        to: TaskState,
        state: ActivityState,
        partner: Option<PartnerApi>,
    ) -> Result<()> {
        TaskStateMachine::validate_transition(&TaskState::Open, &to)?;

        let Some(activity) = self
            .activities
            .transition_open_task(link_id, kind, to, state)
            .await?
        else {
            debug!(
                correlation_id = %link_id,
                kind = kind.as_str(),
                to = to.as_str(),
                "No open task, nothing to transition"
            );
            return Ok(());
        };

        info!(
            activity_id = %activity.id,
            correlation_id = %link_id,
            to = to.as_str(),
            "Task closed"
        );

        if to != TaskState::Completed {
            return Ok(());
        }

        let partner = match partner {
            Some(partner) => Some(partner),
            None => self.partners.lookup_by_partner_id(activity.partner_id).await?,
        };
        match partner {
            Some(partner) => {
                self.feed.emit(NotificationEvent::TaskCompleted {
                    notice: ActivityNotice::new(activity, partner),
                });
            }
            None => warn!(
                activity_id = %activity.id,
                partner_id = %activity.partner_id,
                "Partner no longer known, task completed without notification"
            ),
        }
        Ok(())
    }

    async fn add_credential_activity(
        &self,
        exchange: &CredentialExchange,
        kind: ActivityKind,
        role: ActivityRole,
        state: ActivityState,
        task: bool,
    ) -> Result<()> {
        let Some(partner) = self.credential_partner(exchange).await? else {
            warn!(
                credential_exchange_id = %exchange.id,
                connection_id = %exchange.connection_id,
                kind = kind.as_str(),
                "No partner for credential exchange, activity not recorded"
            );
            return Ok(());
        };

        let activity = Activity::new(partner.id, ActivityLink::Credential(exchange.id), kind, role, state);
        let activity = if task { activity.as_task() } else { activity };
        self.record(activity, partner).await
    }

    async fn add_partner_activity(
        &self,
        partner: &Partner,
        kind: ActivityKind,
        state: ActivityState,
        task: bool,
    ) -> Result<()> {
        let role = if partner.incoming {
            ActivityRole::ConnectionRequestRecipient
        } else {
            ActivityRole::ConnectionRequestSender
        };
        let activity = Activity::new(partner.id, ActivityLink::Partner(partner.id), kind, role, state);
        let activity = if task { activity.as_task() } else { activity };
        self.record(activity, PartnerApi::from(partner)).await
    }
}

fn credential_role(role: CredentialExchangeRole) -> ActivityRole {
    match role {
        CredentialExchangeRole::Holder => ActivityRole::CredentialExchangeHolder,
        CredentialExchangeRole::Issuer => ActivityRole::CredentialExchangeIssuer,
    }
}

fn presentation_role(role: PresentationExchangeRole) -> ActivityRole {
    match role {
        PresentationExchangeRole::Prover => ActivityRole::PresentationExchangeProver,
        PresentationExchangeRole::Verifier => ActivityRole::PresentationExchangeVerifier,
    }
}

fn presentation_state(state: PresentationExchangeState) -> ActivityState {
    match state {
        PresentationExchangeState::RequestReceived | PresentationExchangeState::ProposalSent => {
            ActivityState::PresentationExchangeReceived
        }
        PresentationExchangeState::RequestSent | PresentationExchangeState::ProposalReceived => {
            ActivityState::PresentationExchangeSent
        }
        PresentationExchangeState::PresentationSent
        | PresentationExchangeState::PresentationReceived
        | PresentationExchangeState::Verified
        | PresentationExchangeState::PresentationAcked
        | PresentationExchangeState::Done => ActivityState::PresentationExchangeAccepted,
        PresentationExchangeState::Declined | PresentationExchangeState::Abandoned => {
            ActivityState::PresentationExchangeDeclined
        }
    }
}

#[async_trait]
impl TaskActivityStore for ActivityManager {
    async fn complete_credential_offered_task(&self, exchange: &CredentialExchange) -> Result<()> {
        self.finish_task(
            exchange.id,
            ActivityKind::CredentialOffer,
            TaskState::Completed,
            ActivityState::CredentialExchangeAccepted,
            None,
        )
        .await
    }

    async fn add_credential_offered_task(&self, exchange: &CredentialExchange) -> Result<()> {
        self.add_credential_activity(
            exchange,
            ActivityKind::CredentialOffer,
            credential_role(exchange.role),
            ActivityState::CredentialExchangeReceived,
            true,
        )
        .await
    }

    async fn add_credential_issued_activity(&self, exchange: &CredentialExchange) -> Result<()> {
        self.add_credential_activity(
            exchange,
            ActivityKind::CredentialIssued,
            ActivityRole::CredentialExchangeIssuer,
            ActivityState::CredentialExchangeIssued,
            false,
        )
        .await
    }

    async fn add_credential_accepted_activity(&self, exchange: &CredentialExchange) -> Result<()> {
        self.add_credential_activity(
            exchange,
            ActivityKind::CredentialAccepted,
            credential_role(exchange.role),
            ActivityState::CredentialExchangeAccepted,
            false,
        )
        .await
    }

    async fn add_credential_problem_activity(&self, exchange: &CredentialExchange) -> Result<()> {
        self.add_credential_activity(
            exchange,
            ActivityKind::CredentialProblem,
            credential_role(exchange.role),
            ActivityState::CredentialExchangeProblem,
            false,
        )
        .await
    }

    async fn complete_partner_request_task(&self, partner: &Partner) -> Result<()> {
        self.finish_task(
            partner.id,
            ActivityKind::ConnectionRequest,
            TaskState::Completed,
            ActivityState::ConnectionRequestAccepted,
            Some(PartnerApi::from(partner)),
        )
        .await
    }

    async fn add_partner_request_received_task(&self, partner: &Partner) -> Result<()> {
        self.add_partner_activity(
            partner,
            ActivityKind::ConnectionRequest,
            ActivityState::ConnectionRequestReceived,
            true,
        )
        .await
    }

    async fn add_partner_added_activity(&self, partner: &Partner) -> Result<()> {
        self.add_partner_activity(partner, ActivityKind::PartnerAdded, ActivityState::PartnerAdded, false)
            .await
    }

    async fn add_partner_accepted_activity(&self, partner: &Partner) -> Result<()> {
        self.add_partner_activity(
            partner,
            ActivityKind::PartnerAccepted,
            ActivityState::PartnerAccepted,
            false,
        )
        .await
    }

    async fn add_presentation_exchange_task(&self, proof: &PartnerProof) -> Result<()> {
        let Some(partner) = self.proof_partner(proof).await? else {
            warn!(proof_id = %proof.id, "No partner for presentation exchange, task not recorded");
            return Ok(());
        };

        let activity = Activity::new(
            partner.id,
            ActivityLink::Proof(proof.id),
            ActivityKind::PresentationExchange,
            presentation_role(proof.role),
            presentation_state(proof.state),
        )
        .as_task();
        self.record(activity, partner).await
    }

    async fn complete_presentation_exchange_task(&self, proof: &PartnerProof) -> Result<()> {
        self.finish_task(
            proof.id,
            ActivityKind::PresentationExchange,
            TaskState::Completed,
            ActivityState::PresentationExchangeAccepted,
            None,
        )
        .await
    }

    async fn decline_presentation_exchange_task(&self, proof: &PartnerProof) -> Result<()> {
        self.finish_task(
            proof.id,
            ActivityKind::PresentationExchange,
            TaskState::Declined,
            ActivityState::PresentationExchangeDeclined,
            None,
        )
        .await
    }

    async fn delete_presentation_exchange_task(&self, proof: &PartnerProof) -> Result<()> {
        self.finish_task(
            proof.id,
            ActivityKind::PresentationExchange,
            TaskState::Deleted,
            ActivityState::PresentationExchangeDeleted,
            None,
        )
        .await
    }
}
