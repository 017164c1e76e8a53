//! Lifecycle events emitted by the protocol engine and the activity manager

use bpa_core::{Activity, CredentialExchange, Partner, PartnerApi, PartnerProof};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every event the notification listener reacts to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    // Credential events
    /// A credential landed in the wallet
    #[serde(rename = "credential.added")]
    CredentialAdded { credential: CredentialExchange },

    /// A partner offered us a credential
    #[serde(rename = "credential.offered")]
    CredentialOffered { credential: CredentialExchange },

    /// We issued a credential to a partner
    #[serde(rename = "credential.issued")]
    CredentialIssued { credential: CredentialExchange },

    /// A partner accepted a credential we offered
    #[serde(rename = "credential.accepted")]
    CredentialAccepted { credential: CredentialExchange },

    /// The exchange ran into a problem report
    #[serde(rename = "credential.problem")]
    CredentialProblem { credential: CredentialExchange },

    // Partner events
    #[serde(rename = "partner.added")]
    PartnerAdded { partner: Partner },

    #[serde(rename = "partner.accepted")]
    PartnerAccepted { partner: Partner },

    /// Incoming connection request
    #[serde(rename = "partner.request_received")]
    PartnerRequestReceived { partner: Partner },

    #[serde(rename = "partner.request_completed")]
    PartnerRequestCompleted { partner: Partner },

    #[serde(rename = "partner.removed")]
    PartnerRemoved { partner: Partner },

    // Presentation events
    /// Proof was presented (prover) or verified (verifier)
    #[serde(rename = "presentation_request.completed")]
    PresentationRequestCompleted { proof: PartnerProof },

    #[serde(rename = "presentation_request.declined")]
    PresentationRequestDeclined { proof: PartnerProof },

    #[serde(rename = "presentation_request.deleted")]
    PresentationRequestDeleted { proof: PartnerProof },

    #[serde(rename = "presentation_request.received")]
    PresentationRequestReceived { proof: PartnerProof },

    #[serde(rename = "presentation_request.sent")]
    PresentationRequestSent { proof: PartnerProof },

    // Activity log events
    /// A non-task activity was recorded
    #[serde(rename = "activity.created")]
    ActivityNotification { notice: ActivityNotice },

    #[serde(rename = "task.added")]
    TaskAdded { notice: ActivityNotice },

    #[serde(rename = "task.completed")]
    TaskCompleted { notice: ActivityNotice },
}

/// Activity together with the partner it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityNotice {
    pub activity: Activity,
    pub partner: PartnerApi,
}

impl ActivityNotice {
    pub fn new(activity: Activity, partner: PartnerApi) -> Self {
        Self { activity, partner }
    }
}

impl NotificationEvent {
    /// Identifier of the exchange, partner or activity the event concerns
    pub fn correlation_id(&self) -> Uuid {
        match self {
            Self::CredentialAdded { credential }
            | Self::CredentialOffered { credential }
            | Self::CredentialIssued { credential }
            | Self::CredentialAccepted { credential }
            | Self::CredentialProblem { credential } => credential.id,
            Self::PartnerAdded { partner }
            | Self::PartnerAccepted { partner }
            | Self::PartnerRequestReceived { partner }
            | Self::PartnerRequestCompleted { partner }
            | Self::PartnerRemoved { partner } => partner.id,
            Self::PresentationRequestCompleted { proof }
            | Self::PresentationRequestDeclined { proof }
            | Self::PresentationRequestDeleted { proof }
            | Self::PresentationRequestReceived { proof }
            | Self::PresentationRequestSent { proof } => proof.id,
            Self::ActivityNotification { notice }
            | Self::TaskAdded { notice }
            | Self::TaskCompleted { notice } => notice.activity.id,
        }
    }

    /// Wire name of the event, matching the serde tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CredentialAdded { .. } => "credential.added",
            Self::CredentialOffered { .. } => "credential.offered",
            Self::CredentialIssued { .. } => "credential.issued",
            Self::CredentialAccepted { .. } => "credential.accepted",
            Self::CredentialProblem { .. } => "credential.problem",
            Self::PartnerAdded { .. } => "partner.added",
            Self::PartnerAccepted { .. } => "partner.accepted",
            Self::PartnerRequestReceived { .. } => "partner.request_received",
            Self::PartnerRequestCompleted { .. } => "partner.request_completed",
            Self::PartnerRemoved { .. } => "partner.removed",
            Self::PresentationRequestCompleted { .. } => "presentation_request.completed",
            Self::PresentationRequestDeclined { .. } => "presentation_request.declined",
            Self::PresentationRequestDeleted { .. } => "presentation_request.deleted",
            Self::PresentationRequestReceived { .. } => "presentation_request.received",
            Self::PresentationRequestSent { .. } => "presentation_request.sent",
            Self::ActivityNotification { .. } => "activity.created",
            Self::TaskAdded { .. } => "task.added",
            Self::TaskCompleted { .. } => "task.completed",
        }
    }
}
