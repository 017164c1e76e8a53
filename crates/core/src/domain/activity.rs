use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of an activity that requires an operator decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    Open,
    Completed,
    Declined,
    Deleted,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Completed => "completed",
            Self::Declined => "declined",
            Self::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "completed" => Some(Self::Completed),
            "declined" => Some(Self::Declined),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

/// The triggering event category. At most one activity exists per
/// correlation id and kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ConnectionRequest,
    PartnerAdded,
    PartnerAccepted,
    CredentialOffer,
    CredentialIssued,
    CredentialAccepted,
    CredentialProblem,
    PresentationExchange,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionRequest => "connection_request",
            Self::PartnerAdded => "partner_added",
            Self::PartnerAccepted => "partner_accepted",
            Self::CredentialOffer => "credential_offer",
            Self::CredentialIssued => "credential_issued",
            Self::CredentialAccepted => "credential_accepted",
            Self::CredentialProblem => "credential_problem",
            Self::PresentationExchange => "presentation_exchange",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "connection_request" => Some(Self::ConnectionRequest),
            "partner_added" => Some(Self::PartnerAdded),
            "partner_accepted" => Some(Self::PartnerAccepted),
            "credential_offer" => Some(Self::CredentialOffer),
            "credential_issued" => Some(Self::CredentialIssued),
            "credential_accepted" => Some(Self::CredentialAccepted),
            "credential_problem" => Some(Self::CredentialProblem),
            "presentation_exchange" => Some(Self::PresentationExchange),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum ActivityRole {
    ConnectionRequestSender,
    ConnectionRequestRecipient,
    PresentationExchangeProver,
    PresentationExchangeVerifier,
    CredentialExchangeHolder,
    CredentialExchangeIssuer,
}

impl ActivityRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionRequestSender => "connection_request_sender",
            Self::ConnectionRequestRecipient => "connection_request_recipient",
            Self::PresentationExchangeProver => "presentation_exchange_prover",
            Self::PresentationExchangeVerifier => "presentation_exchange_verifier",
            Self::CredentialExchangeHolder => "credential_exchange_holder",
            Self::CredentialExchangeIssuer => "credential_exchange_issuer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "connection_request_sender" => Some(Self::ConnectionRequestSender),
            "connection_request_recipient" => Some(Self::ConnectionRequestRecipient),
            "presentation_exchange_prover" => Some(Self::PresentationExchangeProver),
            "presentation_exchange_verifier" => Some(Self::PresentationExchangeVerifier),
            "credential_exchange_holder" => Some(Self::CredentialExchangeHolder),
            "credential_exchange_issuer" => Some(Self::CredentialExchangeIssuer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    ConnectionRequestReceived,
    ConnectionRequestAccepted,
    PartnerAdded,
    PartnerAccepted,
    CredentialExchangeReceived,
    CredentialExchangeIssued,
    CredentialExchangeAccepted,
    CredentialExchangeProblem,
    PresentationExchangeReceived,
    PresentationExchangeSent,
    PresentationExchangeAccepted,
    PresentationExchangeDeclined,
    PresentationExchangeDeleted,
}

impl ActivityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionRequestReceived => "connection_request_received",
            Self::ConnectionRequestAccepted => "connection_request_accepted",
            Self::PartnerAdded => "partner_added",
            Self::PartnerAccepted => "partner_accepted",
            Self::CredentialExchangeReceived => "credential_exchange_received",
            Self::CredentialExchangeIssued => "credential_exchange_issued",
            Self::CredentialExchangeAccepted => "credential_exchange_accepted",
            Self::CredentialExchangeProblem => "credential_exchange_problem",
            Self::PresentationExchangeReceived => "presentation_exchange_received",
            Self::PresentationExchangeSent => "presentation_exchange_sent",
            Self::PresentationExchangeAccepted => "presentation_exchange_accepted",
            Self::PresentationExchangeDeclined => "presentation_exchange_declined",
            Self::PresentationExchangeDeleted => "presentation_exchange_deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "connection_request_received" => Some(Self::ConnectionRequestReceived),
            "connection_request_accepted" => Some(Self::ConnectionRequestAccepted),
            "partner_added" => Some(Self::PartnerAdded),
            "partner_accepted" => Some(Self::PartnerAccepted),
            "credential_exchange_received" => Some(Self::CredentialExchangeReceived),
            "credential_exchange_issued" => Some(Self::CredentialExchangeIssued),
            "credential_exchange_accepted" => Some(Self::CredentialExchangeAccepted),
            "credential_exchange_problem" => Some(Self::CredentialExchangeProblem),
            "presentation_exchange_received" => Some(Self::PresentationExchangeReceived),
            "presentation_exchange_sent" => Some(Self::PresentationExchangeSent),
            "presentation_exchange_accepted" => Some(Self::PresentationExchangeAccepted),
            "presentation_exchange_declined" => Some(Self::PresentationExchangeDeclined),
            "presentation_exchange_deleted" => Some(Self::PresentationExchangeDeleted),
            _ => None,
        }
    }
}

/// What an activity refers to. Credential and proof references exclude each
/// other; connection activities point at the partner itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ActivityLink {
    Partner(Uuid),
    Credential(Uuid),
    Proof(Uuid),
}

impl ActivityLink {
    pub fn correlation_id(&self) -> Uuid {
        match self {
            Self::Partner(id) | Self::Credential(id) | Self::Proof(id) => *id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Partner(_) => "partner",
            Self::Credential(_) => "credential",
            Self::Proof(_) => "proof",
        }
    }

    pub fn from_parts(link_type: &str, id: Uuid) -> Option<Self> {
        match link_type {
            "partner" => Some(Self::Partner(id)),
            "credential" => Some(Self::Credential(id)),
            "proof" => Some(Self::Proof(id)),
            _ => None,
        }
    }
}

/// An audit-log entry. Activities with a task state are tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Activity {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub link: ActivityLink,
    pub kind: ActivityKind,
    pub role: ActivityRole,
    pub state: ActivityState,
    pub task: Option<TaskState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    pub fn new(
        partner_id: Uuid,
        link: ActivityLink,
        kind: ActivityKind,
        role: ActivityRole,
        state: ActivityState,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            partner_id,
            link,
            kind,
            role,
            state,
            task: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Flag the activity as an open task.
    pub fn as_task(mut self) -> Self {
        self.task = Some(TaskState::Open);
        self
    }

    pub fn correlation_id(&self) -> Uuid {
        self.link.correlation_id()
    }

    pub fn is_task(&self) -> bool {
        self.task.is_some()
    }

    pub fn is_open_task(&self) -> bool {
        self.task == Some(TaskState::Open)
    }
}
