//! Snapshots of credential and presentation exchanges.
//!
//! The protocol engine owns these records; the notification core only ever
//! reads the copy attached to a lifecycle event.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum CredentialExchangeState {
    ProposalSent,
    ProposalReceived,
    OfferSent,
    OfferReceived,
    RequestSent,
    RequestReceived,
    CredentialIssued,
    CredentialReceived,
    CredentialAcked,
    Done,
    CredentialRevoked,
    Declined,
    Abandoned,
    Problem,
}

impl CredentialExchangeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProposalSent => "proposal_sent",
            Self::ProposalReceived => "proposal_received",
            Self::OfferSent => "offer_sent",
            Self::OfferReceived => "offer_received",
            Self::RequestSent => "request_sent",
            Self::RequestReceived => "request_received",
            Self::CredentialIssued => "credential_issued",
            Self::CredentialReceived => "credential_received",
            Self::CredentialAcked => "credential_acked",
            Self::Done => "done",
            Self::CredentialRevoked => "credential_revoked",
            Self::Declined => "declined",
            Self::Abandoned => "abandoned",
            Self::Problem => "problem",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum PresentationExchangeState {
    ProposalSent,
    ProposalReceived,
    RequestSent,
    RequestReceived,
    PresentationSent,
    PresentationReceived,
    Verified,
    PresentationAcked,
    Done,
    Declined,
    Abandoned,
}

impl PresentationExchangeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProposalSent => "proposal_sent",
            Self::ProposalReceived => "proposal_received",
            Self::RequestSent => "request_sent",
            Self::RequestReceived => "request_received",
            Self::PresentationSent => "presentation_sent",
            Self::PresentationReceived => "presentation_received",
            Self::Verified => "verified",
            Self::PresentationAcked => "presentation_acked",
            Self::Done => "done",
            Self::Declined => "declined",
            Self::Abandoned => "abandoned",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum CredentialExchangeRole {
    Issuer,
    Holder,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum PresentationExchangeRole {
    Prover,
    Verifier,
}

/// When each state of an exchange was entered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct StateToTimestamp<S: Ord>(BTreeMap<S, DateTime<Utc>>);

impl<S: Ord> Default for StateToTimestamp<S> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<S: Ord + Copy> StateToTimestamp<S> {
    pub fn record(&mut self, state: S, at: DateTime<Utc>) {
        self.0.insert(state, at);
    }

    pub fn get(&self, state: S) -> Option<DateTime<Utc>> {
        self.0.get(&state).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One run of the issue-credential protocol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialExchange {
    pub id: Uuid,
    pub connection_id: String,
    #[serde(default)]
    pub partner_id: Option<Uuid>,
    pub state: CredentialExchangeState,
    pub role: CredentialExchangeRole,
    #[serde(default)]
    pub schema_id: Option<String>,
    #[serde(default)]
    pub cred_def_id: Option<String>,
    #[serde(default)]
    pub error_msg: Option<String>,
    #[serde(default)]
    pub state_to_timestamp: StateToTimestamp<CredentialExchangeState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialExchange {
    pub fn new(
        connection_id: impl Into<String>,
        role: CredentialExchangeRole,
        state: CredentialExchangeState,
    ) -> Self {
        let now = Utc::now();
        let mut state_to_timestamp = StateToTimestamp::default();
        state_to_timestamp.record(state, now);
        Self {
            id: Uuid::new_v4(),
            connection_id: connection_id.into(),
            partner_id: None,
            state,
            role,
            schema_id: None,
            cred_def_id: None,
            error_msg: None,
            state_to_timestamp,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_partner_id(mut self, partner_id: Uuid) -> Self {
        self.partner_id = Some(partner_id);
        self
    }

    pub fn with_error(mut self, error_msg: impl Into<String>) -> Self {
        self.error_msg = Some(error_msg.into());
        self
    }

    /// Move the snapshot to `state`, stamping the transition time.
    pub fn transition(&mut self, state: CredentialExchangeState) {
        let now = Utc::now();
        self.state = state;
        self.state_to_timestamp.record(state, now);
        self.updated_at = now;
    }
}

/// One run of the present-proof protocol, as tracked for a partner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartnerProof {
    pub id: Uuid,
    #[serde(default)]
    pub connection_id: Option<String>,
    #[serde(default)]
    pub partner_id: Option<Uuid>,
    pub state: PresentationExchangeState,
    pub role: PresentationExchangeRole,
    #[serde(default)]
    pub valid: Option<bool>,
    #[serde(default)]
    pub proof_request_name: Option<String>,
    #[serde(default)]
    pub problem_report: Option<String>,
    #[serde(default)]
    pub state_to_timestamp: StateToTimestamp<PresentationExchangeState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PartnerProof {
    pub fn new(
        partner_id: Uuid,
        role: PresentationExchangeRole,
        state: PresentationExchangeState,
    ) -> Self {
        let now = Utc::now();
        let mut state_to_timestamp = StateToTimestamp::default();
        state_to_timestamp.record(state, now);
        Self {
            id: Uuid::new_v4(),
            connection_id: None,
            partner_id: Some(partner_id),
            state,
            role,
            valid: None,
            proof_request_name: None,
            problem_report: None,
            state_to_timestamp,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_connection_id(mut self, connection_id: impl Into<String>) -> Self {
        self.connection_id = Some(connection_id.into());
        self
    }

    pub fn transition(&mut self, state: PresentationExchangeState) {
        let now = Utc::now();
        self.state = state;
        self.state_to_timestamp.record(state, now);
        self.updated_at = now;
    }
}
