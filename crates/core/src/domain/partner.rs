use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Connection protocol state of a partner as reported by the agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Invitation,
    Request,
    Response,
    Active,
    Completed,
    Abandoned,
    Error,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invitation => "invitation",
            Self::Request => "request",
            Self::Response => "response",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "invitation" => Some(Self::Invitation),
            "request" => Some(Self::Request),
            "response" => Some(Self::Response),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "abandoned" => Some(Self::Abandoned),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A counterparty known to the agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Partner {
    pub id: Uuid,
    pub did: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub connection_id: Option<String>,
    #[serde(default)]
    pub state: Option<ConnectionState>,
    #[serde(default)]
    pub valid: Option<bool>,
    #[serde(default = "default_true")]
    pub aries_support: bool,
    #[serde(default)]
    pub incoming: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

impl Partner {
    pub fn new(did: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            did: did.into(),
            alias: None,
            connection_id: None,
            state: None,
            valid: None,
            aries_support: true,
            incoming: false,
            created_at: now,
            updated_at: now,
            last_seen: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_connection_id(mut self, connection_id: impl Into<String>) -> Self {
        self.connection_id = Some(connection_id.into());
        self
    }

    pub fn with_state(mut self, state: ConnectionState) -> Self {
        self.state = Some(state);
        self
    }
}

/// Read-only partner projection handed out by the partner directory and
/// attached to outgoing notifications. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct PartnerApi {
    pub id: Uuid,
    pub did: String,
    pub alias: Option<String>,
    pub state: Option<ConnectionState>,
    pub valid: Option<bool>,
    pub aries_support: bool,
    pub incoming: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_seen: Option<i64>,
}

impl From<&Partner> for PartnerApi {
    fn from(p: &Partner) -> Self {
        Self {
            id: p.id,
            did: p.did.clone(),
            alias: p.alias.clone(),
            state: p.state,
            valid: p.valid,
            aries_support: p.aries_support,
            incoming: p.incoming,
            created_at: p.created_at.timestamp_millis(),
            updated_at: p.updated_at.timestamp_millis(),
            last_seen: p.last_seen.map(|ts| ts.timestamp_millis()),
        }
    }
}

impl From<Partner> for PartnerApi {
    fn from(p: Partner) -> Self {
        Self::from(&p)
    }
}
