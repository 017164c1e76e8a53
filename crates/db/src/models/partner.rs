use bpa_core::{ConnectionState, Partner};

use super::activity::parse_uuid;
use super::{datetime_to_millis, millis_to_datetime};
use crate::error::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PartnerRow {
    pub id: String,
    pub did: String,
    pub alias: Option<String>,
    pub connection_id: Option<String>,
    pub state: Option<String>,
    pub valid: Option<bool>,
    pub aries_support: bool,
    pub incoming: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_seen: Option<i64>,
}

impl PartnerRow {
    pub fn into_domain(self) -> Result<Partner, DbError> {
        let state = match self.state {
            Some(ref s) => Some(ConnectionState::parse(s).ok_or_else(|| DbError::invalid("state", s))?),
            None => None,
        };

        Ok(Partner {
            id: parse_uuid("id", &self.id)?,
            did: self.did,
            alias: self.alias,
            connection_id: self.connection_id,
            state,
            valid: self.valid,
            aries_support: self.aries_support,
            incoming: self.incoming,
            created_at: millis_to_datetime(self.created_at),
            updated_at: millis_to_datetime(self.updated_at),
            last_seen: self.last_seen.map(millis_to_datetime),
        })
    }
}

impl From<&Partner> for PartnerRow {
    fn from(partner: &Partner) -> Self {
        Self {
            id: partner.id.to_string(),
            did: partner.did.clone(),
            alias: partner.alias.clone(),
            connection_id: partner.connection_id.clone(),
            state: partner.state.map(|s| s.as_str().to_string()),
            valid: partner.valid,
            aries_support: partner.aries_support,
            incoming: partner.incoming,
            created_at: datetime_to_millis(partner.created_at),
            updated_at: datetime_to_millis(partner.updated_at),
            last_seen: partner.last_seen.map(datetime_to_millis),
        }
    }
}
