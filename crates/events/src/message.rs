//! Envelope pushed to notification subscribers

use bpa_core::PartnerApi;
use serde::{Deserialize, Serialize};

/// Wire discriminator of a pushed notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebSocketMessageType {
    OnCredentialAdded,
    OnCredentialOffered,
    OnCredentialAccepted,
    OnCredentialProblem,
    OnPartnerRequestCompleted,
    OnPartnerRequestReceived,
    OnPartnerAdded,
    OnPartnerAccepted,
    OnPartnerRemoved,
    OnPresentationVerified,
    OnPresentationProved,
    OnPresentationRequestDeclined,
    OnPresentationRequestDeleted,
    OnPresentationRequestReceived,
    OnPresentationRequestSent,
    ActivityNotification,
    TaskAdded,
    TaskCompleted,
}

impl WebSocketMessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnCredentialAdded => "ON_CREDENTIAL_ADDED",
            Self::OnCredentialOffered => "ON_CREDENTIAL_OFFERED",
            Self::OnCredentialAccepted => "ON_CREDENTIAL_ACCEPTED",
            Self::OnCredentialProblem => "ON_CREDENTIAL_PROBLEM",
            Self::OnPartnerRequestCompleted => "ON_PARTNER_REQUEST_COMPLETED",
            Self::OnPartnerRequestReceived => "ON_PARTNER_REQUEST_RECEIVED",
            Self::OnPartnerAdded => "ON_PARTNER_ADDED",
            Self::OnPartnerAccepted => "ON_PARTNER_ACCEPTED",
            Self::OnPartnerRemoved => "ON_PARTNER_REMOVED",
            Self::OnPresentationVerified => "ON_PRESENTATION_VERIFIED",
            Self::OnPresentationProved => "ON_PRESENTATION_PROVED",
            Self::OnPresentationRequestDeclined => "ON_PRESENTATION_REQUEST_DECLINED",
            Self::OnPresentationRequestDeleted => "ON_PRESENTATION_REQUEST_DELETED",
            Self::OnPresentationRequestReceived => "ON_PRESENTATION_REQUEST_RECEIVED",
            Self::OnPresentationRequestSent => "ON_PRESENTATION_REQUEST_SENT",
            Self::ActivityNotification => "ACTIVITY_NOTIFICATION",
            Self::TaskAdded => "TASK_ADDED",
            Self::TaskCompleted => "TASK_COMPLETED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    message_type: WebSocketMessageType,
    link_id: String,
    #[cfg_attr(feature = "typescript", ts(type = "Record<string, unknown> | null"))]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    info: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    partner: Option<PartnerApi>,
}

/// Immutable notification envelope; build one per publish.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct WebSocketMessageBody {
    message: WebSocketMessage,
}

impl WebSocketMessageBody {
    pub fn notification_event(
        message_type: WebSocketMessageType,
        link_id: impl Into<String>,
        info: Option<serde_json::Value>,
        partner: Option<PartnerApi>,
    ) -> Self {
        Self {
            message: WebSocketMessage {
                message_type,
                link_id: link_id.into(),
                info,
                partner,
            },
        }
    }

    pub fn message_type(&self) -> WebSocketMessageType {
        self.message.message_type
    }

    pub fn link_id(&self) -> &str {
        &self.message.link_id
    }

    pub fn info(&self) -> Option<&serde_json::Value> {
        self.message.info.as_ref()
    }

    pub fn partner(&self) -> Option<&PartnerApi> {
        self.message.partner.as_ref()
    }
}
