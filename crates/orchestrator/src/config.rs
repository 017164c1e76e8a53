//! Task-relevance policy.
//!
//! Decides which protocol states are worth an operator task. Built once at
//! startup from the agent flags, optionally overridden per exchange kind, and
//! shared read-only with the listener.

use bpa_core::{ConnectionState, CredentialExchangeState, PresentationExchangeState};
use serde::{Deserialize, Serialize};

/// Protocol engine behaviour flags that shape the default policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentSettings {
    /// Connection requests are accepted without operator action
    #[serde(default)]
    pub auto_accept_requests: bool,
    /// Presentation requests are answered without operator action
    #[serde(default)]
    pub auto_respond_presentation_request: bool,
}

/// `[activity_log]` section of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivityLogSettings {
    /// Credential offers are accepted without operator action
    #[serde(default)]
    pub auto_respond_credential_offer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_states_for_tasks: Option<Vec<ConnectionState>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_exchange_states_for_tasks: Option<Vec<CredentialExchangeState>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_exchange_states_for_tasks: Option<Vec<PresentationExchangeState>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityLogConfig {
    auto_respond_credential_offer: bool,
    connection_states: Vec<ConnectionState>,
    credential_exchange_states: Vec<CredentialExchangeState>,
    presentation_exchange_states: Vec<PresentationExchangeState>,
}

impl ActivityLogConfig {
    pub fn new(agent: &AgentSettings, settings: &ActivityLogSettings) -> Self {
        let connection_states = settings.connection_states_for_tasks.clone().unwrap_or_else(|| {
            if agent.auto_accept_requests {
                Vec::new()
            } else {
                vec![ConnectionState::Request]
            }
        });

        let credential_exchange_states =
            settings.credential_exchange_states_for_tasks.clone().unwrap_or_else(|| {
                if settings.auto_respond_credential_offer {
                    Vec::new()
                } else {
                    vec![CredentialExchangeState::OfferReceived]
                }
            });

        let presentation_exchange_states =
            settings.presentation_exchange_states_for_tasks.clone().unwrap_or_else(|| {
                if agent.auto_respond_presentation_request {
                    Vec::new()
                } else {
                    vec![PresentationExchangeState::RequestReceived]
                }
            });

        Self {
            auto_respond_credential_offer: settings.auto_respond_credential_offer,
            connection_states,
            credential_exchange_states,
            presentation_exchange_states,
        }
    }

    pub fn with_auto_respond_credential_offer(mut self, enabled: bool) -> Self {
        self.auto_respond_credential_offer = enabled;
        self
    }

    pub fn with_connection_states(mut self, states: Vec<ConnectionState>) -> Self {
        self.connection_states = states;
        self
    }

    pub fn with_credential_exchange_states(mut self, states: Vec<CredentialExchangeState>) -> Self {
        self.credential_exchange_states = states;
        self
    }

    pub fn with_presentation_exchange_states(mut self, states: Vec<PresentationExchangeState>) -> Self {
        self.presentation_exchange_states = states;
        self
    }

    pub fn auto_respond_credential_offer(&self) -> bool {
        self.auto_respond_credential_offer
    }

    /// A missing connection state is never task-worthy.
    pub fn is_connection_task_state(&self, state: Option<ConnectionState>) -> bool {
        state.is_some_and(|s| self.connection_states.contains(&s))
    }

    pub fn is_credential_task_state(&self, state: CredentialExchangeState) -> bool {
        self.credential_exchange_states.contains(&state)
    }

    pub fn is_presentation_task_state(&self, state: PresentationExchangeState) -> bool {
        self.presentation_exchange_states.contains(&state)
    }

    pub fn connection_states(&self) -> &[ConnectionState] {
        &self.connection_states
    }

    pub fn credential_exchange_states(&self) -> &[CredentialExchangeState] {
        &self.credential_exchange_states
    }

    pub fn presentation_exchange_states(&self) -> &[PresentationExchangeState] {
        &self.presentation_exchange_states
    }
}

impl Default for ActivityLogConfig {
    fn default() -> Self {
        Self::new(&AgentSettings::default(), &ActivityLogSettings::default())
    }
}
