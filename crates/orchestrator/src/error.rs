use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid task transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Malformed {event} event {correlation_id}: {reason}")]
    MalformedEvent {
        event: &'static str,
        correlation_id: Uuid,
        reason: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] db::DbError),

    #[error("Partner directory error: {0}")]
    Directory(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OrchestratorError {
    /// Create a malformed event error.
    pub fn malformed(event: &'static str, correlation_id: Uuid, reason: impl Into<String>) -> Self {
        Self::MalformedEvent {
            event,
            correlation_id,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
