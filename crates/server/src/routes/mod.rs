pub mod activities;
pub mod events;
pub mod health;
pub mod sse;

pub use activities::{list_activities, ActivitiesQuery};
pub use events::{ingest_event, AcceptedResponse};
pub use health::{health_check, HealthResponse};
pub use sse::notifications_stream;
