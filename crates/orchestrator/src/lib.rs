pub mod activity_manager;
pub mod config;
pub mod error;
pub mod feed;
pub mod listener;
pub mod service;
pub mod state_machine;
pub mod traits;

pub use activity_manager::ActivityManager;
pub use config::{ActivityLogConfig, ActivityLogSettings, AgentSettings};
pub use error::{OrchestratorError, Result};
pub use feed::{EventFeed, EventPublisher};
pub use listener::{Dispatch, NotificationEventListener};
pub use service::NotificationService;
pub use state_machine::TaskStateMachine;
pub use traits::{NotificationSink, PartnerDirectory, TaskActivityStore};
