use std::sync::Arc;

use db::PartnerRepository;
use events::EventBus;
use orchestrator::{ActivityLogConfig, ActivityManager, EventPublisher, NotificationService};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub event_bus: EventBus,
    pub publisher: EventPublisher,
    pub activities: Arc<ActivityManager>,
    pub partners: PartnerRepository,
}

impl AppState {
    /// Starts the notification service; must run inside a tokio runtime.
    /// The caller owns the returned service and shuts it down once the
    /// router stops serving.
    pub fn start(pool: SqlitePool, config: ActivityLogConfig) -> (Self, NotificationService) {
        let event_bus = EventBus::new();
        let partners = PartnerRepository::new(pool.clone());
        let service = NotificationService::start(pool, event_bus.clone(), config);

        let state = Self {
            event_bus,
            publisher: service.publisher(),
            activities: service.activities(),
            partners,
        };
        (state, service)
    }
}
