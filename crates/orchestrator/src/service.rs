use std::sync::Arc;

use db::{ActivityRepository, PartnerRepository};
use events::EventBus;
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::activity_manager::ActivityManager;
use crate::config::ActivityLogConfig;
use crate::feed::{EventFeed, EventPublisher};
use crate::listener::NotificationEventListener;

/// The notification core wired to sqlite and a broadcast bus, with its feed
/// loop running in the background.
pub struct NotificationService {
    publisher: EventPublisher,
    activities: Arc<ActivityManager>,
    feed_task: JoinHandle<()>,
}

impl NotificationService {
    /// Must be called inside a tokio runtime.
    pub fn start(pool: SqlitePool, bus: EventBus, config: ActivityLogConfig) -> Self {
        let (publisher, feed) = EventFeed::channel();
        let partners = Arc::new(PartnerRepository::new(pool.clone()));
        let activities = Arc::new(ActivityManager::new(
            ActivityRepository::new(pool),
            partners.clone(),
            publisher.clone(),
        ));

        let listener = NotificationEventListener::new(
            partners,
            activities.clone(),
            Arc::new(bus),
            Arc::new(config),
        );
        let feed_task = tokio::spawn(feed.run(listener));
        info!("Notification service started");

        Self {
            publisher,
            activities,
            feed_task,
        }
    }

    pub fn publisher(&self) -> EventPublisher {
        self.publisher.clone()
    }

    pub fn activities(&self) -> Arc<ActivityManager> {
        self.activities.clone()
    }

    /// Stop the feed loop. Events queued afterwards are refused.
    pub async fn shutdown(self) {
        self.feed_task.abort();
        if let Err(e) = self.feed_task.await {
            if !e.is_cancelled() {
                warn!("Event feed task failed: {}", e);
            }
        }
        info!("Notification service stopped");
    }
}
