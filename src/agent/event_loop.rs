//! Realtime intake: entity-value change events posted by the entity-sync
//! layer, fed one at a time into the realtime alert evaluation path.

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::alerts::evaluator;

/// Webhook payload for one entity-value change.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EntityChangeEvent {
    pub entity_id: String,
    pub value: String,
    /// When the source observed the change; informational only.
    pub observed_at: Option<String>,
}

pub struct EventLoop {
    db: DatabaseConnection,
    redis: redis::Client,
}

impl EventLoop {
    pub fn new(db: DatabaseConnection, redis: redis::Client) -> Self {
        Self { db, redis }
    }

    pub async fn process_event(&self, event: EntityChangeEvent) {
        info!(
            entity_id = %event.entity_id,
            value = %event.value,
            "Processing entity change event"
        );
        evaluator::process_entity_event(&self.db, &self.redis, &event.entity_id, &event.value)
            .await;
    }
}
