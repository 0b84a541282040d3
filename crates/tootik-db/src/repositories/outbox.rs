//! Outbox repository. Delivery draining itself is an external
//! collaborator's concern; this repository only records and counts.

use std::sync::Arc;

use crate::entities::{outbox_item, OutboxItem};
use tootik_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter,
};

/// Outbox repository for database operations.
#[derive(Clone)]
pub struct OutboxRepository {
    db: Arc<DatabaseConnection>,
}

impl OutboxRepository {
    /// Create a new outbox repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Enqueue an outgoing activity.
    pub async fn create(&self, model: outbox_item::ActiveModel) -> AppResult<outbox_item::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Count of activities `sender` has enqueued since `since_unix`, used as
    /// an alternate throttle signal alongside `NoteRepository::count_since`.
    pub async fn count_since(&self, sender: &str, since_unix: i64) -> AppResult<u64> {
        OutboxItem::find()
            .filter(
                Condition::all()
                    .add(outbox_item::Column::Sender.eq(sender))
                    .add(outbox_item::Column::Inserted.gte(since_unix)),
            )
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Persist delivery progress (attempts/sent) for a queued activity.
    pub async fn update(&self, model: outbox_item::ActiveModel) -> AppResult<outbox_item::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
