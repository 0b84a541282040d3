//! Share (`Announce`) repository.

use std::sync::Arc;

use crate::entities::{share, Share};
use tootik_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Share repository for database operations.
#[derive(Clone)]
pub struct ShareRepository {
    db: Arc<DatabaseConnection>,
}

impl ShareRepository {
    /// Create a new share repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Whether `by` has already shared `note`.
    pub async fn exists(&self, by: &str, note: &str) -> AppResult<bool> {
        Ok(self.find(by, note).await?.is_some())
    }

    /// Find the share row for `(by, note)`, if any.
    pub async fn find(&self, by: &str, note: &str) -> AppResult<Option<share::Model>> {
        Share::find()
            .filter(
                Condition::all()
                    .add(share::Column::By.eq(by))
                    .add(share::Column::Note.eq(note)),
            )
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Record a new share.
    pub async fn create(&self, model: share::ActiveModel) -> AppResult<share::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Remove a share (undo-announce).
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Share::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }

    /// Every sharer of `note`, newest first. Unlike a `LIMIT SharesPerPost`
    /// query, this doesn't discard candidates before a caller has had a
    /// chance to rank them (by follows-tier, for instance) and truncate
    /// afterwards.
    pub async fn sharers_for(&self, note: &str) -> AppResult<Vec<share::Model>> {
        Share::find()
            .filter(share::Column::Note.eq(note))
            .order_by_desc(share::Column::Inserted)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
