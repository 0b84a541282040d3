//! Bookmark repository.

use std::sync::Arc;

use crate::entities::{bookmark, Bookmark};
use tootik_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Bookmark repository for database operations.
#[derive(Clone)]
pub struct BookmarkRepository {
    db: Arc<DatabaseConnection>,
}

impl BookmarkRepository {
    /// Create a new bookmark repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the bookmark row for `(by, note)`, if any.
    pub async fn find(&self, by: &str, note: &str) -> AppResult<Option<bookmark::Model>> {
        Bookmark::find()
            .filter(
                Condition::all()
                    .add(bookmark::Column::By.eq(by))
                    .add(bookmark::Column::Note.eq(note)),
            )
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Number of bookmarks held by `by`, checked against
    /// `MaxBookmarksPerUser` before creating a new one.
    pub async fn count_for(&self, by: &str) -> AppResult<u64> {
        Bookmark::find()
            .filter(bookmark::Column::By.eq(by))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Most recently created bookmark for `by`, used to enforce
    /// `MinBookmarkInterval`.
    pub async fn most_recent_for(&self, by: &str) -> AppResult<Option<bookmark::Model>> {
        Bookmark::find()
            .filter(bookmark::Column::By.eq(by))
            .order_by_desc(bookmark::Column::Inserted)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Create a new bookmark.
    pub async fn create(&self, model: bookmark::ActiveModel) -> AppResult<bookmark::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Remove a bookmark.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Bookmark::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }

    /// A user's bookmarked notes, newest first.
    pub async fn list_for(&self, by: &str, offset: u64, limit: u64) -> AppResult<Vec<bookmark::Model>> {
        Bookmark::find()
            .filter(bookmark::Column::By.eq(by))
            .order_by_desc(bookmark::Column::Inserted)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
