//! Follow repository.

use std::sync::Arc;

use crate::entities::{follow, Follow};
use tootik_common::limits::POSTS_PER_PAGE;
use tootik_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the follow row between `follower` and `followed`, if any.
    pub async fn find(&self, follower: &str, followed: &str) -> AppResult<Option<follow::Model>> {
        Follow::find()
            .filter(
                Condition::all()
                    .add(follow::Column::Follower.eq(follower))
                    .add(follow::Column::Followed.eq(followed)),
            )
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Find a follow row by its activity id.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<follow::Model>> {
        Follow::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Create a new (pending) follow request.
    pub async fn create(&self, model: follow::ActiveModel) -> AppResult<follow::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Persist an accepted/rejected follow state.
    pub async fn update(&self, model: follow::ActiveModel) -> AppResult<follow::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Remove a follow row (unfollow, or reject-and-forget).
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Follow::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }

    /// Ids of actors `actor` follows with an accepted relationship.
    pub async fn accepted_followees(&self, actor: &str) -> AppResult<Vec<String>> {
        let rows = Follow::find()
            .filter(
                Condition::all()
                    .add(follow::Column::Follower.eq(actor))
                    .add(follow::Column::Accepted.eq(true)),
            )
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(rows.into_iter().map(|r| r.followed).collect())
    }

    /// Actors `actor` follows (any state), newest first, for `/users/follows`.
    pub async fn followees(&self, actor: &str, offset: u64) -> AppResult<Vec<follow::Model>> {
        Follow::find()
            .filter(follow::Column::Follower.eq(actor))
            .order_by_desc(follow::Column::Inserted)
            .offset(offset)
            .limit(POSTS_PER_PAGE as u64)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Actors following `actor` (any state), newest first, for
    /// `/users/followers`.
    pub async fn followers(&self, actor: &str, offset: u64) -> AppResult<Vec<follow::Model>> {
        Follow::find()
            .filter(follow::Column::Followed.eq(actor))
            .order_by_desc(follow::Column::Inserted)
            .offset(offset)
            .limit(POSTS_PER_PAGE as u64)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
