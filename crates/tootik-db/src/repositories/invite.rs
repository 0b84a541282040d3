//! Invite repository.

use std::sync::Arc;

use crate::entities::{invite, Invite};
use tootik_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

/// Invite repository for database operations.
#[derive(Clone)]
pub struct InviteRepository {
    db: Arc<DatabaseConnection>,
}

impl InviteRepository {
    /// Create a new invite repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an invite by its code.
    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<invite::Model>> {
        Invite::find_by_id(code)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Number of invites issued by `inviter`, checked against
    /// `MaxInvitationsPerUser`.
    pub async fn count_by_inviter(&self, inviter: &str) -> AppResult<u64> {
        Invite::find()
            .filter(invite::Column::Inviter.eq(inviter))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Issue a new invite code.
    pub async fn create(&self, model: invite::ActiveModel) -> AppResult<invite::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Mark an invite consumed by a newly registered user/certificate.
    pub async fn update(&self, model: invite::ActiveModel) -> AppResult<invite::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
