//! Signing-key repository.

use std::sync::Arc;

use crate::entities::{signing_key, SigningKey};
use tootik_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};

/// Signing-key repository for database operations.
#[derive(Clone)]
pub struct SigningKeyRepository {
    db: Arc<DatabaseConnection>,
}

impl SigningKeyRepository {
    /// Create a new signing-key repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The signing key registered to `actor`, if any.
    pub async fn find_for(&self, actor: &str) -> AppResult<Option<signing_key::Model>> {
        SigningKey::find_by_id(actor)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Register a new actor's signing key.
    pub async fn create(&self, model: signing_key::ActiveModel) -> AppResult<signing_key::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
