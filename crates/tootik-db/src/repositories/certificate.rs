//! Client certificate repository.

use std::sync::Arc;

use crate::entities::{certificate, Certificate};
use tootik_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

/// Certificate repository for database operations.
#[derive(Clone)]
pub struct CertificateRepository {
    db: Arc<DatabaseConnection>,
}

impl CertificateRepository {
    /// Create a new certificate repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a certificate by its SHA-256 hash.
    pub async fn find_by_hash(&self, hash: &str) -> AppResult<Option<certificate::Model>> {
        Certificate::find_by_id(hash)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// All certificates registered to a local user.
    pub async fn find_by_user(&self, user: &str) -> AppResult<Vec<certificate::Model>> {
        Certificate::find()
            .filter(certificate::Column::User.eq(user))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Register a new certificate.
    pub async fn create(&self, model: certificate::ActiveModel) -> AppResult<certificate::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Mark a certificate approved, or update its expiry.
    pub async fn update(&self, model: certificate::ActiveModel) -> AppResult<certificate::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Revoke (delete) a certificate.
    pub async fn delete(&self, hash: &str) -> AppResult<()> {
        Certificate::delete_by_id(hash)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }
}
