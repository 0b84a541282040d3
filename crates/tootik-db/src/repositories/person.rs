//! Actor repository.

use std::sync::Arc;

use crate::entities::{person, Person};
use tootik_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
};

/// Actor repository for database operations.
#[derive(Clone)]
pub struct PersonRepository {
    db: Arc<DatabaseConnection>,
}

impl PersonRepository {
    /// Create a new actor repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an actor by id.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<person::Model>> {
        Person::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Find an actor by id, returning a not-found error otherwise.
    pub async fn get_by_id(&self, id: &str) -> AppResult<person::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("actor".to_string()))
    }

    /// Find a local actor by its preferred username.
    pub async fn find_local_by_username(&self, username: &str) -> AppResult<Option<person::Model>> {
        Person::find()
            .filter(
                Condition::all()
                    .add(person::Column::PreferredUsername.eq(username))
                    .add(person::Column::Host.is_null()),
            )
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Find an already-known actor by username and host (`None` for a local
    /// actor), for resolving a `@user[@host]` mention against actors already
    /// on file without a network round trip.
    pub async fn find_by_username_and_host(
        &self,
        username: &str,
        host: Option<&str>,
    ) -> AppResult<Option<person::Model>> {
        let mut cond = Condition::all().add(person::Column::PreferredUsername.eq(username));
        cond = match host {
            Some(h) => cond.add(person::Column::Host.eq(h)),
            None => cond.add(person::Column::Host.is_null()),
        };
        Person::find()
            .filter(cond)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Find actors by their ids, preserving no particular order.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<person::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        Person::find()
            .filter(person::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Create a new actor.
    pub async fn create(&self, model: person::ActiveModel) -> AppResult<person::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Persist an updated actor. Callers are responsible for the
    /// `MinActorEditInterval`/monotonic-`updated` invariant;
    /// this method performs no such check.
    pub async fn update(&self, model: person::ActiveModel) -> AppResult<person::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Count followers of `actor` with `accepted = true` whose own host is
    /// local (used by hashtag-discovery ranking).
    pub async fn count_local_followers(&self, actor: &str) -> AppResult<u64> {
        use crate::entities::{follow, Follow};
        use sea_orm::PaginatorTrait;

        Follow::find()
            .filter(
                Condition::all()
                    .add(follow::Column::Followed.eq(actor))
                    .add(follow::Column::Accepted.eq(true)),
            )
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
