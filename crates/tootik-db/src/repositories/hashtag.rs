//! Hashtag repository.

use std::sync::Arc;

use crate::entities::{hashtag, Hashtag};
use tootik_common::limits::POSTS_PER_PAGE;
use tootik_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect, Statement, DbBackend,
};

/// Hashtag repository for database operations.
#[derive(Clone)]
pub struct HashtagRepository {
    db: Arc<DatabaseConnection>,
}

impl HashtagRepository {
    /// Create a new hashtag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Record a hashtag link for a freshly created note.
    pub async fn create(&self, model: hashtag::ActiveModel) -> AppResult<hashtag::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Notes tagged with `hashtag`, newest first.
    pub async fn find_by_hashtag(&self, hashtag: &str, offset: u64) -> AppResult<Vec<hashtag::Model>> {
        Hashtag::find()
            .filter(hashtag::Column::Hashtag.eq(hashtag))
            .order_by_desc(hashtag::Column::Inserted)
            .offset(offset)
            .limit(POSTS_PER_PAGE as u64)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Whether `hashtag` appears on any note other than `exclude_note`,
    /// used to gate the per-post "Posts tagged #x" link on there actually
    /// being somewhere else to go.
    pub async fn has_other(&self, hashtag: &str, exclude_note: &str) -> AppResult<bool> {
        use sea_orm::{Condition, PaginatorTrait};

        let count = Hashtag::find()
            .filter(
                Condition::all()
                    .add(hashtag::Column::Hashtag.eq(hashtag))
                    .add(hashtag::Column::Note.ne(exclude_note)),
            )
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(count > 0)
    }

    /// The most-used hashtags in the trailing window, for the `hashtags`
    /// discovery page. Ranked by distinct-author count, which
    /// rewards breadth over a single prolific poster.
    pub async fn trending(&self, since_unix: i64, limit: u64) -> AppResult<Vec<(String, i64)>> {
        let sql = r"
            SELECT hashtag, COUNT(DISTINCT author) AS authors
            FROM hashtags
            WHERE inserted >= ?1
            GROUP BY hashtag
            ORDER BY authors DESC, hashtag ASC
            LIMIT ?2
        ";

        #[derive(sea_orm::FromQueryResult)]
        struct Row {
            hashtag: String,
            authors: i64,
        }

        let rows = Row::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            sql,
            [since_unix.into(), (limit as i64).into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(rows.into_iter().map(|r| (r.hashtag, r.authors)).collect())
    }
}
