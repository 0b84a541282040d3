//! Note repository.

use std::sync::Arc;

use crate::entities::{note, Note};
use tootik_common::limits::{POSTS_PER_PAGE, PUBLIC_URI};
use tootik_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbBackend, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Statement,
};

/// Note repository for database operations.
#[derive(Clone)]
pub struct NoteRepository {
    db: Arc<DatabaseConnection>,
}

impl NoteRepository {
    /// Create a new note repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a note by id.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<note::Model>> {
        Note::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Find a note by id, returning a not-found error otherwise.
    pub async fn get_by_id(&self, id: &str) -> AppResult<note::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("note".to_string()))
    }

    /// Create a new note.
    pub async fn create(&self, model: note::ActiveModel) -> AppResult<note::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Persist an edited note. Callers enforce the edit-is-owner-only rule.
    pub async fn update(&self, model: note::ActiveModel) -> AppResult<note::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Delete a note by id.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Note::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }

    /// Count notes an author has published since `since_unix`, used by the
    /// posting throttle.
    pub async fn count_since(&self, author: &str, since_unix: i64) -> AppResult<u64> {
        Note::find()
            .filter(
                Condition::all()
                    .add(note::Column::Author.eq(author))
                    .add(note::Column::Inserted.gte(since_unix)),
            )
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Direct replies to `note_id`, oldest first, for the `/view` reply page.
    pub async fn find_replies(
        &self,
        note_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<note::Model>> {
        Note::find()
            .filter(note::Column::InReplyTo.eq(note_id))
            .order_by_asc(note::Column::Inserted)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Number of direct replies to `note_id`, for the reply-count badge on
    /// a rendered post.
    pub async fn count_replies(&self, note_id: &str) -> AppResult<u64> {
        Note::find()
            .filter(note::Column::InReplyTo.eq(note_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Walk a note's ancestor chain up to `limit` hops using a recursive
    /// common table expression, returned root-first.
    pub async fn find_ancestors(&self, note_id: &str, limit: usize) -> AppResult<Vec<note::Model>> {
        let sql = r"
            WITH RECURSIVE ancestors AS (
                SELECT n.*, 0 AS depth
                FROM notes n
                WHERE n.id = (SELECT in_reply_to FROM notes WHERE id = ?1)

                UNION ALL

                SELECT n.*, a.depth + 1
                FROM notes n
                INNER JOIN ancestors a ON n.id = a.in_reply_to
                WHERE a.depth < ?2
            )
            SELECT
                id, author, object, object_type, in_reply_to, group_id,
                to0, to1, to2, cc0, cc1, cc2, public, host, inserted
            FROM ancestors
            ORDER BY depth DESC
        ";

        Note::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                sql,
                [note_id.into(), (limit as i64).into()],
            ))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// The local timeline: public, non-reply notes authored locally, newest
    /// first.
    pub async fn find_local(&self, offset: u64) -> AppResult<Vec<note::Model>> {
        Note::find()
            .filter(
                Condition::all()
                    .add(note::Column::Host.is_null())
                    .add(note::Column::Public.eq(true))
                    .add(note::Column::InReplyTo.is_null()),
            )
            .order_by_desc(note::Column::Inserted)
            .offset(offset)
            .limit(POSTS_PER_PAGE as u64)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// The federated timeline: all public, non-reply notes known locally
    /// (local or remote authors), newest first.
    pub async fn find_federated(&self, offset: u64) -> AppResult<Vec<note::Model>> {
        Note::find()
            .filter(
                Condition::all()
                    .add(note::Column::Public.eq(true))
                    .add(note::Column::InReplyTo.is_null()),
            )
            .order_by_desc(note::Column::Inserted)
            .offset(offset)
            .limit(POSTS_PER_PAGE as u64)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Notes by a single actor, newest first.
    pub async fn find_by_author(&self, author: &str, offset: u64) -> AppResult<Vec<note::Model>> {
        Note::find()
            .filter(note::Column::Author.eq(author))
            .order_by_desc(note::Column::Inserted)
            .offset(offset)
            .limit(POSTS_PER_PAGE as u64)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Notes authored by any of `authors`, newest first — the authenticated
    /// actor's home timeline.
    pub async fn find_by_authors(&self, authors: &[String], offset: u64) -> AppResult<Vec<note::Model>> {
        if authors.is_empty() {
            return Ok(vec![]);
        }
        Note::find()
            .filter(note::Column::Author.is_in(authors.to_vec()))
            .order_by_desc(note::Column::Inserted)
            .offset(offset)
            .limit(POSTS_PER_PAGE as u64)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Notes that address `actor` directly (in any of the first three `to`
    /// or `cc` slots), newest first.
    pub async fn find_mentioning(&self, actor: &str, offset: u64) -> AppResult<Vec<note::Model>> {
        Note::find()
            .filter(
                Condition::any()
                    .add(note::Column::To0.eq(actor))
                    .add(note::Column::To1.eq(actor))
                    .add(note::Column::To2.eq(actor))
                    .add(note::Column::Cc0.eq(actor))
                    .add(note::Column::Cc1.eq(actor))
                    .add(note::Column::Cc2.eq(actor)),
            )
            .order_by_desc(note::Column::Inserted)
            .offset(offset)
            .limit(POSTS_PER_PAGE as u64)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Whether `voter` has already replied to poll `poll_id` with a vote
    /// (a reply note authored by `voter`), used to gate the Vote link on a
    /// rendered poll to viewers who haven't answered yet.
    pub async fn has_voted(&self, poll_id: &str, voter: &str) -> AppResult<bool> {
        let count = Note::find()
            .filter(
                Condition::all()
                    .add(note::Column::InReplyTo.eq(poll_id))
                    .add(note::Column::Author.eq(voter)),
            )
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(count > 0)
    }

    /// Public notes whose content contains `term` (case-insensitive),
    /// newest first, for `/search` and `/fts`.
    pub async fn search(&self, term: &str, offset: u64) -> AppResult<Vec<note::Model>> {
        let needle = format!("%{}%", term.replace('%', "\\%").replace('_', "\\_"));
        Note::find()
            .filter(
                Condition::all()
                    .add(note::Column::Public.eq(true))
                    .add(
                        sea_orm::sea_query::Expr::cust_with_values(
                            "json_extract(object, '$.content') LIKE ? ESCAPE '\\'",
                            [needle],
                        ),
                    ),
            )
            .order_by_desc(note::Column::Inserted)
            .offset(offset)
            .limit(POSTS_PER_PAGE as u64)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Whether a note's audience includes the special public URI, checked
    /// directly rather than through the denormalized `public` column (used
    /// when rehydrating a note from a raw JSON scan fallback).
    #[must_use]
    pub fn object_is_public(object: &serde_json::Value) -> bool {
        let scan = |key: &str| {
            object
                .get(key)
                .and_then(|v| v.as_array())
                .is_some_and(|arr| arr.iter().any(|v| v.as_str() == Some(PUBLIC_URI)))
        };
        scan("to") || scan("cc")
    }
}
