//! Hashtag link entity (`hashtags` table). One row per
//! `(hashtag, note)` pair; `author`/`inserted` are denormalized from the
//! note so the `/hashtag` and `/hashtags` handlers can rank without a join
//! back to `notes` for every candidate row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hashtags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i64,

    /// Lowercased hashtag text, without the leading `#`.
    #[sea_orm(indexed)]
    pub hashtag: String,

    #[sea_orm(indexed)]
    pub note: String,

    pub author: String,

    pub inserted: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::note::Entity",
        from = "Column::Note",
        to = "super::note::Column::Id"
    )]
    Note,

    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::Author",
        to = "super::person::Column::Id"
    )]
    Author,
}

impl ActiveModelBehavior for ActiveModel {}
