//! Bookmark entity. Unique per `(by, note)`; count per user
//! bounded by `MaxBookmarksPerUser`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookmarks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub by: String,

    #[sea_orm(indexed)]
    pub note: String,

    pub inserted: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::By",
        to = "super::person::Column::Id"
    )]
    Owner,

    #[sea_orm(
        belongs_to = "super::note::Entity",
        from = "Column::Note",
        to = "super::note::Column::Id"
    )]
    Note,
}

impl ActiveModelBehavior for ActiveModel {}
