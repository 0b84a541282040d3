//! Follow entity. One pending/accepted row per
//! `(follower, followed)` pair.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub follower: String,

    #[sea_orm(indexed)]
    pub followed: String,

    /// `None` = pending, `Some(false)` = rejected (row kept briefly for
    /// idempotent re-delivery), `Some(true)` = accepted.
    #[sea_orm(nullable)]
    pub accepted: Option<bool>,

    pub inserted: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::Follower",
        to = "super::person::Column::Id"
    )]
    Follower,

    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::Followed",
        to = "super::person::Column::Id"
    )]
    Followed,
}

impl ActiveModelBehavior for ActiveModel {}
