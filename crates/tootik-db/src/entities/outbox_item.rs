//! OutboxItem entity. Used only to count a user's posting rate;
//! delivery draining is an external collaborator's concern.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The ActivityPub activity kind an outbox row carries, denormalized so the
/// throttle queries don't need to parse `activity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ActivityKind {
    #[sea_orm(string_value = "Create")]
    Create,
    #[sea_orm(string_value = "Update")]
    Update,
    #[sea_orm(string_value = "Delete")]
    Delete,
    #[sea_orm(string_value = "Announce")]
    Announce,
    #[sea_orm(string_value = "Undo")]
    Undo,
    #[sea_orm(string_value = "Follow")]
    Follow,
    #[sea_orm(string_value = "Accept")]
    Accept,
    #[sea_orm(string_value = "Reject")]
    Reject,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "outbox")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub kind: ActivityKind,

    /// The full activity JSON, opaque to the core.
    #[sea_orm(column_type = "JsonBinary")]
    pub activity: Json,

    #[sea_orm(indexed)]
    pub sender: String,

    pub sent: bool,

    pub attempts: i32,

    #[sea_orm(indexed)]
    pub inserted: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::Sender",
        to = "super::person::Column::Id"
    )]
    Sender,
}

impl ActiveModelBehavior for ActiveModel {}
