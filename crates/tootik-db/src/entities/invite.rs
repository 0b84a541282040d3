//! Invite entity. Per-inviter quota is enforced by the service
//! layer against `MaxInvitationsPerUser`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invites")]
pub struct Model {
    /// UUID invite code.
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,

    #[sea_orm(indexed)]
    pub inviter: String,

    /// Local username that registered with this invite, once consumed.
    #[sea_orm(nullable)]
    pub invited: Option<String>,

    /// Certificate hash that redeemed this invite, once consumed.
    #[sea_orm(nullable)]
    pub certhash: Option<String>,

    pub inserted: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::Inviter",
        to = "super::person::Column::Id"
    )]
    Inviter,
}

impl ActiveModelBehavior for ActiveModel {}
