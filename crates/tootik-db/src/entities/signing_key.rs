//! Per-actor signing key entity (`signing_keys` table). Kept separate from
//! `persons` so the key material never rides along with an actor row that
//! gets read, hydrated and serialized on every feed request.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "signing_keys")]
pub struct Model {
    /// Actor id this key belongs to.
    #[sea_orm(primary_key, auto_increment = false)]
    pub actor: String,

    #[sea_orm(column_type = "Text")]
    pub private_key_pem: String,

    #[sea_orm(column_type = "Text")]
    pub public_key_pem: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::Actor",
        to = "super::person::Column::Id"
    )]
    Owner,
}

impl ActiveModelBehavior for ActiveModel {}
