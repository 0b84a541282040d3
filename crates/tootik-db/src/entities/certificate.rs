//! Certificate entity. Many certificates per local user.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certificates")]
pub struct Model {
    /// SHA-256 hex digest of the client certificate's DER bytes.
    #[sea_orm(primary_key, auto_increment = false)]
    pub hash: String,

    /// Local username this certificate is registered to.
    #[sea_orm(indexed)]
    pub user: String,

    pub inserted: i64,

    /// Unix-seconds deadline after which an unapproved certificate is
    /// treated as rejected (`CertificateApprovalTimeout`).
    pub expires: i64,

    pub approved: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::User",
        to = "super::person::Column::Id"
    )]
    Owner,
}

impl ActiveModelBehavior for ActiveModel {}
