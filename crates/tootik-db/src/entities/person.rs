//! Actor entity (`persons` table).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The kind of ActivityPub actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ActorType {
    #[sea_orm(string_value = "Person")]
    Person,
    #[sea_orm(string_value = "Group")]
    Group,
    #[sea_orm(string_value = "Service")]
    Service,
    #[sea_orm(string_value = "Application")]
    Application,
    #[sea_orm(string_value = "Organization")]
    Organization,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "persons")]
pub struct Model {
    /// Stable ActivityPub actor id (a URL).
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Local username part of the actor id, e.g. `alice`.
    pub preferred_username: String,

    /// Host the actor belongs to; `None` for local actors.
    #[sea_orm(nullable, indexed)]
    pub host: Option<String>,

    /// Synthesized or remote-supplied display name.
    #[sea_orm(nullable)]
    pub display_name: Option<String>,

    /// Bio / profile summary, stored as submitted (not yet HTML-escaped).
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,

    /// Avatar icon URL.
    #[sea_orm(nullable)]
    pub icon_url: Option<String>,

    /// Key/value profile metadata fields,
    /// capped at `MaxMetadataFields` entries by the service layer.
    #[sea_orm(column_type = "JsonBinary")]
    pub attachments: Json,

    /// Actor kind.
    pub actor_type: ActorType,

    /// URL of this actor's followers collection.
    #[sea_orm(nullable)]
    pub followers_collection_url: Option<String>,

    /// Optional TTL (in days) after which this actor's own notes expire.
    #[sea_orm(nullable)]
    pub ttl_days: Option<i32>,

    /// Target actor id if this account has been moved (Move activity).
    #[sea_orm(nullable)]
    pub moved_to: Option<String>,

    /// Actor ids this actor has also been known as (`alsoKnownAs`),
    /// populated by `/users/alias` ahead of a `moved_to` switchover.
    #[sea_orm(column_type = "JsonBinary")]
    pub also_known_as: Json,

    pub published: DateTimeUtc,

    /// Strictly increasing; must advance by at least `MinActorEditInterval`
    /// past the previous value on every profile-edit commit.
    pub updated: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::note::Entity")]
    Note,
}

impl Related<super::note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Note.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this actor was created by this instance.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.host.is_none()
    }
}
