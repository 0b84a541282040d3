//! Note entity (`notes` table).
//!
//! `object` carries the full ActivityPub document (type, content, name,
//! summary, sensitive flag, poll fields, …); the remaining columns are a
//! denormalization of the parts the audience predicate and feed ordering
//! need to query without parsing JSON on every row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The ActivityPub object type a note's `object` JSON carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ObjectType {
    #[sea_orm(string_value = "Note")]
    Note,
    #[sea_orm(string_value = "Page")]
    Page,
    #[sea_orm(string_value = "Article")]
    Article,
    #[sea_orm(string_value = "Question")]
    Question,
}

impl ObjectType {
    /// Whether `showFeedPage` should render a row of this type at all.
    #[must_use]
    pub const fn is_renderable(self) -> bool {
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notes")]
pub struct Model {
    /// Stable note id (a URL, e.g. `https://example.com/post/<hash>`).
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author actor id.
    #[sea_orm(indexed)]
    pub author: String,

    /// The full ActivityPub object, opaque to everything except the
    /// audience-predicate JSON-scan fallback and the renderer.
    #[sea_orm(column_type = "JsonBinary")]
    pub object: Json,

    /// Type carried by `object`, denormalized for cheap filtering.
    pub object_type: ObjectType,

    /// Parent note id, if this is a reply.
    #[sea_orm(nullable, indexed)]
    pub in_reply_to: Option<String>,

    /// Group actor id this note was reshared into, if any.
    #[sea_orm(nullable, indexed)]
    pub group_id: Option<String>,

    /// First three `to` addressees, denormalized.
    #[sea_orm(nullable)]
    pub to0: Option<String>,
    #[sea_orm(nullable)]
    pub to1: Option<String>,
    #[sea_orm(nullable)]
    pub to2: Option<String>,

    /// First three `cc` addressees, denormalized.
    #[sea_orm(nullable)]
    pub cc0: Option<String>,
    #[sea_orm(nullable)]
    pub cc1: Option<String>,
    #[sea_orm(nullable)]
    pub cc2: Option<String>,

    /// Whether the special Public URI is present in `to` or `cc`.
    pub public: bool,

    /// Author's host; `None` for local authors.
    #[sea_orm(nullable, indexed)]
    pub host: Option<String>,

    /// Unix-seconds insertion time, used for pagination ordering.
    #[sea_orm(indexed)]
    pub inserted: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::Author",
        to = "super::person::Column::Id"
    )]
    Author,

    #[sea_orm(belongs_to = "Entity", from = "Column::InReplyTo", to = "Column::Id")]
    Parent,
}

impl Related<super::person::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The note's `to` addressees with `None` slots dropped.
    #[must_use]
    pub fn to(&self) -> Vec<&str> {
        [self.to0.as_deref(), self.to1.as_deref(), self.to2.as_deref()]
            .into_iter()
            .flatten()
            .collect()
    }

    /// The note's `cc` addressees with `None` slots dropped.
    #[must_use]
    pub fn cc(&self) -> Vec<&str> {
        [self.cc0.as_deref(), self.cc1.as_deref(), self.cc2.as_deref()]
            .into_iter()
            .flatten()
            .collect()
    }

    /// The union of `to` and `cc` (the union tootik calls a note's "audience").
    #[must_use]
    pub fn audience(&self) -> Vec<&str> {
        let mut v = self.to();
        v.extend(self.cc());
        v
    }

    /// Whether the denormalized `to2`/`cc2` slots are full, meaning a
    /// viewer-recipient check must fall back to scanning `object` directly.
    #[must_use]
    pub const fn needs_json_scan_fallback(&self) -> bool {
        self.to2.is_some() || self.cc2.is_some()
    }
}
