//! Shared application state: one instance built at startup and cloned
//! cheaply (every field is an `Arc` or a thin wrapper around one) into
//! every request.

use std::sync::Arc;

use tootik_common::{AppError, AppResult, Config, IdGenerator};
use tootik_core::cache::CacheMap;
use tootik_core::collab::{ActorKeys, Inbox, Resolver};
use tootik_core::visibility::ViewerContext;
use tootik_db::entities::note;
use tootik_db::repositories::{
    BookmarkRepository, CertificateRepository, FollowRepository, HashtagRepository,
    InviteRepository, NoteRepository, OutboxRepository, PersonRepository, ShareRepository,
    SigningKeyRepository,
};

/// The dispatcher's handle onto the database and the federation
/// collaborators, threaded into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub persons: PersonRepository,
    pub notes: NoteRepository,
    pub follows: FollowRepository,
    pub shares: ShareRepository,
    pub bookmarks: BookmarkRepository,
    pub hashtags: HashtagRepository,
    pub outbox: OutboxRepository,
    pub certificates: CertificateRepository,
    pub invites: InviteRepository,
    pub keys: SigningKeyRepository,
    pub cache: CacheMap,
    pub inbox: Arc<dyn Inbox>,
    pub resolver: Arc<dyn Resolver>,
    pub ids: IdGenerator,
}

impl AppState {
    /// This instance's public domain, used to build ids and absolute URLs.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.config.server.domain
    }

    /// The actor id of the well-known `Public` audience URI.
    #[must_use]
    pub fn local_actor_id(&self, username: &str) -> String {
        format!("https://{}/users/{username}", self.domain())
    }

    /// Loads the signing key registered to `actor_id`, used to authenticate
    /// the actor to the `Inbox` collaborator for every outbound activity.
    pub async fn actor_keys(&self, actor_id: &str) -> AppResult<ActorKeys> {
        let key = self
            .keys
            .find_for(actor_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("no signing key for {actor_id}")))?;
        Ok(ActorKeys {
            actor_id: actor_id.to_string(),
            private_key_pem: key.private_key_pem,
        })
    }

    /// Loads the per-request data `can_view`'s clause 4 needs: the
    /// followers-collection URLs of actors `viewer` follows with an
    /// accepted relationship, plus which of `notes` were reshared into one
    /// of those followed actors' group audience.
    pub async fn viewer_context(
        &self,
        viewer: Option<&str>,
        notes: &[&note::Model],
    ) -> AppResult<ViewerContext> {
        let Some(viewer) = viewer else {
            return Ok(ViewerContext::default());
        };

        let followees = self.follows.accepted_followees(viewer).await?;
        if followees.is_empty() {
            return Ok(ViewerContext::default());
        }

        let actors = self.persons.find_by_ids(&followees).await?;
        let followed_followers_urls = actors
            .into_iter()
            .filter_map(|a| a.followers_collection_url)
            .collect();
        let followed_group_shares = notes
            .iter()
            .filter(|n| n.group_id.as_deref().is_some_and(|g| followees.iter().any(|f| f == g)))
            .map(|n| n.id.clone())
            .collect();

        Ok(ViewerContext {
            followed_followers_urls,
            followed_group_shares,
        })
    }
}
