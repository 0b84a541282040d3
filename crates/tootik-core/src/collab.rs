//! Collaborator interfaces the core consumes but does not implement: the
//! ActivityPub federation layer (inbox delivery, remote-actor resolution)
//! and the text-protocol line-format writers. Production wiring lives
//! outside this workspace; `#[cfg(test)]` doubles exercise the frontend
//! against these traits.

use tokio_util::sync::CancellationToken;
use tootik_common::AppResult;

/// A resolved actor, as handed back by a `Resolver` or read from `tootik-db`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub preferred_username: String,
    pub host: Option<String>,
    pub display_name: Option<String>,
    pub followers_collection_url: Option<String>,
}

impl Actor {
    /// Whether this actor is hosted on this instance.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.host.is_none()
    }
}

/// The signing identity of a locally authenticated actor, threaded through
/// to the federation collaborator so it can sign outbound activities.
#[derive(Debug, Clone)]
pub struct ActorKeys {
    pub actor_id: String,
    pub private_key_pem: String,
}

/// Per-request ambient state: the authenticated viewer (if any), a
/// cancellation token scoped to the connection's deadline, and the request
/// path as received (used for cache keys and redirects).
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub path: String,
    /// The percent-decoded query/input portion of the request line, used
    /// both for pagination offsets and as the primary input channel for
    /// write handlers that didn't arrive over titan.
    pub raw_query: String,
    pub viewer: Option<Actor>,
    pub cancellation: CancellationToken,
    /// Whether this request arrived over the titan upload transport rather
    /// than a plain Gemini/Gopher/Finger read, so redirects must carry an
    /// explicit `gemini://` scheme back onto the read side.
    pub titan: bool,
    /// The `size=N` titan URL parameter, when `titan` is set.
    pub titan_size: Option<u64>,
    /// The `mime=…` titan URL parameter, when `titan` is set.
    pub titan_mime: Option<String>,
    /// DER bytes of the client certificate presented for this connection,
    /// used by `/users/register` to derive a certificate hash; absent when
    /// the transport didn't require one.
    pub client_cert_der: Option<Vec<u8>>,
    /// Common Name of the presented client certificate, used as the
    /// proposed username on `/users/register`.
    pub client_cert_cn: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn new(path: impl Into<String>, viewer: Option<Actor>) -> Self {
        Self {
            path: path.into(),
            raw_query: String::new(),
            viewer,
            cancellation: CancellationToken::new(),
            titan: false,
            titan_size: None,
            titan_mime: None,
            client_cert_der: None,
            client_cert_cn: None,
        }
    }

    #[must_use]
    pub fn with_query(mut self, raw_query: impl Into<String>) -> Self {
        self.raw_query = raw_query.into();
        self
    }

    #[must_use]
    pub fn titan(mut self, titan: bool) -> Self {
        self.titan = titan;
        self
    }

    /// Attaches the `;size=N;mime=…` parameters parsed from a titan upload
    /// URL; implies `titan(true)`.
    #[must_use]
    pub fn titan_upload(mut self, size: u64, mime: impl Into<String>) -> Self {
        self.titan = true;
        self.titan_size = Some(size);
        self.titan_mime = Some(mime.into());
        self
    }

    /// Attaches the presented client certificate's DER bytes and Common
    /// Name, for `/users/register` to consume.
    #[must_use]
    pub fn client_cert(mut self, der: Vec<u8>, cn: impl Into<String>) -> Self {
        self.client_cert_der = Some(der);
        self.client_cert_cn = Some(cn.into());
        self
    }

    /// A detached token for work that must outlive this request's
    /// cancellation (the cache-refresh task).
    #[must_use]
    pub fn detached(&self) -> CancellationToken {
        CancellationToken::new()
    }
}

/// The federation inbox: every activity a write-side handler enqueues goes
/// through one of these methods, inside the caller's transaction.
#[async_trait::async_trait]
pub trait Inbox: Send + Sync {
    async fn create(
        &self,
        ctx: &RequestContext,
        actor: &ActorKeys,
        object: serde_json::Value,
    ) -> AppResult<()>;

    async fn update_note(
        &self,
        ctx: &RequestContext,
        actor: &ActorKeys,
        object: serde_json::Value,
    ) -> AppResult<()>;

    async fn update_actor(&self, ctx: &RequestContext, actor: &ActorKeys) -> AppResult<()>;

    async fn announce(&self, ctx: &RequestContext, actor: &ActorKeys, note_id: &str)
        -> AppResult<()>;

    async fn follow(&self, ctx: &RequestContext, actor: &ActorKeys, target: &str) -> AppResult<()>;

    async fn accept(
        &self,
        ctx: &RequestContext,
        actor: &ActorKeys,
        follow_id: &str,
    ) -> AppResult<()>;

    async fn undo(&self, ctx: &RequestContext, actor: &ActorKeys, object_id: &str) -> AppResult<()>;

    async fn delete(&self, ctx: &RequestContext, actor: &ActorKeys, note_id: &str) -> AppResult<()>;
}

/// Remote actor discovery, used by `/resolve` and mention resolution.
#[async_trait::async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, ctx: &RequestContext, actor_id: &str) -> AppResult<Actor>;
}

#[cfg(test)]
pub mod test_doubles {
    use super::{Actor, ActorKeys, Inbox, RequestContext, Resolver};
    use std::sync::Mutex;
    use tootik_common::{AppError, AppResult};

    /// Records every call it receives; never fails unless `fail_next` is set.
    #[derive(Default)]
    pub struct RecordingInbox {
        pub calls: Mutex<Vec<String>>,
        pub fail_next: Mutex<bool>,
    }

    impl RecordingInbox {
        fn record(&self, call: impl Into<String>) -> AppResult<()> {
            self.calls.lock().expect("lock poisoned").push(call.into());
            let mut fail = self.fail_next.lock().expect("lock poisoned");
            if *fail {
                *fail = false;
                return Err(AppError::QueueFull);
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl Inbox for RecordingInbox {
        async fn create(
            &self,
            _ctx: &RequestContext,
            _actor: &ActorKeys,
            _object: serde_json::Value,
        ) -> AppResult<()> {
            self.record("create")
        }

        async fn update_note(
            &self,
            _ctx: &RequestContext,
            _actor: &ActorKeys,
            _object: serde_json::Value,
        ) -> AppResult<()> {
            self.record("update_note")
        }

        async fn update_actor(&self, _ctx: &RequestContext, _actor: &ActorKeys) -> AppResult<()> {
            self.record("update_actor")
        }

        async fn announce(
            &self,
            _ctx: &RequestContext,
            _actor: &ActorKeys,
            _note_id: &str,
        ) -> AppResult<()> {
            self.record("announce")
        }

        async fn follow(
            &self,
            _ctx: &RequestContext,
            _actor: &ActorKeys,
            _target: &str,
        ) -> AppResult<()> {
            self.record("follow")
        }

        async fn accept(
            &self,
            _ctx: &RequestContext,
            _actor: &ActorKeys,
            _follow_id: &str,
        ) -> AppResult<()> {
            self.record("accept")
        }

        async fn undo(
            &self,
            _ctx: &RequestContext,
            _actor: &ActorKeys,
            _object_id: &str,
        ) -> AppResult<()> {
            self.record("undo")
        }

        async fn delete(
            &self,
            _ctx: &RequestContext,
            _actor: &ActorKeys,
            _note_id: &str,
        ) -> AppResult<()> {
            self.record("delete")
        }
    }

    /// Resolves to a fixed remote actor regardless of the id requested.
    pub struct FixedResolver(pub Actor);

    #[async_trait::async_trait]
    impl Resolver for FixedResolver {
        async fn resolve(&self, _ctx: &RequestContext, _actor_id: &str) -> AppResult<Actor> {
            Ok(self.0.clone())
        }
    }
}
