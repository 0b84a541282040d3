//! The frontend crate: request dispatch, feed and post rendering, the
//! write-side gate, and the route table tying them together.

pub mod dispatch;
pub mod feed;
pub mod handlers;
pub mod post;
pub mod state;
pub mod write;

use std::sync::Arc;

use tootik_common::limits::{CACHE_UPDATE_TIMEOUT, DEFAULT_CACHE_TTL};

use dispatch::{Dispatcher, Route, WithCache, WithUserMenu};

/// Builds the full ordered route table. The first pattern that fully
/// matches a request path wins; `Dispatcher::handle` falls back to `/oops`
/// (or `/users/oops`) when nothing matches.
#[must_use]
pub fn routes() -> Dispatcher {
    let cached = |handler: Arc<dyn dispatch::Handler>| -> Arc<dyn dispatch::Handler> {
        Arc::new(WithCache {
            inner: Arc::new(WithUserMenu(handler)),
            ttl: DEFAULT_CACHE_TTL,
            update_timeout: CACHE_UPDATE_TIMEOUT,
        })
    };
    let menu = |handler: Arc<dyn dispatch::Handler>| -> Arc<dyn dispatch::Handler> {
        Arc::new(WithUserMenu(handler))
    };

    let routes = vec![
        Route::new(r"^/$", cached(Arc::new(handlers::feeds::Local))),
        Route::new(r"^/local$", cached(Arc::new(handlers::feeds::Local))),
        Route::new(r"^/federated$", cached(Arc::new(handlers::feeds::Federated))),
        Route::new(r"^/users$", menu(Arc::new(handlers::feeds::UserHome))),
        Route::new(r"^/login$", menu(Arc::new(handlers::feeds::UserHome))),
        Route::new(r"^/users/mentions$", menu(Arc::new(handlers::feeds::Mentions))),
        Route::new(r"^/users/bookmarks$", menu(Arc::new(handlers::feeds::Bookmarks))),
        Route::new(r"^/users/follows$", menu(Arc::new(handlers::follows::Follows))),
        Route::new(r"^/users/followers$", menu(Arc::new(handlers::follows::Followers))),
        Route::new(r"^/users/outbox$", menu(Arc::new(handlers::misc::OutboxSelf))),
        // Not cached: each of these folds viewer identity (mutual follows,
        // bookmark ownership, audience) into what gets rendered, and
        // `WithCache` keys solely on path — caching them would replay one
        // viewer's private content to the next requester of the same URL.
        Route::new(r"^/users/outbox/(.+)$", menu(Arc::new(handlers::feeds::UserOutbox))),
        Route::new(r"^/hashtag/(.+)$", menu(Arc::new(handlers::feeds::Hashtag))),
        Route::new(r"^/hashtags$", menu(Arc::new(handlers::feeds::Hashtags))),
        Route::new(r"^/view/(.+)$", menu(Arc::new(handlers::view::View))),
        Route::new(r"^/resolve$", menu(Arc::new(handlers::misc::Resolve))),
        Route::new(r"^/search$", menu(Arc::new(handlers::misc::Search))),
        Route::new(r"^/fts$", menu(Arc::new(handlers::misc::Search))),
        Route::new(r"^/status$", menu(Arc::new(handlers::misc::Status))),
        Route::new(r"^/help$", menu(Arc::new(handlers::misc::Help))),
        Route::new(r"^/robots\.txt$", Arc::new(handlers::misc::Robots)),
        Route::new(r"^/users/say$", menu(Arc::new(write::Say))),
        Route::new(r"^/users/whisper$", menu(Arc::new(write::Whisper))),
        Route::new(r"^/users/dm$", menu(Arc::new(write::Dm))),
        Route::new(r"^/users/reply/(.+)$", menu(Arc::new(write::Reply))),
        Route::new(r"^/users/edit/(.+)$", menu(Arc::new(write::Edit))),
        Route::new(r"^/users/delete/(.+)$", menu(Arc::new(write::Delete))),
        Route::new(r"^/users/share/(.+)$", menu(Arc::new(write::Share))),
        Route::new(r"^/users/unshare/(.+)$", menu(Arc::new(write::Unshare))),
        Route::new(r"^/users/bookmark/(.+)$", menu(Arc::new(write::Bookmark))),
        Route::new(r"^/users/unbookmark/(.+)$", menu(Arc::new(write::Unbookmark))),
        Route::new(r"^/users/follow/(.+)$", menu(Arc::new(write::Follow))),
        Route::new(r"^/users/unfollow/(.+)$", menu(Arc::new(write::Unfollow))),
        Route::new(r"^/users/accept/(.+)$", menu(Arc::new(write::Accept))),
        Route::new(r"^/users/reject/(.+)$", menu(Arc::new(write::Reject))),
        // Titan upload counterparts of the routes above: same handlers, the
        // larger body arrives via `ctx.raw_query` with `ctx.titan` set and
        // `take_input` validating the upload's declared size/mime.
        Route::new(r"^/users/upload/say$", menu(Arc::new(write::Say))),
        Route::new(r"^/users/upload/whisper$", menu(Arc::new(write::Whisper))),
        Route::new(r"^/users/upload/dm$", menu(Arc::new(write::Dm))),
        Route::new(r"^/users/upload/reply/(.+)$", menu(Arc::new(write::Reply))),
        Route::new(r"^/users/upload/edit/(.+)$", menu(Arc::new(write::Edit))),
        Route::new(r"^/users/upload/avatar$", menu(Arc::new(handlers::account::Avatar))),
        Route::new(r"^/users/upload/bio$", menu(Arc::new(handlers::account::Bio))),
        Route::new(r"^/users/register$", menu(Arc::new(handlers::account::Register))),
        Route::new(r"^/users/bio$", menu(Arc::new(handlers::account::Bio))),
        Route::new(r"^/users/avatar$", menu(Arc::new(handlers::account::Avatar))),
        Route::new(r"^/users/name$", menu(Arc::new(handlers::account::Name))),
        Route::new(r"^/users/alias$", menu(Arc::new(handlers::account::Alias))),
        Route::new(r"^/users/move$", menu(Arc::new(handlers::account::Move))),
        Route::new(r"^/users/metadata$", menu(Arc::new(handlers::account::Metadata))),
        Route::new(r"^/users/metadata/add$", menu(Arc::new(handlers::account::MetadataAdd))),
        Route::new(r"^/users/metadata/remove$", menu(Arc::new(handlers::account::MetadataRemove))),
        Route::new(r"^/users/metadata/clear$", menu(Arc::new(handlers::account::MetadataClear))),
        Route::new(r"^/users/ttl$", menu(Arc::new(handlers::account::Ttl))),
        Route::new(r"^/users/certificates$", menu(Arc::new(handlers::account::Certificates))),
        Route::new(
            r"^/users/certificates/approve/(.+)$",
            menu(Arc::new(handlers::account::CertificatesApprove)),
        ),
        Route::new(
            r"^/users/certificates/revoke/(.+)$",
            menu(Arc::new(handlers::account::CertificatesRevoke)),
        ),
        Route::new(r"^/users/export$", menu(Arc::new(handlers::account::Export))),
        Route::new(r"^/users/settings$", menu(Arc::new(handlers::account::Settings))),
    ];

    Dispatcher::new(routes)
}
