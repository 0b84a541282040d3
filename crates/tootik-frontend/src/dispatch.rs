//! Request dispatch: an ordered regex route table, the response-cache and
//! user-menu decorators, and the `/oops` fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use tootik_common::{AppError, AppResult, Writer};
use tootik_common::text_writer::BufferWriter;
use tootik_core::collab::RequestContext;

use crate::state::AppState;

/// One route handler. Implementations are registered once at startup and
/// invoked for every request whose path matches the owning route's pattern.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(
        &self,
        state: &AppState,
        ctx: &RequestContext,
        params: &[String],
        writer: &mut dyn Writer,
    ) -> AppResult<()>;
}

/// Wraps a free async function as a [`Handler`], so route tables can be
/// built from plain functions instead of one unit struct per route.
macro_rules! handler_fn {
    ($name:ident, $f:path) => {
        #[doc(hidden)]
        pub struct $name;

        #[async_trait::async_trait]
        impl $crate::dispatch::Handler for $name {
            async fn call(
                &self,
                state: &$crate::state::AppState,
                ctx: &tootik_core::collab::RequestContext,
                params: &[String],
                writer: &mut dyn tootik_common::Writer,
            ) -> tootik_common::AppResult<()> {
                $f(state, ctx, params, writer).await
            }
        }
    };
}
pub(crate) use handler_fn;

/// Appends the standard user-menu footer after the wrapped handler runs.
/// The authenticated and anonymous link sets differ.
pub struct WithUserMenu(pub Arc<dyn Handler>);

#[async_trait]
impl Handler for WithUserMenu {
    async fn call(
        &self,
        state: &AppState,
        ctx: &RequestContext,
        params: &[String],
        writer: &mut dyn Writer,
    ) -> AppResult<()> {
        self.0.call(state, ctx, params, writer).await?;
        writer.separator();
        if let Some(viewer) = &ctx.viewer {
            writer.link("/users", "🏠 Feed");
            writer.link("/users/mentions", "💬 Mentions");
            writer.link("/users/follows", "👥 Follows");
            writer.link("/users/bookmarks", "🔖 Bookmarks");
            writer.linkf(
                "/users/outbox",
                format_args!("👤 {}", viewer.preferred_username),
            );
            writer.link("/local", "🏘️ Local");
            writer.link("/federated", "🌐 Federated");
            writer.link("/hashtags", "# Hashtags");
            writer.link("/resolve", "🔍 Resolve");
            writer.link("/search", "🔎 Search");
            writer.link("/users/say", "📝 New post");
            writer.link("/users/settings", "⚙️ Settings");
            writer.link("/status", "📊 Status");
        } else {
            writer.link("/local", "🏘️ Local");
            writer.link("/federated", "🌐 Federated");
            writer.link("/hashtags", "# Hashtags");
            writer.link("/search", "🔎 Search");
            writer.link("/status", "📊 Status");
        }
        writer.link("/help", "❓ Help");
        Ok(())
    }
}

/// Single-flight response caching: a miss or stale entry rebuilds through
/// a buffered writer and the bytes (plus a `Cached response generated on
/// …` footer) are replayed to every caller until the TTL next lapses.
pub struct WithCache {
    pub inner: Arc<dyn Handler>,
    pub ttl: Duration,
    pub update_timeout: Duration,
}

#[async_trait]
impl Handler for WithCache {
    async fn call(
        &self,
        state: &AppState,
        ctx: &RequestContext,
        params: &[String],
        writer: &mut dyn Writer,
    ) -> AppResult<()> {
        let key = ctx.path.clone();
        let inner = Arc::clone(&self.inner);
        let state_owned = state.clone();
        let ctx_owned = ctx.clone();
        let params_owned = params.to_vec();

        let bytes = state
            .cache
            .get_or_refresh(&key, self.ttl, self.update_timeout, move || async move {
                let mut buf = BufferWriter::new();
                if let Err(err) = inner
                    .call(&state_owned, &ctx_owned, &params_owned, &mut buf)
                    .await
                {
                    tracing::warn!(?err, "cache rebuild failed");
                }
                buf.text(&format!(
                    "(Cached response generated on {})",
                    Utc::now().to_rfc3339()
                ));
                buf.into_bytes()
            })
            .await;

        writer.ok("text/gemini");
        writer.raw(&bytes);
        Ok(())
    }
}

/// One (pattern, handler) route table entry.
pub struct Route {
    pub pattern: Regex,
    pub handler: Arc<dyn Handler>,
}

impl Route {
    #[must_use]
    pub fn new(pattern: &str, handler: Arc<dyn Handler>) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("static route pattern"),
            handler,
        }
    }
}

/// An immutable, once-built ordered route table. The first pattern that
/// fully matches the request path wins; no entry matching redirects to
/// `/oops` (or `/users/oops` for an authenticated requester).
pub struct Dispatcher {
    routes: Vec<Route>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub async fn handle(&self, state: &AppState, ctx: &RequestContext, writer: &mut dyn Writer) {
        for route in &self.routes {
            let Some(caps) = route.pattern.captures(&ctx.path) else {
                continue;
            };
            if caps.get(0).map(|m| m.as_str()) != Some(ctx.path.as_str()) {
                continue;
            }
            let params: Vec<String> = caps
                .iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect();

            match route.handler.call(state, ctx, &params, writer).await {
                Ok(()) => {}
                Err(err) => {
                    if err.is_internal() {
                        tracing::error!(path = %ctx.path, ?err, "handler failed");
                    } else {
                        tracing::debug!(path = %ctx.path, ?err, "handler rejected request");
                    }
                    writer.error(err.status_family(), &err.public_message());
                }
            }
            return;
        }

        let oops = if ctx.viewer.is_some() {
            "/users/oops"
        } else {
            "/oops"
        };
        writer.redirect(&redirect_target(ctx, oops, state.domain()));
    }
}

/// Builds the target for a redirect, qualifying it with an explicit
/// `gemini://` scheme when the originating request came in over titan.
#[must_use]
pub fn redirect_target(ctx: &RequestContext, path: &str, domain: &str) -> String {
    if ctx.titan {
        format!("gemini://{domain}{path}")
    } else {
        path.to_string()
    }
}
