//! Thin `FeedQuery` specializations of `showFeedPage`: local, federated,
//! the authenticated home timeline, mentions, bookmarks, an actor's
//! outbox, one hashtag, and the hashtag discovery page.

use async_trait::async_trait;
use chrono::Utc;
use tootik_common::{AppError, AppResult, Writer};
use tootik_core::collab::RequestContext;

use crate::dispatch::{handler_fn, Handler};
use crate::feed::{self, FeedQuery, FeedRow};
use crate::state::AppState;

struct LocalQuery;

#[async_trait]
impl FeedQuery for LocalQuery {
    async fn fetch(&self, state: &AppState, offset: u64) -> AppResult<Vec<FeedRow>> {
        let notes = state.notes.find_local(offset).await?;
        feed::hydrate_rows(state, notes).await
    }
}

async fn local(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let offset = feed::parse_offset(&ctx.raw_query)?;
    feed::show_feed_page(
        writer,
        state,
        ctx.viewer.as_ref().map(|a| a.id.as_str()),
        "Local",
        "/local",
        offset,
        &LocalQuery,
        true,
        "No posts yet.",
    )
    .await
}
handler_fn!(Local, local);

struct FederatedQuery;

#[async_trait]
impl FeedQuery for FederatedQuery {
    async fn fetch(&self, state: &AppState, offset: u64) -> AppResult<Vec<FeedRow>> {
        let notes = state.notes.find_federated(offset).await?;
        feed::hydrate_rows(state, notes).await
    }
}

async fn federated(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let offset = feed::parse_offset(&ctx.raw_query)?;
    feed::show_feed_page(
        writer,
        state,
        ctx.viewer.as_ref().map(|a| a.id.as_str()),
        "Federated",
        "/federated",
        offset,
        &FederatedQuery,
        true,
        "No posts yet.",
    )
    .await
}
handler_fn!(Federated, federated);

async fn user_home(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = ctx.viewer.as_ref().ok_or(AppError::AuthRequired)?;
    let offset = feed::parse_offset(&ctx.raw_query)?;

    let followees = state.follows.accepted_followees(&viewer.id).await?;
    let mut authors = followees;
    authors.push(viewer.id.clone());
    let notes = state.notes.find_by_authors(&authors, offset).await?;
    let rows = feed::hydrate_rows(state, notes).await?;

    writer.ok("text/gemini");
    if offset > 0 {
        writer.title(1, &format!("Feed ({offset}-)"));
    } else {
        writer.title(1, "Feed");
    }
    if rows.is_empty() {
        writer.text("Nothing here yet. Follow someone, or check /local.");
        return Ok(());
    }
    for row in &rows {
        crate::post::print_note(
            writer,
            state,
            Some(viewer.id.as_str()),
            row,
            crate::post::PrintOptions {
                compact: true,
                print_author: true,
                print_parent_author: false,
                title_is_link: true,
            },
        )
        .await?;
    }
    Ok(())
}
handler_fn!(UserHome, user_home);

async fn mentions(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = ctx.viewer.as_ref().ok_or(AppError::AuthRequired)?;
    let offset = feed::parse_offset(&ctx.raw_query)?;

    struct MentionsQuery(String);
    #[async_trait]
    impl FeedQuery for MentionsQuery {
        async fn fetch(&self, state: &AppState, offset: u64) -> AppResult<Vec<FeedRow>> {
            let notes = state.notes.find_mentioning(&self.0, offset).await?;
            let since = Utc::now().timestamp() - 7 * 24 * 60 * 60;
            let followees = state.follows.accepted_followees(&self.0).await?;

            let mut recent = Vec::with_capacity(notes.len());
            for n in notes {
                if n.inserted < since {
                    continue;
                }
                let authored_by_followee = followees.contains(&n.author);
                let reshared_by_followee = if authored_by_followee {
                    false
                } else {
                    let sharers = state.shares.sharers_for(&n.id).await?;
                    sharers.iter().any(|s| followees.contains(&s.by))
                };
                if authored_by_followee || reshared_by_followee {
                    recent.push(n);
                }
            }

            feed::hydrate_and_filter(state, recent, Some(self.0.as_str())).await
        }
    }

    feed::show_feed_page(
        writer,
        state,
        Some(viewer.id.as_str()),
        "Mentions",
        "/users/mentions",
        offset,
        &MentionsQuery(viewer.id.clone()),
        false,
        "No mentions in the last week.",
    )
    .await
}
handler_fn!(Mentions, mentions);

async fn bookmarks(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = ctx.viewer.as_ref().ok_or(AppError::AuthRequired)?;
    let offset = feed::parse_offset(&ctx.raw_query)?;

    struct BookmarksQuery(String);
    #[async_trait]
    impl FeedQuery for BookmarksQuery {
        async fn fetch(&self, state: &AppState, offset: u64) -> AppResult<Vec<FeedRow>> {
            let marks = state
                .bookmarks
                .list_for(&self.0, offset, tootik_common::limits::POSTS_PER_PAGE as u64)
                .await?;
            let mut notes = Vec::with_capacity(marks.len());
            for mark in marks {
                if let Some(note) = state.notes.find_by_id(&mark.note).await? {
                    notes.push(note);
                }
            }
            // A bookmark outlives a narrowing of the bookmarked note's
            // audience (an unfollow, say), so re-apply the visibility
            // predicate rather than trusting bookmark ownership alone.
            feed::hydrate_and_filter(state, notes, Some(self.0.as_str())).await
        }
    }

    feed::show_feed_page(
        writer,
        state,
        Some(viewer.id.as_str()),
        "Bookmarks",
        "/users/bookmarks",
        offset,
        &BookmarksQuery(viewer.id.clone()),
        false,
        "No bookmarks yet.",
    )
    .await
}
handler_fn!(Bookmarks, bookmarks);

struct OutboxQuery {
    author: String,
    viewer: Option<String>,
}

#[async_trait]
impl FeedQuery for OutboxQuery {
    async fn fetch(&self, state: &AppState, offset: u64) -> AppResult<Vec<FeedRow>> {
        let notes = state.notes.find_by_author(&self.author, offset).await?;
        feed::hydrate_and_filter(state, notes, self.viewer.as_deref()).await
    }
}

async fn user_outbox(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let hostpath = params.first().ok_or_else(|| AppError::BadInput("missing actor".to_string()))?;
    let offset = feed::parse_offset(&ctx.raw_query)?;
    let actor_id = format!("https://{hostpath}");
    let actor = state.persons.get_by_id(&actor_id).await?;
    let viewer_id = ctx.viewer.as_ref().map(|a| a.id.clone());

    feed::show_feed_page(
        writer,
        state,
        viewer_id.as_deref(),
        &format!("{}'s posts", actor.preferred_username),
        &format!("/users/outbox/{hostpath}"),
        offset,
        &OutboxQuery {
            author: actor_id.clone(),
            viewer: viewer_id.clone(),
        },
        false,
        "No posts yet.",
    )
    .await?;

    if let Some(viewer) = &ctx.viewer {
        if viewer.id != actor_id {
            writer.separator();
            match state.follows.find(&viewer.id, &actor_id).await? {
                Some(follow) if follow.accepted == Some(true) => {
                    writer.link(&format!("/users/unfollow/{hostpath}"), "Unfollow");
                }
                Some(_) => {
                    writer.text("Follow request pending.");
                }
                None => {
                    writer.link(&format!("/users/follow/{hostpath}"), "Follow");
                }
            }
        }
    }

    Ok(())
}
handler_fn!(UserOutbox, user_outbox);

struct HashtagQuery(String);

#[async_trait]
impl FeedQuery for HashtagQuery {
    async fn fetch(&self, state: &AppState, offset: u64) -> AppResult<Vec<FeedRow>> {
        let links = state.hashtags.find_by_hashtag(&self.0, offset).await?;
        let mut notes = Vec::with_capacity(links.len());
        for link in links {
            if let Some(note) = state.notes.find_by_id(&link.note).await? {
                notes.push(note);
            }
        }
        feed::hydrate_rows(state, notes).await
    }
}

async fn hashtag(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let tag = params.first().ok_or_else(|| AppError::BadInput("missing hashtag".to_string()))?;
    let offset = feed::parse_offset(&ctx.raw_query)?;

    feed::show_feed_page(
        writer,
        state,
        ctx.viewer.as_ref().map(|a| a.id.as_str()),
        &format!("#{tag}"),
        &format!("/hashtag/{tag}"),
        offset,
        &HashtagQuery(tag.to_lowercase()),
        false,
        "No posts tagged with this hashtag.",
    )
    .await
}
handler_fn!(Hashtag, hashtag);

async fn hashtags(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let since = Utc::now().timestamp() - 7 * 24 * 60 * 60;
    let trending = state.hashtags.trending(since, 30).await?;

    writer.ok("text/gemini");
    writer.title(1, "Hashtags");

    writer.subtitle("Trending this week");
    if trending.is_empty() {
        writer.text("Nothing trending yet.");
    } else {
        for (tag, authors) in &trending {
            writer.linkf(&format!("/hashtag/{tag}"), format_args!("#{tag} ({authors} authors)"));
        }
    }

    writer.subtitle("Top hashtag, by day");
    if let Some((top, _)) = trending.first() {
        let bar = feed::bar_graph(&[(top.clone(), trending.first().map(|(_, c)| *c).unwrap_or(0))], 20);
        for line in bar {
            writer.text(&line);
        }
    }

    let _ = ctx;
    Ok(())
}
handler_fn!(Hashtags, hashtags);
