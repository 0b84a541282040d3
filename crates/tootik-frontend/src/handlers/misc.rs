//! Small standalone pages the user menu links to: remote-actor resolution,
//! full-text search, the operations status page, and static help text.

use tootik_common::{AppError, AppResult, Writer};
use tootik_core::collab::RequestContext;

use crate::dispatch::{handler_fn, redirect_target};
use crate::feed;
use crate::state::AppState;

async fn resolve(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let query = ctx.raw_query.trim();
    if query.is_empty() {
        writer.status(tootik_common::StatusFamily::Input, "actor id or @user@host");
        return Ok(());
    }

    let actor_id = if query.starts_with("http://") || query.starts_with("https://") {
        query.to_string()
    } else if let Some((user, host)) = query.trim_start_matches('@').split_once('@') {
        format!("https://{host}/users/{user}")
    } else {
        return Err(AppError::BadInput("expected @user@host or an actor URL".to_string()));
    };

    let actor = state.resolver.resolve(ctx, &actor_id).await?;
    writer.redirect(&redirect_target(
        ctx,
        &format!("/users/outbox/{}", actor.id.trim_start_matches("https://")),
        state.domain(),
    ));
    Ok(())
}
handler_fn!(Resolve, resolve);

/// `/search` takes its query term over the same input channel a feed
/// handler would use for a pagination offset, so (unlike other feeds) a
/// result page renders without Previous/Next links rather than losing the
/// term on the next click.
async fn search(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let term = ctx.raw_query.trim();
    if term.is_empty() {
        writer.status(tootik_common::StatusFamily::Input, "search term");
        return Ok(());
    }

    let notes = state.notes.search(term, 0).await?;
    let rows = feed::hydrate_rows(state, notes).await?;

    writer.ok("text/gemini");
    writer.title(1, &format!("Search: {term}"));
    if rows.is_empty() {
        writer.text("No matching posts.");
        return Ok(());
    }
    for row in &rows {
        crate::post::print_note(
            writer,
            state,
            ctx.viewer.as_ref().map(|a| a.id.as_str()),
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
handler_fn!(Search, search);

async fn status(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    writer.ok("text/gemini");
    writer.title(1, "Status");
    writer.textf(format_args!("Domain: {}", state.domain()));
    let _ = ctx;
    Ok(())
}
handler_fn!(Status, status);

async fn help(
    _state: &AppState,
    _ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    writer.ok("text/gemini");
    writer.title(1, "Help");
    writer.text("say <text>, whisper <text>, and dm <recipients>\\n<text> create posts.");
    writer.text("reply/edit/delete/share/bookmark/follow act on a single post or actor.");
    writer.text("Prefix a post with [POLL prompt] opt1 | opt2 to start a poll.");
    Ok(())
}
handler_fn!(Help, help);

/// Plain-text robots policy, served outside the `text/gemini` menu wrapper
/// since crawlers don't read Gemini markup.
async fn robots(
    _state: &AppState,
    _ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    writer.ok("text/plain");
    writer.text("User-agent: *\nDisallow: /users/say\nDisallow: /users/whisper\nDisallow: /users/dm\nDisallow: /resolve\nDisallow: /search");
    Ok(())
}
handler_fn!(Robots, robots);

async fn outbox_self(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = ctx.viewer.as_ref().ok_or(AppError::AuthRequired)?;
    writer.redirect(&redirect_target(
        ctx,
        &format!("/users/outbox/{}", viewer.id.trim_start_matches("https://")),
        state.domain(),
    ));
    Ok(())
}
handler_fn!(OutboxSelf, outbox_self);
