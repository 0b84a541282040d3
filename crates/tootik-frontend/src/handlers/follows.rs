//! The viewer's own follows/followers listings.

use tootik_common::{AppError, AppResult, Writer};
use tootik_core::collab::RequestContext;

use crate::dispatch::handler_fn;
use crate::feed;
use crate::state::AppState;

async fn render_actor_list(
    state: &AppState,
    writer: &mut dyn Writer,
    title: &str,
    ids: &[String],
) -> AppResult<()> {
    writer.ok("text/gemini");
    writer.title(1, title);
    if ids.is_empty() {
        writer.text("Nobody here yet.");
        return Ok(());
    }
    let actors = state.persons.find_by_ids(ids).await?;
    for id in ids {
        let Some(actor) = actors.iter().find(|a| &a.id == id) else {
            continue;
        };
        let label = tootik_core::display_name::synthesize(actor);
        writer.link(
            &format!("/users/outbox/{}", actor.id.trim_start_matches("https://")),
            &label,
        );
    }
    Ok(())
}

async fn follows(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = ctx.viewer.as_ref().ok_or(AppError::AuthRequired)?;
    let offset = feed::parse_offset(&ctx.raw_query)?;
    let rows = state.follows.followees(&viewer.id, offset).await?;
    let ids: Vec<String> = rows.into_iter().map(|r| r.followed).collect();
    render_actor_list(state, writer, "Follows", &ids).await
}
handler_fn!(Follows, follows);

async fn followers(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = ctx.viewer.as_ref().ok_or(AppError::AuthRequired)?;
    let offset = feed::parse_offset(&ctx.raw_query)?;
    let rows = state.follows.followers(&viewer.id, offset).await?;
    let ids: Vec<String> = rows.into_iter().map(|r| r.follower).collect();
    render_actor_list(state, writer, "Followers", &ids).await
}
handler_fn!(Followers, followers);
