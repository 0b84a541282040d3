//! Single-post view: the note itself, its ancestor chain, and a paginated
//! page of replies under the visibility predicate.

use tootik_common::limits::{POST_CONTEXT_DEPTH, REPLIES_PER_PAGE};
use tootik_common::{AppError, AppResult, Writer};
use tootik_core::collab::RequestContext;
use tootik_core::visibility::can_view;

use crate::dispatch::{handler_fn, Handler};
use crate::feed::{self, FeedRow};
use crate::post::{self, PrintOptions};
use crate::state::AppState;

async fn view(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let hostpath = params.first().ok_or_else(|| AppError::BadInput("missing post".to_string()))?;
    let note_id = format!("https://{hostpath}");
    let note = state.notes.get_by_id(&note_id).await?;
    let ancestors = state.notes.find_ancestors(&note_id, POST_CONTEXT_DEPTH).await?;

    let offset = feed::parse_offset(&ctx.raw_query)?;
    let replies = state
        .notes
        .find_replies(&note_id, offset, REPLIES_PER_PAGE as u64)
        .await?;

    let viewer_id = ctx.viewer.as_ref().map(|a| a.id.as_str());
    let all_notes: Vec<&tootik_db::entities::note::Model> =
        std::iter::once(&note).chain(ancestors.iter()).chain(replies.iter()).collect();
    let viewer_ctx = state.viewer_context(viewer_id, &all_notes).await?;

    if !can_view(&note, viewer_id, &viewer_ctx) {
        return Err(AppError::NotFound("post".to_string()));
    }

    let author = state.persons.get_by_id(&note.author).await?;
    let sharer = match &note.group_id {
        Some(group_id) => state.persons.find_by_id(group_id).await?,
        None => None,
    };

    writer.ok("text/gemini");
    writer.title(1, "Post");

    let visible_ancestors: Vec<_> = ancestors
        .into_iter()
        .filter(|n| can_view(n, viewer_id, &viewer_ctx))
        .collect();

    if !visible_ancestors.is_empty() {
        writer.subtitle("Context");
        for ancestor in &visible_ancestors {
            let Some(ancestor_author) = state.persons.find_by_id(&ancestor.author).await? else {
                continue;
            };
            let row = FeedRow {
                note: ancestor.clone(),
                author: ancestor_author,
                sharer: None,
            };
            post::print_note(
                writer,
                state,
                viewer_id,
                &row,
                PrintOptions {
                    compact: true,
                    print_author: true,
                    print_parent_author: false,
                    title_is_link: true,
                },
            )
            .await?;
        }
        writer.separator();
    }

    let row = FeedRow {
        note: note.clone(),
        author,
        sharer,
    };
    post::print_note(
        writer,
        state,
        viewer_id,
        &row,
        PrintOptions {
            compact: false,
            print_author: true,
            print_parent_author: true,
            title_is_link: false,
        },
    )
    .await?;

    if note.object_type == tootik_db::entities::note::ObjectType::Question {
        if let Some(closed_bar) = poll_results(state, &note).await? {
            writer.subtitle("Results");
            for line in closed_bar {
                writer.text(&line);
            }
        }
    }

    let visible_replies: Vec<_> = replies
        .into_iter()
        .filter(|n| can_view(n, viewer_id, &viewer_ctx))
        .collect();

    if !visible_replies.is_empty() {
        writer.subtitle("Replies");
        let rows = feed::hydrate_rows(state, visible_replies).await?;
        for row in &rows {
            post::print_note(
                writer,
                state,
                viewer_id,
                row,
                PrintOptions {
                    compact: true,
                    print_author: true,
                    print_parent_author: false,
                    title_is_link: true,
                },
            )
            .await?;
        }
        if rows.len() as i64 == REPLIES_PER_PAGE {
            writer.link(
                &format!("/view/{hostpath}?{}", offset + REPLIES_PER_PAGE as u64),
                "More replies",
            );
        }
    }

    Ok(())
}
handler_fn!(View, view);

/// Bar-graph of vote counts per option, once a poll's `endTime` has passed.
async fn poll_results(state: &AppState, note: &tootik_db::entities::note::Model) -> AppResult<Option<Vec<String>>> {
    let closed = note.object.get("closed").or_else(|| note.object.get("endTime")).is_some();
    if !closed {
        return Ok(None);
    }

    let options: Vec<String> = note
        .object
        .get("anyOf")
        .or_else(|| note.object.get("oneOf"))
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|o| o.get("name").and_then(|n| n.as_str()).map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let votes = state.notes.find_replies(&note.id, 0, 100_000).await?;
    let counts: Vec<(String, i64)> = options
        .into_iter()
        .map(|name| {
            let count = votes
                .iter()
                .filter(|v| v.object.get("name").and_then(|n| n.as_str()) == Some(name.as_str()))
                .count() as i64;
            (name, count)
        })
        .collect();
    Ok(Some(feed::bar_graph(&counts, 20)))
}
