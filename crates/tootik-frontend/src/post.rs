//! Single-post rendering: the title line, compacted body, and the action
//! links gated by viewer identity, ownership and poll state.

use chrono::{TimeZone, Utc};
use tootik_common::limits::{COMPACT_VIEW_MAX_LINES, COMPACT_VIEW_MAX_RUNES};
use tootik_common::{AppResult, Writer};
use tootik_core::display_name;
use tootik_core::html;
use tootik_core::regexes;

use crate::feed::FeedRow;
use crate::state::AppState;

/// How much of a post `print_note` renders.
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
    /// Word-wrap and truncate the body to the compact-view budget, and
    /// link the title to `/view/<id>` instead of printing an author line.
    pub compact: bool,
    /// Print a link to the author's outbox under the title.
    pub print_author: bool,
    /// Print `RE: <parent author>` even when the parent couldn't be
    /// resolved locally (used for ancestor context on `/view`).
    pub print_parent_author: bool,
    /// Render the title as a `=>` link to `/view/<id>` rather than plain text.
    pub title_is_link: bool,
}

/// Renders one note: title line, body, and (in full mode) the author link,
/// reshare attribution, and the action set available to `viewer`.
pub async fn print_note(
    writer: &mut dyn Writer,
    state: &AppState,
    viewer: Option<&str>,
    row: &FeedRow,
    options: PrintOptions,
) -> AppResult<()> {
    let title = title_line(state, row, &options).await?;
    if options.title_is_link {
        writer.link(&format!("/view/{}", encode_note_path(&row.note.id)), &title);
    } else {
        writer.text(&title);
    }

    let body = compact_body(row, options.compact);
    if !body.text.is_empty() {
        writer.text(&body.text);
    }

    if options.compact {
        return Ok(());
    }

    if options.print_author {
        writer.linkf(
            &format!("/users/outbox/{}", encode_note_path(&row.author.id)),
            format_args!("👤 {}", display_name::synthesize(&row.author)),
        );
    }

    for (href, text) in &body.links {
        writer.linkf(href, format_args!("🔗 {text}"));
    }

    for href in inline_links(&row.note.object) {
        writer.linkf(&href, format_args!("🔗 {href}"));
    }

    let object_str = row.note.object.get("content").and_then(|v| v.as_str()).unwrap_or("");
    print_mentioned_users(writer, state, object_str).await?;

    for tag in regexes::find_hashtags(object_str) {
        if state.hashtags.has_other(&tag, &row.note.id).await? {
            writer.linkf(&format!("/hashtag/{tag}"), format_args!("# Posts tagged #{tag}"));
        }
    }

    print_reshares(writer, state, viewer, row).await?;
    print_actions(writer, state, viewer, row).await?;

    Ok(())
}

struct CompactedBody {
    text: String,
    links: indexmap::IndexMap<String, String>,
}

fn compact_body(row: &FeedRow, compact: bool) -> CompactedBody {
    let object = &row.note.object;
    let sensitive = object.get("sensitive").and_then(|v| v.as_bool()).unwrap_or(false);
    if sensitive {
        let summary = object.get("summary").and_then(|v| v.as_str());
        let text = summary
            .map(|s| format!("[{s}]"))
            .unwrap_or_else(|| "[content warning]".to_string());
        return CompactedBody {
            text,
            links: indexmap::IndexMap::new(),
        };
    }

    let content = object.get("content").and_then(|v| v.as_str()).unwrap_or("");
    if content.is_empty() {
        if let Some(name) = object.get("name").and_then(|v| v.as_str()) {
            return CompactedBody {
                text: name.to_string(),
                links: indexmap::IndexMap::new(),
            };
        }
    }

    let (max_runes, max_lines) = if compact {
        (COMPACT_VIEW_MAX_RUNES, COMPACT_VIEW_MAX_LINES)
    } else {
        (0, 0)
    };
    let compacted = html::get_text_and_links(content, max_runes, max_lines);
    CompactedBody {
        text: compacted.text,
        links: compacted.links,
    }
}

async fn title_line(state: &AppState, row: &FeedRow, options: &PrintOptions) -> AppResult<String> {
    let date = Utc
        .timestamp_opt(row.note.inserted, 0)
        .single()
        .unwrap_or_else(Utc::now);

    let mut line = format!("{} {}", date.format("%Y-%m-%d"), display_name::synthesize(&row.author));

    if let Some(sharer) = &row.sharer {
        line.push_str(&format!(" ┃ 🔄 {}", display_name::synthesize(sharer)));
    }

    let edited = row
        .note
        .object
        .get("edited")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if edited {
        line.push_str(" ┃ edited");
    }

    if let Some(parent_id) = &row.note.in_reply_to {
        if options.print_parent_author {
            let parent_author = match state.notes.find_by_id(parent_id).await? {
                Some(parent) => match state.persons.find_by_id(&parent.author).await? {
                    Some(author) => display_name::synthesize(&author),
                    None => "?".to_string(),
                },
                None => "?".to_string(),
            };
            line.push_str(&format!(" ┃ RE: {parent_author}"));
        }
    }

    let content = row.note.object.get("content").and_then(|v| v.as_str()).unwrap_or("");
    let link_count = html::get_text_and_links(content, 0, 0).links.len();
    let hashtag_count = regexes::find_hashtags(content).len();
    let mention_count = regexes::find_mentions(content).len();
    let reply_count = state.notes.count_replies(&row.note.id).await?;

    if link_count > 0 {
        line.push_str(&format!(" ┃ 🔗{link_count}"));
    }
    if hashtag_count > 0 {
        line.push_str(&format!(" ┃ #{hashtag_count}"));
    }
    if mention_count > 0 {
        line.push_str(&format!(" ┃ 💬{mention_count}"));
    }
    if reply_count > 0 {
        line.push_str(&format!(" ┃ ↩{reply_count}"));
    }

    Ok(line)
}

/// Pulls every `tag`/`attachment` href and the note's own `url`, in that
/// order, deduplicated.
fn inline_links(object: &serde_json::Value) -> Vec<String> {
    let mut seen = indexmap::IndexSet::new();

    let urls_from = |key: &str, url_field: &str| -> Vec<String> {
        object
            .get(key)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|entry| entry.get(url_field).and_then(|v| v.as_str()).map(str::to_string))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
    };

    for href in urls_from("tag", "href") {
        seen.insert(href);
    }
    for href in urls_from("attachment", "url") {
        seen.insert(href);
    }
    if let Some(url) = object.get("url").and_then(|v| v.as_str()) {
        seen.insert(url.to_string());
    }

    seen.into_iter().collect()
}

/// Resolves each `@user[@host]` mention found in `content` against an
/// already-known actor and links to its outbox.
async fn print_mentioned_users(writer: &mut dyn Writer, state: &AppState, content: &str) -> AppResult<()> {
    for (user, host) in regexes::find_mentions(content) {
        if let Some(actor) = state.persons.find_by_username_and_host(&user, host.as_deref()).await? {
            writer.linkf(
                &format!("/users/outbox/{}", encode_note_path(&actor.id)),
                format_args!("💬 {}", display_name::synthesize(&actor)),
            );
        }
    }
    Ok(())
}

/// Ranks up to `SharesPerPost` resharers: Groups before other actors, then
/// (for an authenticated viewer) actors the viewer follows before
/// same-host actors before everyone else, newest-shared first within a tier.
async fn print_reshares(
    writer: &mut dyn Writer,
    state: &AppState,
    viewer: Option<&str>,
    row: &FeedRow,
) -> AppResult<()> {
    let sharers = state.shares.sharers_for(&row.note.id).await?;
    if sharers.is_empty() {
        return Ok(());
    }

    let followees = match viewer {
        Some(v) => state.follows.accepted_followees(v).await?,
        None => Vec::new(),
    };

    let sharer_ids: Vec<String> = sharers.iter().map(|s| s.by.clone()).collect();
    let mut actors = state.persons.find_by_ids(&sharer_ids).await?;
    actors.sort_by_key(|a| match a.actor_type {
        tootik_db::entities::person::ActorType::Group => 0,
        _ if followees.iter().any(|f| f == &a.id) => 1,
        _ if a.host.is_none() => 2,
        _ => 3,
    });
    actors.truncate(tootik_common::limits::SHARES_PER_POST);

    for actor in actors {
        writer.linkf(
            &format!("/users/outbox/{}", encode_note_path(&actor.id)),
            format_args!("🔄 Shared by {}", display_name::synthesize(&actor)),
        );
    }
    Ok(())
}

async fn print_actions(
    writer: &mut dyn Writer,
    state: &AppState,
    viewer: Option<&str>,
    row: &FeedRow,
) -> AppResult<()> {
    let Some(viewer) = viewer else {
        return Ok(());
    };

    let encoded = encode_note_path(&row.note.id);
    let is_own = viewer == row.author.id;

    if is_own {
        writer.link(&format!("/users/edit/{encoded}"), "✏️ Edit");
        writer.link(&format!("/users/upload/edit/{encoded}"), "✏️ Edit (titan)");
        writer.link(&format!("/users/delete/{encoded}"), "🗑️ Delete");
    } else {
        if state.shares.exists(viewer, &row.note.id).await? {
            writer.link(&format!("/users/unshare/{encoded}"), "🔄 Unshare");
        } else if row.note.public {
            writer.link(&format!("/users/share/{encoded}"), "🔄 Share");
        }
    }

    if state.bookmarks.find(viewer, &row.note.id).await?.is_some() {
        writer.link(&format!("/users/unbookmark/{encoded}"), "🔖 Unbookmark");
    } else {
        writer.link(&format!("/users/bookmark/{encoded}"), "🔖 Bookmark");
    }

    writer.link(&format!("/users/reply/{encoded}"), "↩️ Reply");
    writer.link(&format!("/users/upload/reply/{encoded}"), "↩️ Reply (titan)");

    if row.note.object_type == tootik_db::entities::note::ObjectType::Question {
        let closed = row
            .note
            .object
            .get("closed")
            .or_else(|| row.note.object.get("endTime"))
            .is_some();
        if !closed && !state.notes.has_voted(&row.note.id, viewer).await? {
            writer.link(&format!("/users/vote/{encoded}"), "🗳️ Vote");
        }
    }

    Ok(())
}

/// Path-encodes a note id's `host/hash` suffix for use in a local URL.
fn encode_note_path(note_id: &str) -> String {
    note_id
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc as ChronoUtc;
    use serde_json::json;
    use tootik_db::entities::{note, person};

    fn author(id: &str) -> person::Model {
        person::Model {
            id: id.to_string(),
            preferred_username: "alice".to_string(),
            host: None,
            display_name: Some("Alice".to_string()),
            summary: None,
            icon_url: None,
            attachments: json!([]),
            actor_type: person::ActorType::Person,
            followers_collection_url: None,
            ttl_days: None,
            moved_to: None,
            also_known_as: json!([]),
            published: ChronoUtc::now(),
            updated: ChronoUtc::now(),
        }
    }

    fn note_row(content: &str, sensitive: bool) -> FeedRow {
        FeedRow {
            note: note::Model {
                id: "https://example.com/post/1".to_string(),
                author: "https://example.com/users/alice".to_string(),
                object: json!({ "content": content, "sensitive": sensitive }),
                object_type: note::ObjectType::Note,
                in_reply_to: None,
                group_id: None,
                to0: None,
                to1: None,
                to2: None,
                cc0: None,
                cc1: None,
                cc2: None,
                public: true,
                host: None,
                inserted: 0,
            },
            author: author("https://example.com/users/alice"),
            sharer: None,
        }
    }

    #[test]
    fn sensitive_note_compacts_to_content_warning() {
        let row = note_row("<p>hidden</p>", true);
        let body = compact_body(&row, true);
        assert_eq!(body.text, "[content warning]");
    }

    #[test]
    fn plain_note_compacts_normally() {
        let row = note_row("<p>hello world</p>", false);
        let body = compact_body(&row, true);
        assert_eq!(body.text, "hello world");
    }

    #[test]
    fn encode_note_path_strips_scheme() {
        assert_eq!(
            encode_note_path("https://example.com/post/1"),
            "example.com/post/1"
        );
    }
}
