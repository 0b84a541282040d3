//! The write-side gate: the ten-step discipline every mutating handler
//! shares (auth, input, throttle, validate, build, poll detection, edit
//! invariants, reply audience, dispatch, redirect).

use chrono::Utc;
use serde_json::json;
use tootik_common::limits::{
    MAX_POSTS_LENGTH, MAX_POSTS_PER_DAY, MIN_BOOKMARK_INTERVAL, POLL_DURATION, POLL_MAX_OPTIONS,
    POST_THROTTLE_FACTOR, POST_THROTTLE_UNIT, PUBLIC_URI,
};
use tootik_common::{AppError, AppResult, Writer};
use tootik_core::audience::{self, Audience, Visibility};
use tootik_core::collab::RequestContext;
use tootik_core::regexes;
use tootik_core::throttle::{self, ThrottleDecision};
use tootik_db::entities::{bookmark, follow, note, share};

use crate::dispatch::{handler_fn, redirect_target};
use crate::state::AppState;

fn rune_len(s: &str) -> usize {
    s.chars().count()
}

/// Percent-decodes a titan/query input string into plain text. Callers are
/// already holding the raw (already percent-decoded by the transport layer
/// per [`RequestContext::raw_query`]) string; this just trims it. A titan
/// upload additionally carries `;size=N;mime=…` parameters, checked here
/// against the upload ceiling and the one mime type this gate accepts.
fn take_input(ctx: &RequestContext) -> AppResult<String> {
    if ctx.titan {
        let size = ctx
            .titan_size
            .ok_or_else(|| AppError::BadInput("missing titan size".to_string()))?;
        if size > tootik_common::limits::max_upload_bytes() as u64 {
            return Err(AppError::BadInput("upload too large".to_string()));
        }
        let mime = ctx.titan_mime.as_deref().unwrap_or_default();
        if mime != "text/plain" {
            return Err(AppError::BadInput("unsupported mime type".to_string()));
        }
    }

    let trimmed = ctx.raw_query.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadInput("empty input".to_string()));
    }
    Ok(trimmed.to_string())
}

fn require_viewer(ctx: &RequestContext) -> AppResult<&tootik_core::collab::Actor> {
    ctx.viewer.as_ref().ok_or(AppError::AuthRequired)
}

/// Step 3: the posting throttle, shared by `say`/`whisper`/`dm`/`reply`.
async fn check_post_throttle(state: &AppState, author: &str) -> AppResult<()> {
    let now = Utc::now().timestamp();
    let since = now - 24 * 60 * 60;
    let count = state.notes.count_since(author, since).await? as i64;
    let last = state.notes.find_by_author(author, 0).await?;
    let last_unix = last.first().map(|n| n.inserted);

    match throttle::decide(now, count, last_unix, POST_THROTTLE_FACTOR, POST_THROTTLE_UNIT, MAX_POSTS_PER_DAY) {
        ThrottleDecision::Allow => Ok(()),
        ThrottleDecision::Wait { wait } => Err(AppError::Throttled(format!("{}s", wait.as_secs()))),
        ThrottleDecision::QuotaReached => Err(AppError::QuotaReached("daily posts quota".to_string())),
    }
}

fn validate_post_body(content: &str) -> AppResult<()> {
    if content.is_empty() {
        return Err(AppError::BadInput("empty post".to_string()));
    }
    if rune_len(content) > MAX_POSTS_LENGTH {
        return Err(AppError::BadInput("post too long".to_string()));
    }
    Ok(())
}

/// Builds the tags array (`Hashtag`/`Mention`) and resolves each mention to
/// a concrete actor id, preferring (in order) the reply's parent author, a
/// followed actor, a local actor, then any match.
async fn build_tags(
    state: &AppState,
    content: &str,
    parent_author: Option<&str>,
    poster_followees: &[String],
) -> AppResult<Vec<serde_json::Value>> {
    let mut tags = Vec::new();

    for tag in regexes::find_hashtags(content) {
        tags.push(json!({ "type": "Hashtag", "name": format!("#{tag}") }));
    }

    for (user, host) in regexes::find_mentions(content) {
        let candidates_raw = if let Some(host) = &host {
            state
                .persons
                .find_by_ids(&[format!("https://{host}/users/{user}")])
                .await?
        } else {
            state
                .persons
                .find_by_ids(&poster_followees.iter().cloned().collect::<Vec<_>>())
                .await?
                .into_iter()
                .filter(|p| p.preferred_username == user)
                .collect()
        };

        let candidates: Vec<audience::MentionCandidate> = candidates_raw
            .iter()
            .map(|p| audience::MentionCandidate {
                actor_id: p.id.clone(),
                is_parent_author: Some(p.id.as_str()) == parent_author,
                is_followed: poster_followees.contains(&p.id),
                is_local: p.host.is_none(),
            })
            .collect();

        if let Some(best) = audience::resolve_mention(&candidates) {
            tags.push(json!({ "type": "Mention", "href": best.actor_id }));
        }
    }

    Ok(tags)
}

/// Step 6: detects `[POLL prompt] opt1 | opt2` content and, when matched,
/// returns the `Question` object fields to merge in.
fn detect_poll(content: &str, now: i64) -> Option<serde_json::Value> {
    let draft = regexes::parse_poll(content, POLL_MAX_OPTIONS)?;
    let options: Vec<serde_json::Value> = draft
        .options
        .iter()
        .map(|name| json!({ "type": "Note", "name": name, "replies": { "totalItems": 0 } }))
        .collect();
    Some(json!({
        "type": "Question",
        "content": draft.prompt,
        "anyOf": options,
        "endTime": now + POLL_DURATION.as_secs() as i64,
    }))
}

/// Persists a freshly built note, its hashtag links, and enqueues the
/// `Create` activity, inside one unit of work (sea-orm's single-connection
/// pool serializes it against concurrent callers per row).
async fn create_note(
    state: &AppState,
    ctx: &RequestContext,
    author_id: &str,
    content: &str,
    to: &[String],
    cc: &[String],
    in_reply_to: Option<&str>,
) -> AppResult<String> {
    let now = Utc::now().timestamp();
    let id = tootik_common::IdGenerator::stable_post_id(state.domain(), author_id, content, now);

    let followees = state.follows.accepted_followees(author_id).await?;
    let tags = build_tags(state, content, in_reply_to, &followees).await?;

    let mut object = json!({
        "id": id,
        "type": "Note",
        "attributedTo": author_id,
        "content": content,
        "to": to,
        "cc": cc,
        "tag": tags,
        "published": Utc::now().to_rfc3339(),
    });
    if let Some(parent) = in_reply_to {
        object["inReplyTo"] = json!(parent);
    }

    let mut object_type = note::ObjectType::Note;
    if in_reply_to.is_none() {
        if let Some(poll) = detect_poll(content, now) {
            for (k, v) in poll.as_object().expect("poll object").clone() {
                object[k] = v;
            }
            object_type = note::ObjectType::Question;
        }
    }

    let public = to.iter().any(|a| a == PUBLIC_URI) || cc.iter().any(|a| a == PUBLIC_URI);
    let to_slots = |v: &[String]| (v.first().cloned(), v.get(1).cloned(), v.get(2).cloned());
    let (to0, to1, to2) = to_slots(to);
    let (cc0, cc1, cc2) = to_slots(cc);

    let model = note::ActiveModel {
        id: sea_orm::ActiveValue::Set(id.clone()),
        author: sea_orm::ActiveValue::Set(author_id.to_string()),
        object: sea_orm::ActiveValue::Set(object.clone()),
        object_type: sea_orm::ActiveValue::Set(object_type),
        in_reply_to: sea_orm::ActiveValue::Set(in_reply_to.map(str::to_string)),
        group_id: sea_orm::ActiveValue::Set(None),
        to0: sea_orm::ActiveValue::Set(to0),
        to1: sea_orm::ActiveValue::Set(to1),
        to2: sea_orm::ActiveValue::Set(to2),
        cc0: sea_orm::ActiveValue::Set(cc0),
        cc1: sea_orm::ActiveValue::Set(cc1),
        cc2: sea_orm::ActiveValue::Set(cc2),
        public: sea_orm::ActiveValue::Set(public),
        host: sea_orm::ActiveValue::Set(None),
        inserted: sea_orm::ActiveValue::Set(now),
    };
    state.notes.create(model).await?;

    for tag in regexes::find_hashtags(content) {
        let _ = state
            .hashtags
            .create(tootik_db::entities::hashtag::ActiveModel {
                id: sea_orm::ActiveValue::NotSet,
                hashtag: sea_orm::ActiveValue::Set(tag),
                note: sea_orm::ActiveValue::Set(id.clone()),
                author: sea_orm::ActiveValue::Set(author_id.to_string()),
                inserted: sea_orm::ActiveValue::Set(now),
            })
            .await;
    }

    let keys = state.actor_keys(author_id).await?;
    state.inbox.create(ctx, &keys, object).await?;

    Ok(id)
}

async fn say(state: &AppState, ctx: &RequestContext, _p: &[String], writer: &mut dyn Writer) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    check_post_throttle(state, &viewer.id).await?;
    let content = take_input(ctx)?;
    validate_post_body(&content)?;

    let followers_url = viewer
        .followers_collection_url
        .clone()
        .unwrap_or_else(|| format!("{}/followers", viewer.id));
    let aud = audience::for_new_post(Visibility::Say, &followers_url, &[]);
    let id = create_note(state, ctx, &viewer.id, &content, &aud.to, &aud.cc, None).await?;

    writer.redirect(&redirect_target(ctx, &format!("/view/{}", path_of(&id)), state.domain()));
    Ok(())
}
handler_fn!(Say, say);

async fn whisper(state: &AppState, ctx: &RequestContext, _p: &[String], writer: &mut dyn Writer) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    check_post_throttle(state, &viewer.id).await?;
    let content = take_input(ctx)?;
    validate_post_body(&content)?;

    let followers_url = viewer
        .followers_collection_url
        .clone()
        .unwrap_or_else(|| format!("{}/followers", viewer.id));
    let aud = audience::for_new_post(Visibility::Whisper, &followers_url, &[]);
    let id = create_note(state, ctx, &viewer.id, &content, &aud.to, &aud.cc, None).await?;

    writer.redirect(&redirect_target(ctx, &format!("/view/{}", path_of(&id)), state.domain()));
    Ok(())
}
handler_fn!(Whisper, whisper);

async fn dm(state: &AppState, ctx: &RequestContext, _p: &[String], writer: &mut dyn Writer) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    check_post_throttle(state, &viewer.id).await?;
    let input = take_input(ctx)?;
    let (recipients_part, content) = input
        .split_once('\n')
        .ok_or_else(|| AppError::BadInput("missing recipients line".to_string()))?;
    let recipients: Vec<String> = recipients_part
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if recipients.is_empty() || recipients.len() > tootik_common::limits::MAX_RECIPIENTS {
        return Err(AppError::BadInput("invalid recipient count".to_string()));
    }
    validate_post_body(content)?;

    let aud = audience::for_new_post(Visibility::Dm, "", &recipients);
    let id = create_note(state, ctx, &viewer.id, content, &aud.to, &aud.cc, None).await?;

    writer.redirect(&redirect_target(ctx, &format!("/view/{}", path_of(&id)), state.domain()));
    Ok(())
}
handler_fn!(Dm, dm);

async fn reply(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let hostpath = params.first().ok_or_else(|| AppError::BadInput("missing post".to_string()))?;
    let parent_id = format!("https://{hostpath}");
    let parent = state.notes.get_by_id(&parent_id).await?;

    let content = take_input(ctx)?;

    if parent.object_type == note::ObjectType::Question {
        let options: Vec<String> = parent
            .object
            .get("anyOf")
            .or_else(|| parent.object.get("oneOf"))
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|o| o.get("name").and_then(|n| n.as_str()).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        let closed = parent.object.get("closed").or_else(|| parent.object.get("endTime")).is_some()
            && Utc::now().timestamp()
                > parent
                    .object
                    .get("endTime")
                    .and_then(|v| v.as_str())
                    .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                    .map(|d| d.timestamp())
                    .unwrap_or(i64::MAX);
        if closed {
            return Err(AppError::BadInput("poll closed".to_string()));
        }
        if !options.iter().any(|o| o == &content) {
            return Err(AppError::BadInput("not a valid option".to_string()));
        }
        let id = create_vote(state, ctx, &viewer.id, &parent_id, &parent.author, &content).await?;
        writer.redirect(&redirect_target(ctx, &format!("/view/{}", path_of(&id)), state.domain()));
        return Ok(());
    }

    check_post_throttle(state, &viewer.id).await?;
    validate_post_body(&content)?;

    let shape = audience::classify_parent(
        &parent.author,
        &viewer.id,
        &parent.to().into_iter().map(str::to_string).collect::<Vec<_>>(),
        &parent.cc().into_iter().map(str::to_string).collect::<Vec<_>>(),
    );
    let followers_url = viewer
        .followers_collection_url
        .clone()
        .unwrap_or_else(|| format!("{}/followers", viewer.id));
    let aud = audience::for_reply(
        shape,
        &parent.author,
        &parent.to().into_iter().map(str::to_string).collect::<Vec<_>>(),
        &parent.cc().into_iter().map(str::to_string).collect::<Vec<_>>(),
        &followers_url,
    );

    let id = create_note(state, ctx, &viewer.id, &content, &aud.to, &aud.cc, Some(&parent_id)).await?;
    writer.redirect(&redirect_target(ctx, &format!("/view/{}", path_of(&id)), state.domain()));
    Ok(())
}
handler_fn!(Reply, reply);

/// A poll vote: a reply with empty content and `name` set to the chosen
/// option, addressed privately to the poll's author only.
async fn create_vote(
    state: &AppState,
    ctx: &RequestContext,
    voter_id: &str,
    poll_id: &str,
    poll_author: &str,
    option: &str,
) -> AppResult<String> {
    let now = Utc::now().timestamp();
    let id = tootik_common::IdGenerator::stable_post_id(state.domain(), voter_id, option, now);

    let object = json!({
        "id": id,
        "type": "Note",
        "attributedTo": voter_id,
        "content": "",
        "name": option,
        "to": [poll_author],
        "cc": [],
        "inReplyTo": poll_id,
        "published": Utc::now().to_rfc3339(),
    });

    let model = note::ActiveModel {
        id: sea_orm::ActiveValue::Set(id.clone()),
        author: sea_orm::ActiveValue::Set(voter_id.to_string()),
        object: sea_orm::ActiveValue::Set(object.clone()),
        object_type: sea_orm::ActiveValue::Set(note::ObjectType::Note),
        in_reply_to: sea_orm::ActiveValue::Set(Some(poll_id.to_string())),
        group_id: sea_orm::ActiveValue::Set(None),
        to0: sea_orm::ActiveValue::Set(Some(poll_author.to_string())),
        to1: sea_orm::ActiveValue::Set(None),
        to2: sea_orm::ActiveValue::Set(None),
        cc0: sea_orm::ActiveValue::Set(None),
        cc1: sea_orm::ActiveValue::Set(None),
        cc2: sea_orm::ActiveValue::Set(None),
        public: sea_orm::ActiveValue::Set(false),
        host: sea_orm::ActiveValue::Set(None),
        inserted: sea_orm::ActiveValue::Set(now),
    };
    state.notes.create(model).await?;

    let keys = state.actor_keys(voter_id).await?;
    state.inbox.create(ctx, &keys, object).await?;
    Ok(id)
}

async fn edit(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let hostpath = params.first().ok_or_else(|| AppError::BadInput("missing post".to_string()))?;
    let note_id = format!("https://{hostpath}");
    let existing = state.notes.get_by_id(&note_id).await?;

    if existing.author != viewer.id {
        return Err(AppError::NotFound("post".to_string()));
    }
    if existing.object_type == note::ObjectType::Question || existing.object.get("name").is_some() {
        return Err(AppError::BadInput("polls and votes cannot be edited".to_string()));
    }

    let content = take_input(ctx)?;
    validate_post_body(&content)?;

    let original = Audience {
        to: existing.to().into_iter().map(str::to_string).collect(),
        cc: existing.cc().into_iter().map(str::to_string).collect(),
    };
    // Edits never narrow the audience; the content-only form below always
    // passes this, so the check stands guard against a future field that does.
    let edited = original.clone();
    if !audience::is_valid_edit_audience(&original, &edited) {
        return Err(AppError::BadInput("edit may not narrow the audience".to_string()));
    }

    let mut object = existing.object.clone();
    object["content"] = json!(content);
    object["edited"] = json!(true);
    object["updated"] = json!(Utc::now().to_rfc3339());

    let model = note::ActiveModel {
        id: sea_orm::ActiveValue::Unchanged(note_id.clone()),
        object: sea_orm::ActiveValue::Set(object.clone()),
        ..Default::default()
    };
    state.notes.update(fill_unchanged(model, &existing)).await?;

    let keys = state.actor_keys(&viewer.id).await?;
    state.inbox.update_note(ctx, &keys, object).await?;

    writer.redirect(&redirect_target(ctx, &format!("/view/{}", path_of(&note_id)), state.domain()));
    Ok(())
}
handler_fn!(Edit, edit);

/// sea-orm's `Default` `ActiveModel` leaves every other column `NotSet`;
/// an `update()` call needs the unchanged columns carried along so the
/// generated `UPDATE` doesn't null them out.
fn fill_unchanged(mut model: note::ActiveModel, existing: &note::Model) -> note::ActiveModel {
    model.author = sea_orm::ActiveValue::Unchanged(existing.author.clone());
    model.object_type = sea_orm::ActiveValue::Unchanged(existing.object_type);
    model.in_reply_to = sea_orm::ActiveValue::Unchanged(existing.in_reply_to.clone());
    model.group_id = sea_orm::ActiveValue::Unchanged(existing.group_id.clone());
    model.to0 = sea_orm::ActiveValue::Unchanged(existing.to0.clone());
    model.to1 = sea_orm::ActiveValue::Unchanged(existing.to1.clone());
    model.to2 = sea_orm::ActiveValue::Unchanged(existing.to2.clone());
    model.cc0 = sea_orm::ActiveValue::Unchanged(existing.cc0.clone());
    model.cc1 = sea_orm::ActiveValue::Unchanged(existing.cc1.clone());
    model.cc2 = sea_orm::ActiveValue::Unchanged(existing.cc2.clone());
    model.public = sea_orm::ActiveValue::Unchanged(existing.public);
    model.host = sea_orm::ActiveValue::Unchanged(existing.host.clone());
    model.inserted = sea_orm::ActiveValue::Unchanged(existing.inserted);
    model
}

async fn delete(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let hostpath = params.first().ok_or_else(|| AppError::BadInput("missing post".to_string()))?;
    let note_id = format!("https://{hostpath}");
    let existing = state.notes.get_by_id(&note_id).await?;

    if existing.author != viewer.id {
        return Err(AppError::NotFound("post".to_string()));
    }

    let keys = state.actor_keys(&viewer.id).await?;
    state.inbox.delete(ctx, &keys, &note_id).await?;
    state.notes.delete(&note_id).await?;

    writer.redirect(&redirect_target(ctx, "/users", state.domain()));
    Ok(())
}
handler_fn!(Delete, delete);

async fn share_handler(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let hostpath = params.first().ok_or_else(|| AppError::BadInput("missing post".to_string()))?;
    let note_id = format!("https://{hostpath}");
    let target = state.notes.get_by_id(&note_id).await?;

    if !target.public {
        return Err(AppError::BadInput("only public posts can be shared".to_string()));
    }
    if target.author == viewer.id {
        return Err(AppError::BadInput("cannot share your own post".to_string()));
    }
    if state.shares.exists(&viewer.id, &note_id).await? {
        return Err(AppError::BadInput("already shared".to_string()));
    }

    let now = Utc::now().timestamp();
    let activity_id = tootik_common::IdGenerator::stable_activity_id(state.domain(), "Announce", &viewer.id, &note_id);
    let model = share::ActiveModel {
        id: sea_orm::ActiveValue::Set(activity_id),
        by: sea_orm::ActiveValue::Set(viewer.id.clone()),
        note: sea_orm::ActiveValue::Set(note_id.clone()),
        inserted: sea_orm::ActiveValue::Set(now),
    };
    state.shares.create(model).await?;

    let keys = state.actor_keys(&viewer.id).await?;
    state.inbox.announce(ctx, &keys, &note_id).await?;

    writer.redirect(&redirect_target(ctx, &format!("/view/{}", path_of(&note_id)), state.domain()));
    Ok(())
}
handler_fn!(Share, share_handler);

async fn unshare(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let hostpath = params.first().ok_or_else(|| AppError::BadInput("missing post".to_string()))?;
    let note_id = format!("https://{hostpath}");
    let existing = state
        .shares
        .find(&viewer.id, &note_id)
        .await?
        .ok_or_else(|| AppError::NotFound("share".to_string()))?;

    let keys = state.actor_keys(&viewer.id).await?;
    state.inbox.undo(ctx, &keys, &existing.id).await?;
    state.shares.delete(&existing.id).await?;

    writer.redirect(&redirect_target(ctx, &format!("/view/{}", path_of(&note_id)), state.domain()));
    Ok(())
}
handler_fn!(Unshare, unshare);

async fn bookmark(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let hostpath = params.first().ok_or_else(|| AppError::BadInput("missing post".to_string()))?;
    let note_id = format!("https://{hostpath}");
    let _ = state.notes.get_by_id(&note_id).await?;

    if state.bookmarks.count_for(&viewer.id).await? >= tootik_common::limits::MAX_BOOKMARKS_PER_USER as u64 {
        return Err(AppError::QuotaReached("bookmark limit".to_string()));
    }
    if let Some(most_recent) = state.bookmarks.most_recent_for(&viewer.id).await? {
        let now = Utc::now().timestamp();
        if now - most_recent.inserted < MIN_BOOKMARK_INTERVAL.as_secs() as i64 {
            return Err(AppError::Throttled("a moment".to_string()));
        }
    }

    let id = state.ids.generate();
    let model = bookmark::ActiveModel {
        id: sea_orm::ActiveValue::Set(id),
        by: sea_orm::ActiveValue::Set(viewer.id.clone()),
        note: sea_orm::ActiveValue::Set(note_id.clone()),
        inserted: sea_orm::ActiveValue::Set(Utc::now().timestamp()),
    };
    state.bookmarks.create(model).await?;

    writer.redirect(&redirect_target(ctx, &format!("/view/{}", path_of(&note_id)), state.domain()));
    Ok(())
}
handler_fn!(Bookmark, bookmark);

async fn unbookmark(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let hostpath = params.first().ok_or_else(|| AppError::BadInput("missing post".to_string()))?;
    let note_id = format!("https://{hostpath}");
    let existing = state
        .bookmarks
        .find(&viewer.id, &note_id)
        .await?
        .ok_or_else(|| AppError::NotFound("bookmark".to_string()))?;
    state.bookmarks.delete(&existing.id).await?;

    writer.redirect(&redirect_target(ctx, &format!("/view/{}", path_of(&note_id)), state.domain()));
    Ok(())
}
handler_fn!(Unbookmark, unbookmark);

async fn follow_handler(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let hostpath = params.first().ok_or_else(|| AppError::BadInput("missing actor".to_string()))?;
    let target_id = format!("https://{hostpath}");
    let _ = state.persons.get_by_id(&target_id).await?;

    if state.follows.find(&viewer.id, &target_id).await?.is_some() {
        return Err(AppError::BadInput("already following or pending".to_string()));
    }

    let id = tootik_common::IdGenerator::stable_activity_id(state.domain(), "Follow", &viewer.id, &target_id);
    let model = follow::ActiveModel {
        id: sea_orm::ActiveValue::Set(id.clone()),
        follower: sea_orm::ActiveValue::Set(viewer.id.clone()),
        followed: sea_orm::ActiveValue::Set(target_id.clone()),
        accepted: sea_orm::ActiveValue::Set(None),
        inserted: sea_orm::ActiveValue::Set(Utc::now().timestamp()),
    };
    state.follows.create(model).await?;

    let keys = state.actor_keys(&viewer.id).await?;
    state.inbox.follow(ctx, &keys, &target_id).await?;

    writer.redirect(&redirect_target(ctx, &format!("/users/outbox/{hostpath}"), state.domain()));
    Ok(())
}
handler_fn!(Follow, follow_handler);

async fn accept(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let hostpath = params.first().ok_or_else(|| AppError::BadInput("missing actor".to_string()))?;
    let follower_id = format!("https://{hostpath}");
    let mut existing = state
        .follows
        .find(&follower_id, &viewer.id)
        .await?
        .ok_or_else(|| AppError::NotFound("follow request".to_string()))?;
    if existing.accepted == Some(true) {
        return Err(AppError::BadInput("already accepted".to_string()));
    }

    let follow_id = existing.id.clone();
    existing.accepted = Some(true);
    let model = follow::ActiveModel {
        id: sea_orm::ActiveValue::Unchanged(follow_id.clone()),
        follower: sea_orm::ActiveValue::Unchanged(existing.follower),
        followed: sea_orm::ActiveValue::Unchanged(existing.followed),
        accepted: sea_orm::ActiveValue::Set(Some(true)),
        inserted: sea_orm::ActiveValue::Unchanged(existing.inserted),
    };
    state.follows.update(model).await?;

    let keys = state.actor_keys(&viewer.id).await?;
    state.inbox.accept(ctx, &keys, &follow_id).await?;

    writer.redirect(&redirect_target(ctx, &format!("/users/outbox/{hostpath}"), state.domain()));
    Ok(())
}
handler_fn!(Accept, accept);

async fn reject(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let hostpath = params.first().ok_or_else(|| AppError::BadInput("missing actor".to_string()))?;
    let follower_id = format!("https://{hostpath}");
    let existing = state
        .follows
        .find(&follower_id, &viewer.id)
        .await?
        .ok_or_else(|| AppError::NotFound("follow request".to_string()))?;

    let keys = state.actor_keys(&viewer.id).await?;
    state.inbox.undo(ctx, &keys, &existing.id).await?;
    state.follows.delete(&existing.id).await?;

    writer.redirect(&redirect_target(ctx, &format!("/users/outbox/{hostpath}"), state.domain()));
    Ok(())
}
handler_fn!(Reject, reject);

async fn unfollow(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let hostpath = params.first().ok_or_else(|| AppError::BadInput("missing actor".to_string()))?;
    let target_id = format!("https://{hostpath}");
    let existing = state
        .follows
        .find(&viewer.id, &target_id)
        .await?
        .ok_or_else(|| AppError::NotFound("follow".to_string()))?;

    let keys = state.actor_keys(&viewer.id).await?;
    state.inbox.undo(ctx, &keys, &existing.id).await?;
    state.follows.delete(&existing.id).await?;

    writer.redirect(&redirect_target(ctx, &format!("/users/outbox/{hostpath}"), state.domain()));
    Ok(())
}
handler_fn!(Unfollow, unfollow);

/// Strips the `https://` scheme from an id for use in a local path.
fn path_of(id: &str) -> String {
    id.trim_start_matches("https://").trim_start_matches("http://").to_string()
}
