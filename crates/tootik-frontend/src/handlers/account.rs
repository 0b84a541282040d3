//! Account-management handlers: registration from a client certificate,
//! profile edits (bio, display name, aliases, metadata, TTL), certificate
//! approval/revocation, data export, and the settings overview page.

use chrono::Utc;
use serde_json::json;
use tootik_common::limits::{
    CERTIFICATE_APPROVAL_TIMEOUT, MAX_BIO_LENGTH, MAX_DISPLAY_NAME_LENGTH, MAX_METADATA_FIELDS,
    MIN_ACTOR_EDIT_INTERVAL,
};
use tootik_common::{certificate_hash, AppError, AppResult, StatusFamily, Writer};
use tootik_core::collab::{Actor, RequestContext};
use tootik_db::entities::{certificate, person};

use crate::dispatch::{handler_fn, redirect_target};
use crate::state::AppState;

fn require_viewer<'a>(ctx: &'a RequestContext) -> AppResult<&'a Actor> {
    ctx.viewer.as_ref().ok_or(AppError::AuthRequired)
}

fn rune_len(s: &str) -> usize {
    s.chars().count()
}

/// Validates a titan upload's declared size/mime before the caller reads
/// `ctx.raw_query`; a no-op for a plain query-string input. Mirrors the
/// write-side gate's own titan check, for the `bio`/`avatar` upload targets.
fn check_titan_upload(ctx: &RequestContext) -> AppResult<()> {
    if !ctx.titan {
        return Ok(());
    }
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
    Ok(())
}

/// Loads the authenticated actor's full row, for the profile fields
/// [`tootik_core::collab::Actor`] doesn't carry.
async fn load_self(state: &AppState, viewer: &Actor) -> AppResult<person::Model> {
    state.persons.get_by_id(&viewer.id).await
}

/// Step shared by every profile-edit handler: enforces `MinActorEditInterval`
/// against the row's current `updated`, then persists the given mutation and
/// announces it over the `Inbox` collaborator.
async fn commit_edit(
    state: &AppState,
    ctx: &RequestContext,
    existing: person::Model,
    mutate: impl FnOnce(&mut person::ActiveModel),
) -> AppResult<()> {
    let now = Utc::now();
    if now.timestamp() - existing.updated.timestamp() < MIN_ACTOR_EDIT_INTERVAL.as_secs() as i64 {
        return Err(AppError::Throttled("before editing your profile again".to_string()));
    }

    let mut model = person::ActiveModel {
        id: sea_orm::ActiveValue::Unchanged(existing.id.clone()),
        preferred_username: sea_orm::ActiveValue::Unchanged(existing.preferred_username.clone()),
        host: sea_orm::ActiveValue::Unchanged(existing.host.clone()),
        display_name: sea_orm::ActiveValue::Unchanged(existing.display_name.clone()),
        summary: sea_orm::ActiveValue::Unchanged(existing.summary.clone()),
        icon_url: sea_orm::ActiveValue::Unchanged(existing.icon_url.clone()),
        attachments: sea_orm::ActiveValue::Unchanged(existing.attachments.clone()),
        actor_type: sea_orm::ActiveValue::Unchanged(existing.actor_type),
        followers_collection_url: sea_orm::ActiveValue::Unchanged(existing.followers_collection_url.clone()),
        ttl_days: sea_orm::ActiveValue::Unchanged(existing.ttl_days),
        moved_to: sea_orm::ActiveValue::Unchanged(existing.moved_to.clone()),
        also_known_as: sea_orm::ActiveValue::Unchanged(existing.also_known_as.clone()),
        published: sea_orm::ActiveValue::Unchanged(existing.published),
        updated: sea_orm::ActiveValue::Set(now.into()),
    };
    mutate(&mut model);
    state.persons.update(model).await?;

    let keys = state.actor_keys(&existing.id).await?;
    state.inbox.update_actor(ctx, &keys).await?;
    Ok(())
}

/// Registers a local actor from the presented client certificate's Common
/// Name, optionally redeeming an invite code passed as the query input.
async fn register(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    if ctx.viewer.is_some() {
        return Err(AppError::BadInput("already registered".to_string()));
    }
    let der = ctx.client_cert_der.as_ref().ok_or(AppError::AuthRequired)?;
    let cn = ctx.client_cert_cn.as_deref().ok_or(AppError::AuthRequired)?;

    let username: String = cn
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase();
    if username.is_empty() || username.len() > 32 {
        return Err(AppError::BadInput("certificate CN is not a usable username".to_string()));
    }
    if state.persons.find_local_by_username(&username).await?.is_some() {
        return Err(AppError::BadInput("username taken".to_string()));
    }

    let hash = certificate_hash(der);
    if state.certificates.find_by_hash(&hash).await?.is_some() {
        return Err(AppError::BadInput("certificate already registered".to_string()));
    }

    let invite_code = ctx.raw_query.trim();
    let invite = if invite_code.is_empty() {
        None
    } else {
        let invite = state
            .invites
            .find_by_code(invite_code)
            .await?
            .ok_or_else(|| AppError::BadInput("invalid invite code".to_string()))?;
        if invite.invited.is_some() {
            return Err(AppError::BadInput("invite already used".to_string()));
        }
        Some(invite)
    };

    let id = state.local_actor_id(&username);
    let now = Utc::now();
    let person_model = person::ActiveModel {
        id: sea_orm::ActiveValue::Set(id.clone()),
        preferred_username: sea_orm::ActiveValue::Set(username.clone()),
        host: sea_orm::ActiveValue::Set(None),
        display_name: sea_orm::ActiveValue::Set(None),
        summary: sea_orm::ActiveValue::Set(None),
        icon_url: sea_orm::ActiveValue::Set(None),
        attachments: sea_orm::ActiveValue::Set(json!({})),
        actor_type: sea_orm::ActiveValue::Set(person::ActorType::Person),
        followers_collection_url: sea_orm::ActiveValue::Set(Some(format!("{id}/followers"))),
        ttl_days: sea_orm::ActiveValue::Set(None),
        moved_to: sea_orm::ActiveValue::Set(None),
        also_known_as: sea_orm::ActiveValue::Set(json!([])),
        published: sea_orm::ActiveValue::Set(now.into()),
        updated: sea_orm::ActiveValue::Set(now.into()),
    };
    state.persons.create(person_model).await?;

    let cert_model = certificate::ActiveModel {
        hash: sea_orm::ActiveValue::Set(hash.clone()),
        user: sea_orm::ActiveValue::Set(id.clone()),
        inserted: sea_orm::ActiveValue::Set(now.timestamp()),
        expires: sea_orm::ActiveValue::Set(now.timestamp() + CERTIFICATE_APPROVAL_TIMEOUT.as_secs() as i64),
        approved: sea_orm::ActiveValue::Set(true),
    };
    state.certificates.create(cert_model).await?;

    if let Some(invite) = invite {
        let model = tootik_db::entities::invite::ActiveModel {
            code: sea_orm::ActiveValue::Unchanged(invite.code),
            inviter: sea_orm::ActiveValue::Unchanged(invite.inviter),
            invited: sea_orm::ActiveValue::Set(Some(username)),
            certhash: sea_orm::ActiveValue::Set(Some(hash)),
            inserted: sea_orm::ActiveValue::Unchanged(invite.inserted),
        };
        state.invites.update(model).await?;
    }

    writer.redirect(&redirect_target(ctx, "/users", state.domain()));
    Ok(())
}
handler_fn!(Register, register);

async fn bio(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    check_titan_upload(ctx)?;
    let input = ctx.raw_query.trim();
    if input.is_empty() {
        writer.status(StatusFamily::Input, "new bio");
        return Ok(());
    }
    if rune_len(input) > MAX_BIO_LENGTH {
        return Err(AppError::BadInput("bio too long".to_string()));
    }

    let existing = load_self(state, viewer).await?;
    let summary = input.to_string();
    commit_edit(state, ctx, existing, |m| {
        m.summary = sea_orm::ActiveValue::Set(Some(summary));
    })
    .await?;

    writer.redirect(&redirect_target(ctx, "/users/settings", state.domain()));
    Ok(())
}
handler_fn!(Bio, bio);

/// Sets the actor's icon URL from a submitted URL string. This instance
/// doesn't host avatar images itself; `icon_url` just points elsewhere.
async fn avatar(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    check_titan_upload(ctx)?;
    let input = ctx.raw_query.trim();
    if input.is_empty() {
        writer.status(StatusFamily::Input, "new avatar URL");
        return Ok(());
    }
    if !(input.starts_with("https://") || input.starts_with("http://")) {
        return Err(AppError::BadInput("expected an http(s) URL".to_string()));
    }

    let existing = load_self(state, viewer).await?;
    let icon_url = input.to_string();
    commit_edit(state, ctx, existing, |m| {
        m.icon_url = sea_orm::ActiveValue::Set(Some(icon_url));
    })
    .await?;

    writer.redirect(&redirect_target(ctx, "/users/settings", state.domain()));
    Ok(())
}
handler_fn!(Avatar, avatar);

async fn name(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let input = ctx.raw_query.trim();
    if input.is_empty() {
        writer.status(StatusFamily::Input, "new display name");
        return Ok(());
    }
    if rune_len(input) > MAX_DISPLAY_NAME_LENGTH {
        return Err(AppError::BadInput("display name too long".to_string()));
    }

    let existing = load_self(state, viewer).await?;
    let display_name = input.to_string();
    commit_edit(state, ctx, existing, |m| {
        m.display_name = sea_orm::ActiveValue::Set(Some(display_name));
    })
    .await?;

    writer.redirect(&redirect_target(ctx, "/users/settings", state.domain()));
    Ok(())
}
handler_fn!(Name, name);

/// Replaces the `alsoKnownAs` set with one actor id per non-blank input
/// line, ahead of a future `/users/move` to one of them.
async fn alias(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let input = ctx.raw_query.trim();
    if input.is_empty() {
        writer.status(StatusFamily::Input, "also-known-as actor ids, one per line");
        return Ok(());
    }

    let aliases: Vec<String> = input.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect();
    if aliases.len() > MAX_METADATA_FIELDS {
        return Err(AppError::BadInput("too many aliases".to_string()));
    }

    let existing = load_self(state, viewer).await?;
    commit_edit(state, ctx, existing, |m| {
        m.also_known_as = sea_orm::ActiveValue::Set(json!(aliases));
    })
    .await?;

    writer.redirect(&redirect_target(ctx, "/users/settings", state.domain()));
    Ok(())
}
handler_fn!(Alias, alias);

/// Points this actor at `target`, which must already be listed in
/// `alsoKnownAs` — the one-sided half of a `Move` this instance can verify
/// without resolving the target actor's own aliases.
async fn move_account(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let target = ctx.raw_query.trim();
    if target.is_empty() {
        writer.status(StatusFamily::Input, "target actor id");
        return Ok(());
    }

    let existing = load_self(state, viewer).await?;
    if existing.moved_to.is_some() {
        return Err(AppError::BadInput("account already moved".to_string()));
    }
    let known_aliases: Vec<String> = existing
        .also_known_as
        .as_array()
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    if !known_aliases.iter().any(|a| a == target) {
        return Err(AppError::BadInput("target must first be registered via /users/alias".to_string()));
    }

    let target = target.to_string();
    commit_edit(state, ctx, existing, |m| {
        m.moved_to = sea_orm::ActiveValue::Set(Some(target));
    })
    .await?;

    writer.redirect(&redirect_target(ctx, "/users/settings", state.domain()));
    Ok(())
}
handler_fn!(Move, move_account);

fn metadata_object(existing: &person::Model) -> serde_json::Map<String, serde_json::Value> {
    existing.attachments.as_object().cloned().unwrap_or_default()
}

async fn metadata(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let existing = load_self(state, viewer).await?;
    let fields = metadata_object(&existing);

    writer.ok("text/gemini");
    writer.title(1, "Profile metadata");
    if fields.is_empty() {
        writer.text("No metadata fields set.");
    } else {
        for (key, value) in &fields {
            writer.textf(format_args!("{key} = {}", value.as_str().unwrap_or_default()));
        }
    }
    writer.link("/users/metadata/add", "Add a field");
    writer.link("/users/metadata/remove", "Remove a field");
    writer.link("/users/metadata/clear", "Clear all fields");
    Ok(())
}
handler_fn!(Metadata, metadata);

async fn metadata_add(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let input = ctx.raw_query.trim();
    if input.is_empty() {
        writer.status(StatusFamily::Input, "key = value");
        return Ok(());
    }
    let (key, value) = tootik_core::regexes::parse_metadata_line(input)
        .ok_or_else(|| AppError::BadInput("expected key = value".to_string()))?;

    let existing = load_self(state, viewer).await?;
    let mut fields = metadata_object(&existing);
    if !fields.contains_key(&key) && fields.len() >= MAX_METADATA_FIELDS {
        return Err(AppError::QuotaReached("metadata field limit".to_string()));
    }
    fields.insert(key, json!(value));

    commit_edit(state, ctx, existing, |m| {
        m.attachments = sea_orm::ActiveValue::Set(serde_json::Value::Object(fields));
    })
    .await?;

    writer.redirect(&redirect_target(ctx, "/users/metadata", state.domain()));
    Ok(())
}
handler_fn!(MetadataAdd, metadata_add);

async fn metadata_remove(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let key = ctx.raw_query.trim();
    if key.is_empty() {
        writer.status(StatusFamily::Input, "field name to remove");
        return Ok(());
    }

    let existing = load_self(state, viewer).await?;
    let mut fields = metadata_object(&existing);
    if fields.remove(key).is_none() {
        return Err(AppError::NotFound("metadata field".to_string()));
    }

    commit_edit(state, ctx, existing, |m| {
        m.attachments = sea_orm::ActiveValue::Set(serde_json::Value::Object(fields));
    })
    .await?;

    writer.redirect(&redirect_target(ctx, "/users/metadata", state.domain()));
    Ok(())
}
handler_fn!(MetadataRemove, metadata_remove);

async fn metadata_clear(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let existing = load_self(state, viewer).await?;
    commit_edit(state, ctx, existing, |m| {
        m.attachments = sea_orm::ActiveValue::Set(json!({}));
    })
    .await?;

    writer.redirect(&redirect_target(ctx, "/users/metadata", state.domain()));
    Ok(())
}
handler_fn!(MetadataClear, metadata_clear);

async fn ttl(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let input = ctx.raw_query.trim();
    if input.is_empty() {
        writer.status(StatusFamily::Input, "TTL in days, or 0 to clear");
        return Ok(());
    }
    let days: i32 = input.parse().map_err(|_| AppError::BadInput("expected a number of days".to_string()))?;
    if days < 0 {
        return Err(AppError::BadInput("TTL cannot be negative".to_string()));
    }

    let existing = load_self(state, viewer).await?;
    commit_edit(state, ctx, existing, |m| {
        m.ttl_days = sea_orm::ActiveValue::Set(if days == 0 { None } else { Some(days) });
    })
    .await?;

    writer.redirect(&redirect_target(ctx, "/users/settings", state.domain()));
    Ok(())
}
handler_fn!(Ttl, ttl);

async fn certificates(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let certs = state.certificates.find_by_user(&viewer.id).await?;

    writer.ok("text/gemini");
    writer.title(1, "Certificates");
    if certs.is_empty() {
        writer.text("No certificates on file.");
    }
    for cert in certs {
        let status = if cert.approved { "approved" } else { "pending" };
        writer.textf(format_args!("{} ({status})", cert.hash));
        if !cert.approved {
            writer.link(&format!("/users/certificates/approve/{}", cert.hash), "Approve");
        }
        writer.link(&format!("/users/certificates/revoke/{}", cert.hash), "Revoke");
    }
    Ok(())
}
handler_fn!(Certificates, certificates);

async fn certificates_approve(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let hash = params.first().ok_or_else(|| AppError::BadInput("missing certificate hash".to_string()))?;
    let existing = state
        .certificates
        .find_by_hash(hash)
        .await?
        .ok_or_else(|| AppError::NotFound("certificate".to_string()))?;
    if existing.user != viewer.id {
        return Err(AppError::NotFound("certificate".to_string()));
    }

    let model = certificate::ActiveModel {
        hash: sea_orm::ActiveValue::Unchanged(existing.hash),
        user: sea_orm::ActiveValue::Unchanged(existing.user),
        inserted: sea_orm::ActiveValue::Unchanged(existing.inserted),
        expires: sea_orm::ActiveValue::Unchanged(existing.expires),
        approved: sea_orm::ActiveValue::Set(true),
    };
    state.certificates.update(model).await?;

    writer.redirect(&redirect_target(ctx, "/users/certificates", state.domain()));
    Ok(())
}
handler_fn!(CertificatesApprove, certificates_approve);

async fn certificates_revoke(
    state: &AppState,
    ctx: &RequestContext,
    params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let hash = params.first().ok_or_else(|| AppError::BadInput("missing certificate hash".to_string()))?;
    let existing = state
        .certificates
        .find_by_hash(hash)
        .await?
        .ok_or_else(|| AppError::NotFound("certificate".to_string()))?;
    if existing.user != viewer.id {
        return Err(AppError::NotFound("certificate".to_string()));
    }
    state.certificates.delete(hash).await?;

    writer.redirect(&redirect_target(ctx, "/users/certificates", state.domain()));
    Ok(())
}
handler_fn!(CertificatesRevoke, certificates_revoke);

/// Dumps the authenticated actor's profile and outbox as JSON, the one
/// machine-readable surface in an otherwise line-oriented protocol.
async fn export(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let existing = load_self(state, viewer).await?;
    let notes = state.notes.find_by_author(&viewer.id, 0).await?;

    let export = json!({
        "actor": {
            "id": existing.id,
            "preferredUsername": existing.preferred_username,
            "displayName": existing.display_name,
            "summary": existing.summary,
            "attachments": existing.attachments,
            "alsoKnownAs": existing.also_known_as,
            "movedTo": existing.moved_to,
            "ttlDays": existing.ttl_days,
        },
        "notes": notes.into_iter().map(|n| n.object).collect::<Vec<_>>(),
    });

    writer.ok("application/json");
    writer.raw(serde_json::to_vec_pretty(&export).map_err(|e| AppError::Internal(e.to_string()))?.as_slice());
    Ok(())
}
handler_fn!(Export, export);

async fn settings(
    state: &AppState,
    ctx: &RequestContext,
    _params: &[String],
    writer: &mut dyn Writer,
) -> AppResult<()> {
    let viewer = require_viewer(ctx)?;
    let existing = load_self(state, viewer).await?;

    writer.ok("text/gemini");
    writer.title(1, "Settings");
    writer.textf(format_args!("Username: {}", existing.preferred_username));
    writer.textf(format_args!("Display name: {}", existing.display_name.as_deref().unwrap_or("(none)")));
    writer.textf(format_args!("Bio: {}", existing.summary.as_deref().unwrap_or("(none)")));
    writer.textf(format_args!(
        "TTL: {}",
        existing.ttl_days.map(|d| format!("{d} days")).unwrap_or_else(|| "(none)".to_string())
    ));
    if let Some(moved_to) = &existing.moved_to {
        writer.textf(format_args!("Moved to: {moved_to}"));
    }

    writer.subtitle("Edit");
    writer.link("/users/bio", "Edit bio");
    writer.link("/users/avatar", "Edit avatar");
    writer.link("/users/name", "Edit display name");
    writer.link("/users/alias", "Manage aliases");
    writer.link("/users/move", "Move account");
    writer.link("/users/metadata", "Profile metadata");
    writer.link("/users/ttl", "Post expiry (TTL)");
    writer.link("/users/certificates", "Certificates");
    writer.link("/users/export", "Export my data");
    Ok(())
}
handler_fn!(Settings, settings);
