//! The viewer-predicate that decides whether an actor may read a note.
//! Expressed once here and reused by every caller instead of being
//! re-derived per handler.

use tootik_common::limits::PUBLIC_URI;
use tootik_db::entities::note;

/// Minimal view of the state the predicate needs from the follow graph:
/// the ids of groups/actors `viewer` follows with `accepted = true`, plus
/// each such actor's `followers` collection URL, plus the set of note ids
/// `viewer`'s followed actors have reshared into a group audience.
#[derive(Debug, Clone, Default)]
pub struct ViewerContext {
    pub followed_followers_urls: Vec<String>,
    pub followed_group_shares: Vec<String>,
}

/// Clause 1/2/3 use only the note row and the viewer id; clause 4 needs
/// `ctx`. Returns `true` iff any of the four audience conditions holds.
#[must_use]
pub fn can_view(note: &note::Model, viewer: Option<&str>, ctx: &ViewerContext) -> bool {
    if note.public {
        return true;
    }

    let Some(viewer) = viewer else {
        return false;
    };

    if note.author == viewer {
        return true;
    }

    if note.audience().iter().any(|addr| *addr == viewer) {
        return true;
    }

    if note.needs_json_scan_fallback() && object_addresses(note, viewer) {
        return true;
    }

    let audience = note.audience();
    if ctx
        .followed_followers_urls
        .iter()
        .any(|url| audience.iter().any(|addr| addr == url))
    {
        return true;
    }

    ctx.followed_group_shares.iter().any(|id| id == &note.id)
}

/// Whether the raw `object` JSON addresses `viewer` directly, used only
/// when the denormalized `to2`/`cc2` slots are full.
fn object_addresses(note: &note::Model, viewer: &str) -> bool {
    let scan = |key: &str| {
        note.object
            .get(key)
            .and_then(|v| v.as_array())
            .is_some_and(|arr| arr.iter().any(|v| v.as_str() == Some(viewer)))
    };
    scan("to") || scan("cc")
}

/// Whether `addresses` (a `to` or `cc` list) marks a note public.
#[must_use]
pub fn addresses_are_public(addresses: &[&str]) -> bool {
    addresses.iter().any(|a| *a == PUBLIC_URI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn note_with(public: bool, author: &str, to0: Option<&str>) -> note::Model {
        note::Model {
            id: "https://example.com/post/1".to_string(),
            author: author.to_string(),
            object: json!({}),
            object_type: note::ObjectType::Note,
            in_reply_to: None,
            group_id: None,
            to0: to0.map(str::to_string),
            to1: None,
            to2: None,
            cc0: None,
            cc1: None,
            cc2: None,
            public,
            host: None,
            inserted: 0,
        }
    }

    #[test]
    fn public_note_is_visible_to_anyone() {
        let n = note_with(true, "https://a", None);
        assert!(can_view(&n, None, &ViewerContext::default()));
    }

    #[test]
    fn private_note_hidden_from_stranger() {
        let n = note_with(false, "https://a", None);
        assert!(!can_view(&n, Some("https://stranger"), &ViewerContext::default()));
    }

    #[test]
    fn author_always_sees_own_note() {
        let n = note_with(false, "https://a", None);
        assert!(can_view(&n, Some("https://a"), &ViewerContext::default()));
    }

    #[test]
    fn direct_recipient_sees_note() {
        let n = note_with(false, "https://a", Some("https://bob"));
        assert!(can_view(&n, Some("https://bob"), &ViewerContext::default()));
    }

    #[test]
    fn follower_of_addressed_group_sees_note() {
        let n = note_with(false, "https://a", Some("https://a/followers"));
        let ctx = ViewerContext {
            followed_followers_urls: vec!["https://a/followers".to_string()],
            followed_group_shares: vec![],
        };
        assert!(can_view(&n, Some("https://bob"), &ctx));
    }
}
