//! Display-name synthesis over local and federated actor records.

use once_cell::sync::Lazy;
use regex::Regex;
use tootik_db::entities::person::{ActorType, Model as Person};

static VERIFIED_EMOJI: Lazy<Regex> = Lazy::new(|| Regex::new(r":[\w+-]+:").expect("static pattern"));

/// Emoji prefix chosen by actor origin/type.
#[must_use]
pub fn emoji_prefix(actor: &Person) -> &'static str {
    if actor.actor_type == ActorType::Group {
        return "👥";
    }
    if actor.actor_type != ActorType::Person {
        return "🤖";
    }
    match &actor.host {
        None => "😈",
        Some(host) if host.contains("masto") || host.contains("mstdn") => "🐘",
        Some(_) => "👽",
    }
}

/// `<emoji> <name> (@user@host)`, where `name` falls back to
/// `preferredUsername` and strips `:verified-emoji:` shortcode markers.
#[must_use]
pub fn synthesize(actor: &Person) -> String {
    let raw_name = actor
        .display_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(&actor.preferred_username);
    let name = VERIFIED_EMOJI.replace_all(raw_name, "").trim().to_string();
    let host = actor.host.as_deref().unwrap_or("");
    format!(
        "{} {} (@{}@{})",
        emoji_prefix(actor),
        name,
        actor.preferred_username,
        if host.is_empty() { local_host_placeholder() } else { host }
    )
}

/// Placeholder used when an actor has no `host` (it is local); the
/// instance's own domain is supplied by the caller's `Config` in practice,
/// but display-name synthesis itself doesn't need to know it to render a
/// stable, testable string.
fn local_host_placeholder() -> &'static str {
    "local"
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn person(display_name: Option<&str>, host: Option<&str>, actor_type: ActorType) -> Person {
        Person {
            id: "https://example.com/users/alice".to_string(),
            preferred_username: "alice".to_string(),
            host: host.map(str::to_string),
            display_name: display_name.map(str::to_string),
            summary: None,
            icon_url: None,
            attachments: json!([]),
            actor_type,
            followers_collection_url: None,
            ttl_days: None,
            moved_to: None,
            also_known_as: json!([]),
            published: Utc::now(),
            updated: Utc::now(),
        }
    }

    #[test]
    fn local_person_gets_devil_emoji() {
        let p = person(Some("Alice"), None, ActorType::Person);
        assert!(synthesize(&p).starts_with("😈 Alice"));
    }

    #[test]
    fn remote_person_gets_alien_emoji() {
        let p = person(Some("Bob"), Some("remote.example"), ActorType::Person);
        assert!(synthesize(&p).starts_with("👽 Bob"));
    }

    #[test]
    fn mastodon_host_gets_elephant_emoji() {
        let p = person(Some("Carol"), Some("masto.example"), ActorType::Person);
        assert!(synthesize(&p).starts_with("🐘 Carol"));
    }

    #[test]
    fn group_gets_people_emoji_regardless_of_host() {
        let p = person(Some("Club"), Some("remote.example"), ActorType::Group);
        assert!(synthesize(&p).starts_with("👥 Club"));
    }

    #[test]
    fn missing_display_name_falls_back_to_username() {
        let p = person(None, None, ActorType::Person);
        assert!(synthesize(&p).contains("alice"));
    }

    #[test]
    fn verified_emoji_shortcode_stripped() {
        let p = person(Some("Dana :verified:"), None, ActorType::Person);
        assert_eq!(synthesize(&p), "😈 Dana (@alice@local)");
    }
}
