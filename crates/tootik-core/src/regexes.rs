//! Mention/hashtag/poll/metadata patterns, compiled once.

use once_cell::sync::Lazy;
use regex::Regex;

/// `@user` or `@user@host[:port]`, not preceded by a word character.
pub static MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\B@(\w+)(?:@((?:\w+\.)+\w+(?::\d{1,5})?))?\b").expect("static pattern")
});

/// `#tag`, 1-32 word characters, not preceded by a word character.
pub static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\B#(\w{1,32})\b").expect("static pattern"));

/// `[POLL <prompt>] opt1 | opt2 | ...` (case-insensitive `POLL`).
pub static POLL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\[POLL\s+(.+)\s*\]\s*(.+)").expect("static pattern"));

/// `key = value` profile metadata line, at most 4 space-joined key tokens.
pub static METADATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^([^\s=\x00-\x1f]{1,16}(?: *[^\s=\x00-\x1f]{1,16}){0,3})=([^\x00-\x1f\r\n]{1,64})$")
        .expect("static pattern")
});

/// All distinct `@user[@host]` mentions found in `text`, in first-seen order.
#[must_use]
pub fn find_mentions(text: &str) -> Vec<(String, Option<String>)> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for caps in MENTION.captures_iter(text) {
        let user = caps[1].to_string();
        let host = caps.get(2).map(|m| m.as_str().to_string());
        let key = (user.clone(), host.clone());
        if seen.insert(key) {
            out.push((user, host));
        }
    }
    out
}

/// All distinct hashtags found in `text` (lowercased, without `#`), in
/// first-seen order.
#[must_use]
pub fn find_hashtags(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for caps in HASHTAG.captures_iter(text) {
        let tag = caps[1].to_lowercase();
        if seen.insert(tag.clone()) {
            out.push(tag);
        }
    }
    out
}

/// Parsed `[POLL prompt] opt1 | opt2` content, if `text` matches the shape.
pub struct PollDraft {
    pub prompt: String,
    pub options: Vec<String>,
}

/// Extracts a poll draft from `text`, requiring `2..=max_options` non-empty
/// options.
#[must_use]
pub fn parse_poll(text: &str, max_options: usize) -> Option<PollDraft> {
    let caps = POLL.captures(text)?;
    let prompt = caps[1].trim().to_string();
    let options: Vec<String> = caps[2]
        .split('|')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if options.len() < 2 || options.len() > max_options {
        return None;
    }
    Some(PollDraft { prompt, options })
}

/// Parses one `key = value` metadata line.
#[must_use]
pub fn parse_metadata_line(line: &str) -> Option<(String, String)> {
    let caps = METADATA.captures(line.trim_end())?;
    Some((caps[1].trim().to_string(), caps[2].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_with_and_without_host() {
        let found = find_mentions("hi @alice and @bob@example.com!");
        assert_eq!(
            found,
            vec![
                ("alice".to_string(), None),
                ("bob".to_string(), Some("example.com".to_string())),
            ]
        );
    }

    #[test]
    fn mention_does_not_match_email_like_text() {
        let found = find_mentions("foo@bar baz");
        assert!(found.is_empty());
    }

    #[test]
    fn hashtags_dedup_case_insensitively() {
        let found = find_hashtags("#Foo #foo #bar");
        assert_eq!(found, vec!["foo".to_string(), "bar".to_string()]);
    }

    #[test]
    fn poll_parses_prompt_and_options() {
        let draft = parse_poll("[POLL favorite color?] red | green | blue", 8).unwrap();
        assert_eq!(draft.prompt, "favorite color?");
        assert_eq!(draft.options, vec!["red", "green", "blue"]);
    }

    #[test]
    fn poll_rejects_single_option() {
        assert!(parse_poll("[POLL x] only", 8).is_none());
    }

    #[test]
    fn poll_rejects_too_many_options() {
        assert!(parse_poll("[POLL x] a | b | c | d", 3).is_none());
    }

    #[test]
    fn metadata_line_parses_key_value() {
        let (k, v) = parse_metadata_line("Pronouns = they/them").unwrap();
        assert_eq!(k, "Pronouns");
        assert_eq!(v, "they/them");
    }

    #[test]
    fn metadata_rejects_overlong_key() {
        assert!(parse_metadata_line(&format!("{}=v", "k".repeat(20))).is_none());
    }
}
