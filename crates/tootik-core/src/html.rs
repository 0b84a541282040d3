//! HTML-to-plain-text compaction (`getTextAndLinks`). Turns
//! arbitrary fediverse HTML content into word-wrapped plain text plus an
//! ordered map of the links it referenced.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("static pattern"));
static BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</p\s*>|<br\s*/?>").expect("static pattern"));
static ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s+[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#).expect("static pattern")
});

/// Plain-text body plus the ordered, deduplicated links the original HTML
/// referenced (anchor text keyed by URL, insertion order preserved —
/// rendering order is observable, so a plain hash map is not used here).
pub struct Compacted {
    pub text: String,
    pub links: IndexMap<String, String>,
}

/// Marker inserted when content was cut by a rune or line budget.
const ELLIPSIS: &str = "[…]";

/// Converts `html` to plain text and collects its links, then word-wraps to
/// `max_runes - 6` runes and truncates to `max_lines` lines. A `max_runes`
/// of `0` or less disables the rune cap; likewise for `max_lines`.
#[must_use]
pub fn get_text_and_links(html: &str, max_runes: usize, max_lines: usize) -> Compacted {
    let mut links = IndexMap::new();

    let with_links_replaced = ANCHOR.replace_all(html, |caps: &regex::Captures<'_>| {
        let href = caps[1].to_string();
        let anchor_text = strip_tags(&caps[2]);
        links.entry(href).or_insert_with(|| anchor_text.clone());
        anchor_text
    });

    let broken = BREAK.replace_all(&with_links_replaced, "\n\n");
    let stripped = strip_tags(&broken);
    let unescaped = unescape_entities(&stripped);
    let collapsed = collapse_blank_runs(&unescaped);

    let wrapped = if max_runes > 6 {
        word_wrap(&collapsed, max_runes - 6)
    } else {
        collapsed
    };

    let text = if max_lines > 0 {
        truncate_lines(&wrapped, max_lines)
    } else {
        wrapped
    };

    Compacted { text, links }
}

fn strip_tags(s: &str) -> String {
    TAG.replace_all(s, "").to_string()
}

fn unescape_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
}

/// Collapses runs of two or more blank lines into a single `[…]` marker
/// line, so an HTML document padded with empty paragraphs doesn't blow the
/// line budget on whitespace.
fn collapse_blank_runs(s: &str) -> String {
    let mut out = Vec::new();
    let mut blank_run = 0usize;
    for line in s.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
        } else {
            if blank_run >= 2 {
                out.push(ELLIPSIS.to_string());
            } else if blank_run == 1 {
                out.push(String::new());
            }
            blank_run = 0;
            out.push(line.to_string());
        }
    }
    out.join("\n")
}

fn word_wrap(s: &str, width: usize) -> String {
    let mut out = String::new();
    for (i, paragraph) in s.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let mut col = 0usize;
        let mut first_word = true;
        for word in paragraph.split(' ') {
            let word_runes = word.chars().count();
            if !first_word && col + 1 + word_runes > width {
                out.push('\n');
                col = 0;
                first_word = true;
            }
            if !first_word {
                out.push(' ');
                col += 1;
            }
            out.push_str(word);
            col += word_runes;
            first_word = false;
        }
    }
    out
}

fn truncate_lines(s: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = s.lines().collect();
    if lines.len() <= max_lines {
        return s.to_string();
    }
    let mut kept: Vec<&str> = lines.into_iter().take(max_lines.saturating_sub(1)).collect();
    let mut out = kept.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(ELLIPSIS);
    kept.clear();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_within_budget_is_unchanged() {
        let c = get_text_and_links("hello world", 280, 4);
        assert_eq!(c.text, "hello world");
        assert!(c.links.is_empty());
    }

    #[test]
    fn strips_tags_and_collects_links() {
        let c = get_text_and_links(
            r#"<p>hi <a href="https://example.com">there</a></p>"#,
            280,
            4,
        );
        assert!(c.text.contains("hi there"));
        assert_eq!(c.links.get("https://example.com").unwrap(), "there");
    }

    #[test]
    fn unescapes_entities() {
        let c = get_text_and_links("a &amp; b &lt;3", 280, 4);
        assert_eq!(c.text, "a & b <3");
    }

    #[test]
    fn truncates_to_line_budget() {
        let c = get_text_and_links("one\ntwo\nthree\nfour\nfive", 280, 3);
        assert_eq!(c.text, "one\ntwo\n[…]");
    }

    #[test]
    fn link_order_preserved_on_repeat_url() {
        let c = get_text_and_links(
            r#"<a href="https://b.example">B</a> and <a href="https://a.example">A</a>"#,
            280,
            4,
        );
        let keys: Vec<&String> = c.links.keys().collect();
        assert_eq!(keys, vec!["https://b.example", "https://a.example"]);
    }
}
