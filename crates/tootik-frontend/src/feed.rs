//! Paginated feed rendering: `showFeedPage` and the `PrintNotes` wrapper
//! every feed handler calls through.

use async_trait::async_trait;
use tootik_common::limits::{MAX_OFFSET, POSTS_PER_PAGE};
use tootik_common::{AppError, AppResult, Writer};
use tootik_core::visibility::can_view;
use tootik_db::entities::{note, person};

use crate::post::{self, PrintOptions};
use crate::state::AppState;

/// One feed row: a note alongside its author and, when the row is a
/// reshare, the actor who reshared it.
#[derive(Debug, Clone)]
pub struct FeedRow {
    pub note: note::Model,
    pub author: person::Model,
    pub sharer: Option<person::Model>,
}

/// Per-page row source a feed handler supplies to `show_feed_page`. Each
/// implementation owns its own filter (author, hashtag, viewer…) and knows
/// how to fetch one page at a given offset.
#[async_trait]
pub trait FeedQuery: Send + Sync {
    async fn fetch(&self, state: &AppState, offset: u64) -> AppResult<Vec<FeedRow>>;
}

/// Batches authors (and group resharers) for a page of notes already
/// fetched from one repository query.
pub async fn hydrate_rows(state: &AppState, notes: Vec<note::Model>) -> AppResult<Vec<FeedRow>> {
    let author_ids: Vec<String> = notes.iter().map(|n| n.author.clone()).collect();
    let authors = state.persons.find_by_ids(&author_ids).await?;

    let mut rows = Vec::with_capacity(notes.len());
    for n in notes {
        let Some(author) = authors.iter().find(|a| a.id == n.author).cloned() else {
            continue;
        };
        let sharer = match &n.group_id {
            Some(group_id) => state.persons.find_by_id(group_id).await?,
            None => None,
        };
        rows.push(FeedRow {
            note: n,
            author,
            sharer,
        });
    }
    Ok(rows)
}

/// Hydrates rows and re-applies the visibility predicate, for any feed
/// whose underlying query isn't already restricted to public notes (an
/// actor's outbox, bookmarks, hashtag search, mentions). Rows a concurrent
/// unfollow or a narrowed audience no longer covers are dropped silently,
/// the same way a direct `/view` request would 404 them.
pub async fn hydrate_and_filter(
    state: &AppState,
    notes: Vec<note::Model>,
    viewer: Option<&str>,
) -> AppResult<Vec<FeedRow>> {
    let refs: Vec<&note::Model> = notes.iter().collect();
    let ctx = state.viewer_context(viewer, &refs).await?;
    let visible: Vec<note::Model> = notes.into_iter().filter(|n| can_view(n, viewer, &ctx)).collect();
    hydrate_rows(state, visible).await
}

/// Parses a raw pagination query string (`r.URL.RawQuery`) into a
/// non-negative offset, rejecting anything past `MaxOffset`.
pub fn parse_offset(raw_query: &str) -> AppResult<u64> {
    if raw_query.is_empty() {
        return Ok(0);
    }
    let offset: i64 = raw_query
        .parse()
        .map_err(|_| AppError::BadInput("invalid offset".to_string()))?;
    if offset < 0 {
        return Err(AppError::BadInput("invalid offset".to_string()));
    }
    if offset > MAX_OFFSET {
        return Err(AppError::BadInput("offset too large".to_string()));
    }
    Ok(offset as u64)
}

/// Renders one page of a feed: title, rows (day-grouped or blank-line
/// separated), and Previous/Next navigation.
pub async fn show_feed_page(
    writer: &mut dyn Writer,
    state: &AppState,
    viewer: Option<&str>,
    title: &str,
    base_path: &str,
    offset: u64,
    query: &dyn FeedQuery,
    day_groups: bool,
    fallback: &str,
) -> AppResult<()> {
    let rows = query.fetch(state, offset).await?;

    writer.ok("text/gemini");
    if offset > 0 {
        writer.title(1, &format!("{title} ({offset}-{})", offset + POSTS_PER_PAGE as u64));
    } else {
        writer.title(1, title);
    }

    if rows.is_empty() {
        writer.text(fallback);
        return Ok(());
    }

    let returned = rows.len();
    let mut last_day: Option<i64> = None;
    for row in &rows {
        if let Some(prev) = last_day {
            let day = row.note.inserted / 86400;
            if day != prev {
                if day_groups {
                    writer.separator();
                } else {
                    writer.empty();
                }
            }
        }
        last_day = Some(row.note.inserted / 86400);

        post::print_note(
            writer,
            state,
            viewer,
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

    if offset >= POSTS_PER_PAGE as u64 || returned == POSTS_PER_PAGE as usize {
        writer.subtitle("Navigation");
        if offset > 0 {
            let prev = offset.saturating_sub(POSTS_PER_PAGE as u64);
            writer.link(&format!("{base_path}?{prev}"), "Previous page");
        }
        let next = offset + POSTS_PER_PAGE as u64;
        if next <= MAX_OFFSET as u64 {
            writer.link(&format!("{base_path}?{next}"), "Next page");
        }
    }

    Ok(())
}

/// Renders a fixed-width ASCII bar graph of per-day (or per-option) counts,
/// used by the hashtag trend page and closed-poll results.
#[must_use]
pub fn bar_graph(labels_and_counts: &[(String, i64)], width: usize) -> Vec<String> {
    let max = labels_and_counts.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);
    labels_and_counts
        .iter()
        .map(|(label, count)| {
            let filled = if max > 0 {
                ((*count as f64 / max as f64) * width as f64).round() as usize
            } else {
                0
            };
            let bar = "#".repeat(filled.min(width));
            format!("{label:<10} {bar} {count}")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_offset_accepts_zero_and_rejects_out_of_range() {
        assert_eq!(parse_offset("").unwrap(), 0);
        assert_eq!(parse_offset("40").unwrap(), 40);
        assert!(parse_offset("-1").is_err());
        assert!(parse_offset("999999").is_err());
    }

    #[test]
    fn bar_graph_scales_to_width() {
        let rows = bar_graph(&[("mon".to_string(), 10), ("tue".to_string(), 5)], 10);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("##########"));
        assert!(rows[1].contains("#####"));
    }
}
