//! Named limits referenced across the write-side handlers and feed renderer. Kept in one place so every
//! handler and service agrees on the same numbers.

use std::time::Duration;

/// Maximum number of key/value attachment fields on an actor's profile.
pub const MAX_METADATA_FIELDS: usize = 16;

/// Maximum number of bookmarks a single user may hold.
pub const MAX_BOOKMARKS_PER_USER: usize = 4096;

/// Minimum time that must elapse between two profile-edit commits for the
/// same actor.
pub const MIN_ACTOR_EDIT_INTERVAL: Duration = Duration::from_secs(60);

/// Offset above which `showFeedPage` rejects a pagination request outright.
pub const MAX_OFFSET: i64 = 10_000;

/// Number of posts rendered per feed page.
pub const POSTS_PER_PAGE: i64 = 20;

/// Number of replies rendered per page on `/view`.
pub const REPLIES_PER_PAGE: i64 = 20;

/// Maximum depth of the ancestor-context walk on `/view`.
pub const POST_CONTEXT_DEPTH: usize = 32;

/// Maximum number of reshare attributions shown under a post.
pub const SHARES_PER_POST: usize = 3;

/// Maximum rune length of a post body.
pub const MAX_POSTS_LENGTH: usize = 3000;

/// Maximum rune length of a profile bio.
pub const MAX_BIO_LENGTH: usize = 1500;

/// Maximum rune length of a display name.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 80;

/// Maximum number of explicit recipients on a single post.
pub const MAX_RECIPIENTS: usize = 32;

/// Maximum number of poll options.
pub const POLL_MAX_OPTIONS: usize = 8;

/// Lifetime of a poll once created.
pub const POLL_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Divisor applied to the 24h post count when computing the throttle
/// interval.
pub const POST_THROTTLE_FACTOR: i64 = 2;

/// Unit multiplied by `count / PostThrottleFactor` to get the wait interval.
pub const POST_THROTTLE_UNIT: Duration = Duration::from_secs(60);

/// Hard daily cap on posts per user.
pub const MAX_POSTS_PER_DAY: i64 = 500;

/// Minimum interval between two bookmarks by the same user.
pub const MIN_BOOKMARK_INTERVAL: Duration = Duration::from_secs(2);

/// Maximum number of outstanding invitations per inviter.
pub const MAX_INVITATIONS_PER_USER: usize = 5;

/// How long an unapproved certificate survives before being auto-rejected.
pub const CERTIFICATE_APPROVAL_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Rune budget for the compact feed view before truncation.
pub const COMPACT_VIEW_MAX_RUNES: usize = 280;

/// Line budget for the compact feed view before truncation.
pub const COMPACT_VIEW_MAX_LINES: usize = 4;

/// Default response-cache time-to-live for feed pages that don't override it.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Upper bound on a single-flight cache refresh before falling back to the
/// stale cached bytes.
pub const CACHE_UPDATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Titan uploads larger than `4 * MaxPostsLength` bytes are rejected
/// outright.
#[must_use]
pub const fn max_upload_bytes() -> usize {
    4 * MAX_POSTS_LENGTH
}

/// The special `as:Public` URI that marks a note's audience as public.
pub const PUBLIC_URI: &str = "https://www.w3.org/ns/activitystreams#Public";
