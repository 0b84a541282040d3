//! ID generation utilities.

use sha2::{Digest, Sha256};
use ulid::Ulid;
use uuid::Uuid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based local id (certificates, cache keys, and any
    /// other row that doesn't need to be a stable, content-derived URL).
    ///
    /// ULIDs are lexicographically sortable and monotonically increasing
    /// within the same millisecond.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a new invite code.
    #[must_use]
    pub fn generate_invite_code(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Allocate a stable post id for a new note:
    /// `https://<domain>/post/<stable-hash>`, where the hash is derived from
    /// the author, the post content, and the current time, so that retries
    /// with identical content at the same instant collide deterministically
    /// rather than silently double-posting.
    #[must_use]
    pub fn stable_post_id(domain: &str, author: &str, content: &str, now_unix: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(author.as_bytes());
        hasher.update([0u8]);
        hasher.update(content.as_bytes());
        hasher.update([0u8]);
        hasher.update(now_unix.to_be_bytes());
        let digest = hasher.finalize();
        format!("https://{domain}/post/{}", hex::encode(&digest[..16]))
    }

    /// Allocate a stable activity id, used for `Follow`/`Accept`/`Announce`
    /// envelopes that need an id distinct from the note/actor they carry.
    #[must_use]
    pub fn stable_activity_id(domain: &str, kind: &str, actor: &str, object: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_bytes());
        hasher.update([0u8]);
        hasher.update(actor.as_bytes());
        hasher.update([0u8]);
        hasher.update(object.as_bytes());
        let digest = hasher.finalize();
        format!("https://{domain}/activity/{}", hex::encode(&digest[..16]))
    }
}

/// SHA-256 hex digest of a TLS client certificate's DER bytes, used as the
/// stable identifier for a `Certificate` row.
#[must_use]
pub fn certificate_hash(der_bytes: &[u8]) -> String {
    let digest = Sha256::digest(der_bytes);
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_eq!(id2.len(), 26);
        assert_ne!(id1, id2);
    }

    #[test]
    fn stable_post_id_is_deterministic() {
        let a = IdGenerator::stable_post_id("example.com", "alice", "hello world", 1_700_000_000);
        let b = IdGenerator::stable_post_id("example.com", "alice", "hello world", 1_700_000_000);
        assert_eq!(a, b);
        assert!(a.starts_with("https://example.com/post/"));
    }

    #[test]
    fn stable_post_id_differs_on_content() {
        let a = IdGenerator::stable_post_id("example.com", "alice", "hello", 1_700_000_000);
        let b = IdGenerator::stable_post_id("example.com", "alice", "world", 1_700_000_000);
        assert_ne!(a, b);
    }

    #[test]
    fn certificate_hash_is_stable_sha256() {
        let h1 = certificate_hash(b"fake-der-bytes");
        let h2 = certificate_hash(b"fake-der-bytes");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }
}
