//! Audience construction for new posts and replies,
//! plus the edit-monotonicity invariant.

use tootik_common::limits::PUBLIC_URI;

/// The `to`/`cc` pair a write handler assembles before building an activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Audience {
    pub to: Vec<String>,
    pub cc: Vec<String>,
}

impl Audience {
    #[must_use]
    pub fn union(&self) -> Vec<String> {
        let mut v = self.to.clone();
        v.extend(self.cc.clone());
        v
    }
}

/// Visibility family a post is created under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Direct message: `to` only, no `Public`.
    Dm,
    /// Followers-only: `to = [followers]`.
    Whisper,
    /// Public top-level post: `to = [Public]`, `cc = [followers]`.
    Say,
}

/// Builds the audience for a new top-level post.
#[must_use]
pub fn for_new_post(visibility: Visibility, author_followers_url: &str, recipients: &[String]) -> Audience {
    match visibility {
        Visibility::Dm => Audience {
            to: recipients.to_vec(),
            cc: vec![],
        },
        Visibility::Whisper => Audience {
            to: vec![author_followers_url.to_string()],
            cc: vec![],
        },
        Visibility::Say => Audience {
            to: vec![PUBLIC_URI.to_string()],
            cc: vec![author_followers_url.to_string()],
        },
    }
}

/// The parent note's relevant shape for reply-audience derivation: whether
/// it was authored by the replier, and where (if anywhere) the public URI
/// appears in its audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentShape {
    OwnPublic,
    OwnNonPublic,
    OtherPublicInTo,
    OtherPublicInCc,
    Other,
}

/// Derives a reply's `to`/`cc` from the parent post's shape.
#[must_use]
pub fn for_reply(
    shape: ParentShape,
    parent_author: &str,
    parent_to: &[String],
    parent_cc: &[String],
    replier_followers_url: &str,
) -> Audience {
    match shape {
        ParentShape::OwnPublic => Audience {
            to: vec![parent_author.to_string(), PUBLIC_URI.to_string()],
            cc: vec![replier_followers_url.to_string()],
        },
        ParentShape::OwnNonPublic => Audience {
            to: vec![replier_followers_url.to_string()],
            cc: vec![],
        },
        ParentShape::OtherPublicInTo => Audience {
            to: vec![parent_author.to_string(), PUBLIC_URI.to_string()],
            cc: vec![replier_followers_url.to_string()],
        },
        ParentShape::OtherPublicInCc => Audience {
            to: vec![parent_author.to_string()],
            cc: {
                let mut cc = vec![replier_followers_url.to_string()];
                cc.push(PUBLIC_URI.to_string());
                cc
            },
        },
        ParentShape::Other => {
            let mut cc: Vec<String> = parent_to
                .iter()
                .chain(parent_cc.iter())
                .filter(|a| a.as_str() != parent_author)
                .cloned()
                .collect();
            cc.dedup();
            Audience {
                to: vec![parent_author.to_string()],
                cc,
            }
        }
    }
}

/// Classifies a parent post's shape relative to the replying actor, for
/// use with [`for_reply`].
#[must_use]
pub fn classify_parent(
    parent_author: &str,
    replier: &str,
    parent_to: &[String],
    parent_cc: &[String],
) -> ParentShape {
    let is_own = parent_author == replier;
    let public_in_to = parent_to.iter().any(|a| a == PUBLIC_URI);
    let public_in_cc = parent_cc.iter().any(|a| a == PUBLIC_URI);

    if is_own {
        if public_in_to || public_in_cc {
            ParentShape::OwnPublic
        } else {
            ParentShape::OwnNonPublic
        }
    } else if public_in_to {
        ParentShape::OtherPublicInTo
    } else if public_in_cc {
        ParentShape::OtherPublicInCc
    } else {
        ParentShape::Other
    }
}

/// A candidate actor matching a `@user[@host]` mention, with the signals
/// needed to rank it against other candidates sharing the same username.
#[derive(Debug, Clone)]
pub struct MentionCandidate {
    pub actor_id: String,
    pub is_parent_author: bool,
    pub is_followed: bool,
    pub is_local: bool,
}

/// Picks the best-scoring candidate for a `@user` mention, preferring (in
/// order) the post's parent author, an actor the poster follows, a local
/// actor, then any match.
#[must_use]
pub fn resolve_mention<'a>(candidates: &'a [MentionCandidate]) -> Option<&'a MentionCandidate> {
    let score = |c: &MentionCandidate| -> u8 {
        if c.is_parent_author {
            3
        } else if c.is_followed {
            2
        } else if c.is_local {
            1
        } else {
            0
        }
    };
    candidates.iter().max_by_key(|c| score(c))
}

/// Whether an edit's new audience is a valid superset of the original:
/// every recipient the original reached must still be reached.
#[must_use]
pub fn is_valid_edit_audience(original: &Audience, edited: &Audience) -> bool {
    let edited_union = edited.union();
    original
        .union()
        .iter()
        .all(|addr| edited_union.contains(addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn say_addresses_public_and_followers() {
        let a = for_new_post(Visibility::Say, "https://a/followers", &[]);
        assert_eq!(a.to, vec![PUBLIC_URI.to_string()]);
        assert_eq!(a.cc, vec!["https://a/followers".to_string()]);
    }

    #[test]
    fn reply_to_own_public_post_addresses_self_and_public() {
        let shape = classify_parent(
            "https://alice",
            "https://alice",
            &[PUBLIC_URI.to_string()],
            &[],
        );
        assert_eq!(shape, ParentShape::OwnPublic);
        let a = for_reply(shape, "https://alice", &[], &[], "https://alice/followers");
        assert_eq!(a.to, vec!["https://alice".to_string(), PUBLIC_URI.to_string()]);
        assert_eq!(a.cc, vec!["https://alice/followers".to_string()]);
    }

    #[test]
    fn reply_to_others_public_in_cc_addresses_parent_and_public() {
        // parent's followers collection and Public both appear in cc.
        let shape = classify_parent(
            "https://alice",
            "https://bob",
            &[],
            &["https://alice/followers".to_string(), PUBLIC_URI.to_string()],
        );
        assert_eq!(shape, ParentShape::OtherPublicInCc);
        let a = for_reply(shape, "https://alice", &[], &[], "https://bob/followers");
        assert_eq!(a.to, vec!["https://alice".to_string()]);
        assert_eq!(
            a.cc,
            vec!["https://bob/followers".to_string(), PUBLIC_URI.to_string()]
        );
    }

    #[test]
    fn reply_to_private_multi_recipient_parent_keeps_every_recipient() {
        let shape = classify_parent(
            "https://alice",
            "https://carol",
            &["https://alice".to_string(), "https://bob".to_string()],
            &[],
        );
        assert_eq!(shape, ParentShape::Other);
        let a = for_reply(
            shape,
            "https://alice",
            &["https://alice".to_string(), "https://bob".to_string()],
            &[],
            "https://carol/followers",
        );
        assert_eq!(a.to, vec!["https://alice".to_string()]);
        assert_eq!(a.cc, vec!["https://bob".to_string()]);
    }

    #[test]
    fn edit_may_add_but_not_remove_recipients() {
        let original = Audience {
            to: vec!["https://a".to_string()],
            cc: vec![],
        };
        let superset = Audience {
            to: vec!["https://a".to_string(), "https://b".to_string()],
            cc: vec![],
        };
        let subset = Audience {
            to: vec![],
            cc: vec![],
        };
        assert!(is_valid_edit_audience(&original, &superset));
        assert!(!is_valid_edit_audience(&original, &subset));
    }
}
