//! Repository layer: thin, error-translating wrappers around `sea-orm`
//! queries, one file per entity.

pub mod bookmark;
pub mod certificate;
pub mod follow;
pub mod hashtag;
pub mod invite;
pub mod note;
pub mod outbox;
pub mod person;
pub mod share;
pub mod signing_key;

pub use bookmark::BookmarkRepository;
pub use certificate::CertificateRepository;
pub use follow::FollowRepository;
pub use hashtag::HashtagRepository;
pub use invite::InviteRepository;
pub use note::NoteRepository;
pub use outbox::OutboxRepository;
pub use person::PersonRepository;
pub use share::ShareRepository;
pub use signing_key::SigningKeyRepository;
