//! Pure and service-layer logic for tootik's frontend core: visibility,
//! HTML compaction, display-name synthesis, write-side regexes, the
//! throttle formula, the single-flight response cache, and the
//! collaborator interfaces the frontend consumes.

pub mod audience;
pub mod cache;
pub mod collab;
pub mod display_name;
pub mod html;
pub mod regexes;
pub mod throttle;
pub mod visibility;
