//! Feed and single-post read handlers wired into the route table.

pub mod account;
pub mod feeds;
pub mod follows;
pub mod misc;
pub mod view;
