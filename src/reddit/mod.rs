//! Reddit resource API
//!
//! Thin request/response wrappers; retry and refresh live in
//! [`crate::session::TokenLifecycleManager`].

pub mod client;
pub mod thing;

pub use client::{RedditApiClient, COMMENT_PATH, ME_PATH};
pub use thing::{extract_post_id, submission_fullname, SUBMISSION_PREFIX};
