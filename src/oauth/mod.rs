//! Reddit OAuth module
//!
//! This module builds authorization URLs and talks to Reddit's token endpoint.
//! It holds no credential state; see [`crate::session`] for the token lifecycle.

pub mod client;

pub use client::{RedditOAuthClient, AUTHORIZE_PATH, TOKEN_PATH};

use serde::Deserialize;

/// Query parameters delivered to the OAuth callback page
#[derive(Deserialize, Debug, Default, Clone)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}
