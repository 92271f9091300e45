//! Error types for Reddit and workflow interactions
//!
//! Every provider interaction returns `Result<_, RedditError>`; the variants map
//! one-to-one onto the ways an OAuth handshake or an authenticated call can end.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by the token lifecycle and the Reddit API client
#[derive(Debug, Error)]
pub enum RedditError {
    /// No access token is held; the user has to authorize first
    #[error("not authenticated with Reddit")]
    NotAuthenticated,

    /// The `state` returned on callback did not match the pending attempt
    #[error("invalid OAuth state parameter")]
    InvalidState,

    /// The provider refused to exchange the authorization code
    #[error("token exchange failed with status {status}: {body}")]
    TokenExchangeFailed { status: u16, body: String },

    /// A refresh was needed but no refresh token is stored
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The provider refused the refresh token or the refresh request failed
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// HTTP 200 with an error embedded in the response body
    #[error("Reddit rejected the request: {0}")]
    ProviderRejected(String),

    /// Non-success status from the resource API
    #[error("Reddit API request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response from Reddit: {0}")]
    InvalidResponse(String),

    #[error("token storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl RedditError {
    /// Build an `Http` error from a status code and the response body
    #[must_use]
    pub fn http(status: StatusCode, body: String) -> Self {
        Self::Http {
            status: status.as_u16(),
            body,
        }
    }

    /// Whether this failure is an HTTP 401 from the resource API
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status, .. } if *status == StatusCode::UNAUTHORIZED.as_u16())
    }

    /// Whether the caller has to send the user through authorization again
    #[must_use]
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::NoRefreshToken | Self::RefreshFailed(_)
        ) || self.is_unauthorized()
    }
}

impl From<anyhow::Error> for RedditError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(format!("{err:#}"))
    }
}

/// Errors raised when triggering workflow automation webhooks
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0} webhook URL is not configured")]
    NotConfigured(&'static str),

    #[error("webhook failed with status {status}: {body}")]
    Webhook { status: u16, body: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
}
