//! Mock callback data for exercising the OAuth callback page

use crate::oauth::OAuthCallback;

/// Mock OAuth callback data for testing OAuth flows
pub struct MockOAuthCallback;

impl MockOAuthCallback {
    /// Create a successful OAuth callback
    #[must_use]
    pub fn success(code: &str, state: &str) -> OAuthCallback {
        OAuthCallback {
            code: Some(code.to_string()),
            state: Some(state.to_string()),
            error: None,
        }
    }

    /// Create an OAuth callback with error
    #[must_use]
    pub fn error(error: &str, state: Option<&str>) -> OAuthCallback {
        OAuthCallback {
            code: None,
            state: state.map(ToString::to_string),
            error: Some(error.to_string()),
        }
    }

    /// Create OAuth callback missing required fields
    #[must_use]
    pub fn incomplete() -> OAuthCallback {
        OAuthCallback::default()
    }

    /// Query string for a callback, as the browser would request it
    #[must_use]
    pub fn query_string(callback: &OAuthCallback) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if let Some(code) = &callback.code {
            serializer.append_pair("code", code);
        }
        if let Some(state) = &callback.state {
            serializer.append_pair("state", state);
        }
        if let Some(error) = &callback.error {
            serializer.append_pair("error", error);
        }
        serializer.finish()
    }
}
