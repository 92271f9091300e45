// Data structures shared by the token lifecycle, the Reddit client and the handlers
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Lifetime assumed for an access token when the provider omits `expires_in`
pub const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 3600;

/// Authentication state for one Reddit identity
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Expiry of the current access token, known only after an exchange or refresh
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Create a credential from previously persisted tokens
    #[must_use]
    pub fn restored(access_token: Option<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.filter(|t| !t.is_empty()),
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
            expires_at: None,
        }
    }

    /// A usable (non-empty) access token, if any
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.bearer().is_some()
    }
}

// Tokens never reach logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Authorization URL plus the `state` nonce embedded in it
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationRequest {
    pub authorization_url: String,
    #[serde(skip)]
    pub state: String,
}

/// Successful token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Absolute expiry of the returned access token
    ///
    /// A missing, non-positive or out-of-range `expires_in` falls back to
    /// [`DEFAULT_TOKEN_LIFETIME_SECONDS`].
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        let now = Utc::now();
        self.expires_in
            .filter(|s| *s > 0)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or_else(|| now + Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECONDS))
    }
}

/// Token endpoint body; Reddit reports some failures with HTTP 200 and an `error` field
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TokenEndpointResponse {
    Tokens(TokenResponse),
    Error {
        error: Value,
        #[serde(default)]
        message: Option<String>,
    },
}

/// The authenticated Reddit account (`/api/v1/me`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditUser {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response body of `/api/comment` with `api_type=json`
#[derive(Debug, Default, Deserialize)]
pub struct CommentResponse {
    #[serde(default)]
    pub json: CommentResponseBody,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentResponseBody {
    /// Entries look like `[code, message, field]`
    #[serde(default)]
    pub errors: Vec<Vec<Value>>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl CommentResponse {
    /// Message of the first embedded error, falling back to its code
    #[must_use]
    pub fn first_error(&self) -> Option<String> {
        let entry = self.json.errors.first()?;
        let text = |index: usize| entry.get(index).and_then(Value::as_str);
        Some(
            text(1)
                .or_else(|| text(0))
                .map_or_else(|| Value::Array(entry.clone()).to_string(), ToString::to_string),
        )
    }

    /// Fullname (`t1_...`) of the created comment
    #[must_use]
    pub fn comment_name(&self) -> Option<String> {
        self.json
            .data
            .as_ref()?
            .pointer("/things/0/data/name")
            .and_then(Value::as_str)
            .map(ToString::to_string)
    }
}

/// A comment Reddit accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostedComment {
    pub thing_id: String,
    pub comment_name: Option<String>,
}

/// Reddit search inputs produced from an ICP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSignals {
    pub subreddits: Vec<String>,
    /// Boolean query, e.g. `("stuck" OR "blocked") AND ("oauth")`
    pub boolean_query: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credential_empty_token_is_not_authenticated() {
        let credential = Credential::restored(Some(String::new()), Some("refresh".into()));
        assert!(!credential.is_authenticated());
        assert_eq!(credential.refresh_token.as_deref(), Some("refresh"));
    }

    #[test]
    fn test_credential_debug_redacts_tokens() {
        let credential = Credential::restored(Some("secret-access".into()), None);
        let debug = format!("{credential:?}");
        assert!(!debug.contains("secret-access"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_token_endpoint_error_body() {
        let parsed: TokenEndpointResponse =
            serde_json::from_value(json!({"error": "invalid_grant"})).unwrap();
        assert!(matches!(parsed, TokenEndpointResponse::Error { .. }));

        let parsed: TokenEndpointResponse = serde_json::from_value(json!({
            "access_token": "a",
            "token_type": "bearer",
            "expires_in": 86400,
            "scope": "submit read identity"
        }))
        .unwrap();
        match parsed {
            TokenEndpointResponse::Tokens(tokens) => {
                assert_eq!(tokens.access_token, "a");
                assert!(tokens.refresh_token.is_none());
            }
            TokenEndpointResponse::Error { .. } => panic!("expected tokens"),
        }
    }

    #[test]
    fn test_token_expiry_defaults_to_one_hour() {
        let tokens = TokenResponse {
            access_token: "a".into(),
            refresh_token: None,
            token_type: None,
            expires_in: None,
            scope: None,
        };
        let remaining = tokens.expires_at() - Utc::now();
        assert!(remaining <= Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECONDS));
        assert!(remaining > Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECONDS - 60));
    }

    #[test]
    fn test_token_expiry_out_of_range_falls_back() {
        // Too large for a duration, and a valid duration past the last representable date
        for expires_in in [i64::MAX, 1_000_000_000_000_000] {
            let tokens = TokenResponse {
                access_token: "a".into(),
                refresh_token: None,
                token_type: None,
                expires_in: Some(expires_in),
                scope: None,
            };
            let remaining = tokens.expires_at() - Utc::now();
            assert!(remaining <= Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECONDS));
            assert!(remaining > Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECONDS - 60));
        }
    }

    #[test]
    fn test_comment_response_errors() {
        let response: CommentResponse = serde_json::from_value(json!({
            "json": {"errors": [["RATELIMIT", "you are doing that too much", "ratelimit"]]}
        }))
        .unwrap();
        assert_eq!(
            response.first_error().as_deref(),
            Some("you are doing that too much")
        );
    }

    #[test]
    fn test_comment_response_success() {
        let response: CommentResponse = serde_json::from_value(json!({
            "json": {
                "errors": [],
                "data": {"things": [{"kind": "t1", "data": {"name": "t1_xyz", "id": "xyz"}}]}
            }
        }))
        .unwrap();
        assert_eq!(response.first_error(), None);
        assert_eq!(response.comment_name().as_deref(), Some("t1_xyz"));
    }

    #[test]
    fn test_reddit_user_keeps_extra_fields() {
        let user: RedditUser = serde_json::from_value(json!({
            "id": "abc",
            "name": "scout",
            "total_karma": 42
        }))
        .unwrap();
        assert_eq!(user.name, "scout");
        assert_eq!(user.extra["total_karma"], 42);
    }
}
