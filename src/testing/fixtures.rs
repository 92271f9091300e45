//! Test fixtures providing pre-built test objects
//!
//! Settings produced here point every Reddit and webhook URL at one base URL,
//! normally a local mock server.

use crate::session::{MemoryTokenStore, TokenLifecycleManager, TokenStore};
use crate::session::store::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::settings::ScoutSettings;
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::sync::Arc;

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    pub const CLIENT_ID: &'static str = "test_client_id";
    pub const CLIENT_SECRET: &'static str = "test_client_secret";
    pub const SEARCH_WEBHOOK_PATH: &'static str = "/webhook/search";
    pub const POSTER_WEBHOOK_PATH: &'static str = "/webhook/poster";

    /// Settings with every endpoint below `base_url`
    ///
    /// The identity provider lives at `{base_url}/api/v1`, the resource API at
    /// `{base_url}`. Environment overrides for the client credentials are off.
    #[must_use]
    pub fn settings(base_url: &str) -> ScoutSettings {
        let base_url = base_url.trim_end_matches('/');
        let mut settings = ScoutSettings::default();

        settings.reddit.client_id = Some(Self::CLIENT_ID.to_string());
        settings.reddit.client_secret = Some(Self::CLIENT_SECRET.to_string());
        settings.reddit.client_id_env = None;
        settings.reddit.client_secret_env = None;
        settings.reddit.auth_base_url = format!("{base_url}/api/v1");
        settings.reddit.api_base_url = base_url.to_string();

        settings.storage.token_file = String::new();
        settings.storage.storage_secret = "test-storage-secret".to_string();

        settings.workflow.search_webhook_url = Some(format!("{base_url}{}", Self::SEARCH_WEBHOOK_PATH));
        settings.workflow.poster_webhook_url = Some(format!("{base_url}{}", Self::POSTER_WEBHOOK_PATH));
        settings
    }

    /// In-memory store pre-populated with tokens
    ///
    /// # Panics
    ///
    /// Panics if the in-memory store cannot be written
    #[must_use]
    pub fn store_with_tokens(access_token: Option<&str>, refresh_token: Option<&str>) -> MemoryTokenStore {
        let store = MemoryTokenStore::new();
        if let Some(token) = access_token {
            store.set(ACCESS_TOKEN_KEY, token).unwrap();
        }
        if let Some(token) = refresh_token {
            store.set(REFRESH_TOKEN_KEY, token).unwrap();
        }
        store
    }

    /// Manager talking to `base_url`, backed by `store`
    ///
    /// # Panics
    ///
    /// Panics if the fixture settings are rejected
    #[must_use]
    pub fn manager(base_url: &str, store: Arc<dyn TokenStore>) -> TokenLifecycleManager {
        TokenLifecycleManager::from_settings(&Self::settings(base_url), store).unwrap()
    }

    /// The `Authorization` header Reddit expects on the token endpoint
    #[must_use]
    pub fn basic_auth_header() -> String {
        let credentials = format!("{}:{}", Self::CLIENT_ID, Self::CLIENT_SECRET);
        format!("Basic {}", general_purpose::STANDARD.encode(credentials))
    }

    /// Token endpoint body
    #[must_use]
    pub fn token_response(access_token: &str, refresh_token: Option<&str>) -> Value {
        let mut body = json!({
            "access_token": access_token,
            "token_type": "bearer",
            "expires_in": 86400,
            "scope": "submit read identity",
        });
        if let Some(refresh_token) = refresh_token {
            body["refresh_token"] = json!(refresh_token);
        }
        body
    }

    /// `/api/v1/me` body
    #[must_use]
    pub fn current_user() -> Value {
        json!({
            "id": "1a2b3c",
            "name": "signal_scout",
            "total_karma": 1234,
            "icon_img": "https://styles.redditmedia.com/icon.png",
        })
    }

    /// `/api/comment` body for an accepted comment
    #[must_use]
    pub fn comment_accepted() -> Value {
        json!({
            "json": {
                "errors": [],
                "data": {
                    "things": [{"kind": "t1", "data": {"id": "k9x8y7", "name": "t1_k9x8y7"}}]
                }
            }
        })
    }

    /// `/api/comment` body for a comment Reddit refused with HTTP 200
    #[must_use]
    pub fn comment_rejected(code: &str, message: &str) -> Value {
        json!({
            "json": {"errors": [[code, message, "text"]]}
        })
    }
}
