//! Reddit OAuth token lifecycle
//!
//! [`TokenLifecycleManager`] owns one user's Reddit credential and drives the
//! authenticate → call → refresh → retry → logout cycle:
//!
//! ```text
//! UNAUTHENTICATED --begin/complete_authorization--> AUTHENTICATED
//! AUTHENTICATED   --401 on call-------------------> REFRESHING
//! REFRESHING      --refresh ok--------------------> AUTHENTICATED
//! REFRESHING      --refresh failed----------------> UNAUTHENTICATED (until re-authorized)
//! any             --logout------------------------> UNAUTHENTICATED
//! ```
//!
//! The manager is the only writer of the token store. It is an ordinary value:
//! each user session gets its own manager and store.

use crate::error::RedditError;
use crate::models::{AuthorizationRequest, Credential, PostedComment, RedditUser, TokenResponse};
use crate::oauth::RedditOAuthClient;
use crate::reddit::{submission_fullname, RedditApiClient};
use crate::session::store::{TokenStore, ACCESS_TOKEN_KEY, OAUTH_STATE_KEY, REFRESH_TOKEN_KEY};
use crate::settings::ScoutSettings;
use crate::utils::crypto::generate_state_token;
use crate::utils::logging::LoggingHelper;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Successful result of an authenticated call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome<T> {
    /// The first attempt succeeded
    Success(T),
    /// The first attempt got a 401; the token was refreshed and the retry succeeded
    SuccessAfterRefresh(T),
}

impl<T> CallOutcome<T> {
    #[must_use]
    pub fn value(&self) -> &T {
        match self {
            Self::Success(value) | Self::SuccessAfterRefresh(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Success(value) | Self::SuccessAfterRefresh(value) => value,
        }
    }

    #[must_use]
    pub fn was_refreshed(&self) -> bool {
        matches!(self, Self::SuccessAfterRefresh(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CallOutcome<U> {
        match self {
            Self::Success(value) => CallOutcome::Success(f(value)),
            Self::SuccessAfterRefresh(value) => CallOutcome::SuccessAfterRefresh(f(value)),
        }
    }
}

pub struct TokenLifecycleManager {
    oauth: RedditOAuthClient,
    api: RedditApiClient,
    store: Arc<dyn TokenStore>,
    credential: RwLock<Credential>,
}

impl TokenLifecycleManager {
    /// Create a manager, restoring any tokens already in `store`
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store cannot be read
    pub fn new(
        oauth: RedditOAuthClient,
        api: RedditApiClient,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, RedditError> {
        let credential = Credential::restored(
            store.get(ACCESS_TOKEN_KEY)?,
            store.get(REFRESH_TOKEN_KEY)?,
        );
        log::info!(
            "Reddit session restored: authenticated={}, refresh_token={}",
            credential.is_authenticated(),
            if credential.refresh_token.is_some() { "present" } else { "missing" }
        );

        Ok(Self {
            oauth,
            api,
            store,
            credential: RwLock::new(credential),
        })
    }

    /// Create a manager with clients built from settings
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if Reddit credentials are missing, `Storage` if
    /// the store cannot be read
    pub fn from_settings(
        settings: &ScoutSettings,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, RedditError> {
        let http_client = reqwest::Client::new();
        let oauth = RedditOAuthClient::from_settings(settings, http_client.clone())?;
        let api = RedditApiClient::from_settings(settings, http_client);
        Self::new(oauth, api, store)
    }

    /// Snapshot of the current credential
    pub async fn credential(&self) -> Credential {
        self.credential.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.credential.read().await.is_authenticated()
    }

    /// Expiry of the access token, when known
    pub async fn access_token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.credential.read().await.expires_at
    }

    /// Start an authorization attempt
    ///
    /// Stores a fresh `state` nonce, replacing any unconsumed one, and returns
    /// the URL the user has to open. No request is sent to Reddit.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the nonce cannot be stored, `Configuration` if the
    /// authorization URL cannot be built
    pub fn begin_authorization(&self) -> Result<AuthorizationRequest, RedditError> {
        let state = generate_state_token();
        let authorization_url = self.oauth.authorization_url(&state)?;
        self.store.set(OAUTH_STATE_KEY, &state)?;

        Ok(AuthorizationRequest {
            authorization_url,
            state,
        })
    }

    /// Drop the pending authorization attempt, if any
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store cannot be written
    pub fn discard_authorization(&self) -> Result<(), RedditError> {
        self.store.remove(OAUTH_STATE_KEY)?;
        Ok(())
    }

    /// Whether an authorization attempt is waiting for its callback
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store cannot be read
    pub fn has_pending_authorization(&self) -> Result<bool, RedditError> {
        Ok(self
            .store
            .get(OAUTH_STATE_KEY)?
            .is_some_and(|state| !state.is_empty()))
    }

    /// Finish an authorization attempt with the callback's `code` and `state`
    ///
    /// The pending attempt is consumed whether or not `returned_state` matches.
    /// A mismatch never reaches the token endpoint.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `InvalidState` if no attempt is pending or the state differs
    /// - `TokenExchangeFailed` if Reddit rejects the code (not retried)
    /// - `Storage` if tokens cannot be persisted
    pub async fn complete_authorization(
        &self,
        code: &str,
        returned_state: &str,
    ) -> Result<(), RedditError> {
        let pending = self.store.get(OAUTH_STATE_KEY)?;
        self.store.remove(OAUTH_STATE_KEY)?;

        match pending.as_deref() {
            Some(expected) if !expected.is_empty() && expected == returned_state => {}
            other => {
                LoggingHelper::log_state_mismatch(other.is_some());
                return Err(RedditError::InvalidState);
            }
        }

        let tokens = self.oauth.exchange_code(code).await?;
        self.store_exchanged_tokens(&tokens).await
    }

    async fn store_exchanged_tokens(&self, tokens: &TokenResponse) -> Result<(), RedditError> {
        let refresh_token = tokens
            .refresh_token
            .as_deref()
            .filter(|token| !token.is_empty());
        let expires_at = tokens.expires_at();

        self.store.set(ACCESS_TOKEN_KEY, &tokens.access_token)?;
        if let Some(refresh_token) = refresh_token {
            self.store.set(REFRESH_TOKEN_KEY, refresh_token)?;
        }

        let mut credential = self.credential.write().await;
        credential.access_token = Some(tokens.access_token.clone());
        if let Some(refresh_token) = refresh_token {
            credential.refresh_token = Some(refresh_token.to_string());
        }
        credential.expires_at = Some(expires_at);
        Ok(())
    }

    /// Replace the access token using the stored refresh token
    ///
    /// Stored tokens are left in place on failure; only `logout` clears them.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `NoRefreshToken` without any request when no refresh token is held
    /// - `RefreshFailed` if Reddit rejects the refresh or cannot be reached
    /// - `Storage` if the new access token cannot be persisted
    pub async fn refresh_access_token(&self) -> Result<(), RedditError> {
        let refresh_token = self
            .credential
            .read()
            .await
            .refresh_token
            .clone()
            .ok_or(RedditError::NoRefreshToken)?;

        let tokens = self.oauth.refresh(&refresh_token).await?;
        let expires_at = tokens.expires_at();

        self.store.set(ACCESS_TOKEN_KEY, &tokens.access_token)?;
        let mut credential = self.credential.write().await;
        credential.access_token = Some(tokens.access_token.clone());
        credential.expires_at = Some(expires_at);
        drop(credential);

        LoggingHelper::log_token_refreshed();
        Ok(())
    }

    async fn current_access_token(&self) -> Result<String, RedditError> {
        self.credential
            .read()
            .await
            .bearer()
            .map(ToString::to_string)
            .ok_or(RedditError::NotAuthenticated)
    }

    /// Run `request_fn` with the access token, refreshing and retrying once on 401
    ///
    /// `request_fn` is invoked at most twice. Non-401 failures are returned as
    /// they are; rate limiting and server errors are the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `NotAuthenticated` without invoking `request_fn` when no token is held
    /// - the original 401 when the refresh fails
    /// - the retry's error when the retry fails
    /// - any other error from `request_fn` unchanged
    pub async fn call_authenticated<T, F, Fut>(
        &self,
        request_fn: F,
    ) -> Result<CallOutcome<T>, RedditError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, RedditError>>,
    {
        let access_token = self.current_access_token().await?;

        match request_fn(access_token).await {
            Ok(value) => Ok(CallOutcome::Success(value)),
            Err(err) if err.is_unauthorized() => {
                if let Err(refresh_err) = self.refresh_access_token().await {
                    LoggingHelper::log_refresh_abandoned(&refresh_err.to_string());
                    return Err(err);
                }

                LoggingHelper::log_retry_after_unauthorized();
                let access_token = self.current_access_token().await?;
                request_fn(access_token)
                    .await
                    .map(CallOutcome::SuccessAfterRefresh)
            }
            Err(err) => Err(err),
        }
    }

    /// Fetch the authenticated Reddit account
    ///
    /// # Errors
    ///
    /// See [`Self::call_authenticated`]
    pub async fn get_current_user(&self) -> Result<CallOutcome<RedditUser>, RedditError> {
        self.call_authenticated(|token| self.api.fetch_current_user(token))
            .await
    }

    /// Post a top-level comment on a submission
    ///
    /// `target_id` is either a bare post id or a thread URL.
    ///
    /// # Errors
    ///
    /// Returns `ProviderRejected` when Reddit answers 200 with embedded errors,
    /// otherwise see [`Self::call_authenticated`]
    pub async fn post_comment(
        &self,
        target_id: &str,
        text: &str,
    ) -> Result<CallOutcome<PostedComment>, RedditError> {
        let thing_id = submission_fullname(target_id);
        LoggingHelper::log_comment_submission(&thing_id, text.len());

        let outcome = self
            .call_authenticated(|token| {
                self.api
                    .submit_comment(token, thing_id.clone(), text.to_string())
            })
            .await?;

        if let Some(message) = outcome.value().first_error() {
            log::warn!("Reddit rejected comment on {thing_id}: {message}");
            return Err(RedditError::ProviderRejected(message));
        }

        Ok(outcome.map(|response| PostedComment {
            comment_name: response.comment_name(),
            thing_id,
        }))
    }

    /// Forget both tokens and any pending attempt; calling it again is a no-op
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store cannot be written
    pub async fn logout(&self) -> Result<(), RedditError> {
        let had_tokens = {
            let mut credential = self.credential.write().await;
            let had_tokens = credential.access_token.is_some() || credential.refresh_token.is_some();
            *credential = Credential::default();
            had_tokens
        };

        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)?;
        self.store.remove(OAUTH_STATE_KEY)?;

        LoggingHelper::log_logout(had_tokens);
        Ok(())
    }
}
