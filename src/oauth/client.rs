//! Reddit identity provider client
//!
//! Wraps the `/authorize` URL contract and the two token endpoint grants
//! (`authorization_code`, `refresh_token`). Both grants authenticate with HTTP
//! Basic `client_id:client_secret`.

use crate::error::RedditError;
use crate::models::{TokenEndpointResponse, TokenResponse};
use crate::settings::ScoutSettings;
use crate::utils::logging::LoggingHelper;
use reqwest::{header, StatusCode};

/// Path of the authorization page below the identity provider base URL
pub const AUTHORIZE_PATH: &str = "/authorize";

/// Path of the token endpoint below the identity provider base URL
pub const TOKEN_PATH: &str = "/access_token";

#[derive(Clone)]
pub struct RedditOAuthClient {
    client_id: String,
    client_secret: String,
    authorize_url: String,
    token_url: String,
    redirect_uri: String,
    scopes: String,
    user_agent: String,
    http_client: reqwest::Client,
}

impl RedditOAuthClient {
    /// Build the client from settings
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the client id or secret is missing
    pub fn from_settings(
        settings: &ScoutSettings,
        http_client: reqwest::Client,
    ) -> Result<Self, RedditError> {
        let client_id = settings.reddit.get_client_id().ok_or_else(|| {
            RedditError::Configuration("Reddit client_id is not configured".to_string())
        })?;
        let client_secret = settings.reddit.get_client_secret().ok_or_else(|| {
            RedditError::Configuration("Reddit client_secret is not configured".to_string())
        })?;

        let base = settings.reddit.auth_base_url.trim_end_matches('/');
        Ok(Self {
            client_id,
            client_secret,
            authorize_url: format!("{base}{AUTHORIZE_PATH}"),
            token_url: format!("{base}{TOKEN_PATH}"),
            redirect_uri: settings.get_redirect_uri(),
            scopes: settings.reddit.scope_string(),
            user_agent: settings.reddit.user_agent.clone(),
            http_client,
        })
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Build the authorization URL for `state`; performs no I/O
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the configured base URL is not a valid URL
    pub fn authorization_url(&self, state: &str) -> Result<String, RedditError> {
        let mut url = url::Url::parse(&self.authorize_url).map_err(|e| {
            RedditError::Configuration(format!("Invalid Reddit authorization URL: {e}"))
        })?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("state", state)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("duration", "permanent")
            .append_pair("scope", &self.scopes);

        LoggingHelper::log_authorization_started(&self.scopes, &self.redirect_uri);
        Ok(url.to_string())
    }

    /// Exchange a single-use authorization code for tokens
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `TokenExchangeFailed` for a non-2xx status or an `error` body
    /// - `Transport` if the request cannot be sent
    /// - `InvalidResponse` if the body is not a token response
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, RedditError> {
        LoggingHelper::log_token_exchange_start();
        let (status, body) = self
            .post_token_form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", &self.redirect_uri),
            ])
            .await?;

        if !status.is_success() {
            LoggingHelper::log_token_endpoint_failure("authorization_code", status.as_u16(), &body);
            return Err(RedditError::TokenExchangeFailed {
                status: status.as_u16(),
                body,
            });
        }

        match parse_token_body(&body)? {
            TokenEndpointResponse::Tokens(tokens) if !tokens.access_token.is_empty() => {
                LoggingHelper::log_token_exchange_summary(
                    tokens.access_token.len(),
                    tokens.refresh_token.as_ref(),
                    tokens.token_type.as_ref(),
                    tokens.scope.as_ref(),
                );
                Ok(tokens)
            }
            _ => {
                LoggingHelper::log_token_endpoint_failure("authorization_code", status.as_u16(), &body);
                Err(RedditError::TokenExchangeFailed {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    /// Mint a new access token from a refresh token
    ///
    /// # Errors
    ///
    /// Returns `RefreshFailed` for any failure, transport errors included
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, RedditError> {
        let (status, body) = self
            .post_token_form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await
            .map_err(|e| RedditError::RefreshFailed(e.to_string()))?;

        if !status.is_success() {
            LoggingHelper::log_token_endpoint_failure("refresh_token", status.as_u16(), &body);
            return Err(RedditError::RefreshFailed(format!("status {status}: {body}")));
        }

        match parse_token_body(&body).map_err(|e| RedditError::RefreshFailed(e.to_string()))? {
            TokenEndpointResponse::Tokens(tokens) if !tokens.access_token.is_empty() => Ok(tokens),
            _ => {
                LoggingHelper::log_token_endpoint_failure("refresh_token", status.as_u16(), &body);
                Err(RedditError::RefreshFailed(format!("status {status}: {body}")))
            }
        }
    }

    async fn post_token_form(
        &self,
        form: &[(&str, &str)],
    ) -> Result<(StatusCode, String), RedditError> {
        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(header::USER_AGENT, &self.user_agent)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

fn parse_token_body(body: &str) -> Result<TokenEndpointResponse, RedditError> {
    serde_json::from_str(body)
        .map_err(|e| RedditError::InvalidResponse(format!("Failed to parse token response: {e}")))
}
