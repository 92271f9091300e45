// Bearer-authenticated calls against Reddit's resource API
use crate::error::RedditError;
use crate::models::{CommentResponse, RedditUser};
use crate::settings::ScoutSettings;
use reqwest::{header, RequestBuilder, Response};

/// Current-user endpoint
pub const ME_PATH: &str = "/api/v1/me";

/// Comment submission endpoint
pub const COMMENT_PATH: &str = "/api/comment";

/// Stateless client; the access token is supplied per call
#[derive(Clone)]
pub struct RedditApiClient {
    api_base_url: String,
    user_agent: String,
    http_client: reqwest::Client,
}

impl RedditApiClient {
    #[must_use]
    pub fn from_settings(settings: &ScoutSettings, http_client: reqwest::Client) -> Self {
        Self {
            api_base_url: settings.reddit.api_base_url.trim_end_matches('/').to_string(),
            user_agent: settings.reddit.user_agent.clone(),
            http_client,
        }
    }

    /// `GET /api/v1/me`
    ///
    /// # Errors
    ///
    /// Returns `Http` for a non-success status, `Transport` or `InvalidResponse` otherwise
    pub async fn fetch_current_user(&self, access_token: String) -> Result<RedditUser, RedditError> {
        let request = self
            .http_client
            .get(format!("{}{ME_PATH}", self.api_base_url));
        let response = self.send(request, &access_token).await?;
        response
            .json::<RedditUser>()
            .await
            .map_err(|e| RedditError::InvalidResponse(format!("Failed to parse user: {e}")))
    }

    /// `POST /api/comment` with `api_type=json`
    ///
    /// Embedded `json.errors` are returned to the caller untouched.
    ///
    /// # Errors
    ///
    /// Returns `Http` for a non-success status, `Transport` or `InvalidResponse` otherwise
    pub async fn submit_comment(
        &self,
        access_token: String,
        thing_id: String,
        text: String,
    ) -> Result<CommentResponse, RedditError> {
        let request = self
            .http_client
            .post(format!("{}{COMMENT_PATH}", self.api_base_url))
            .form(&[
                ("thing_id", thing_id.as_str()),
                ("text", text.as_str()),
                ("api_type", "json"),
            ]);
        let response = self.send(request, &access_token).await?;
        response
            .json::<CommentResponse>()
            .await
            .map_err(|e| RedditError::InvalidResponse(format!("Failed to parse comment response: {e}")))
    }

    async fn send(&self, request: RequestBuilder, access_token: &str) -> Result<Response, RedditError> {
        let response = request
            .bearer_auth(access_token)
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(RedditError::http(status, body))
        }
    }
}
