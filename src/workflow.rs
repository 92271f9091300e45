// Workflow automation (n8n) webhook triggers
use crate::error::WorkflowError;
use crate::models::SearchSignals;
use crate::settings::ScoutSettings;
use crate::utils::logging::LoggingHelper;
use serde::Serialize;
use serde_json::{json, Value};

/// Response of a triggered workflow; n8n answers with free-form text
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResponse {
    pub message: String,
    pub response: String,
}

#[derive(Clone)]
pub struct WorkflowClient {
    search_webhook_url: Option<String>,
    poster_webhook_url: Option<String>,
    reddit_api_base_url: String,
    http_client: reqwest::Client,
}

impl WorkflowClient {
    #[must_use]
    pub fn from_settings(settings: &ScoutSettings, http_client: reqwest::Client) -> Self {
        Self {
            search_webhook_url: settings.workflow.search_webhook_url.clone(),
            poster_webhook_url: settings.workflow.poster_webhook_url.clone(),
            reddit_api_base_url: settings.reddit.api_base_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    /// Multi-subreddit search endpoint, e.g. `https://oauth.reddit.com/r/LangChain+crewai/search`
    #[must_use]
    pub fn subreddit_search_url(&self, subreddits: &[String]) -> String {
        let joined = subreddits
            .iter()
            .map(|s| s.trim().trim_start_matches("r/"))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("+");
        format!("{}/r/{joined}/search", self.reddit_api_base_url)
    }

    /// Start the Reddit search workflow for `signals`
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` without a search webhook, `Webhook` for a
    /// non-success status and `Transport` if the request fails
    pub async fn trigger_search(
        &self,
        signals: &SearchSignals,
    ) -> Result<WorkflowResponse, WorkflowError> {
        let url = self
            .search_webhook_url
            .as_deref()
            .ok_or(WorkflowError::NotConfigured("search"))?;
        let payload = json!({
            "keywords": signals.boolean_query,
            "subcommunities": self.subreddit_search_url(&signals.subreddits),
        });

        let response = self.post("search", url, &payload).await?;
        Ok(WorkflowResponse {
            message: "Successfully triggered search workflow.".to_string(),
            response,
        })
    }

    /// Ask the poster workflow to comment on `post_id`
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` without a poster webhook, `Webhook` for a
    /// non-success status and `Transport` if the request fails
    pub async fn trigger_comment_post(
        &self,
        post_id: &str,
        comment: &str,
    ) -> Result<WorkflowResponse, WorkflowError> {
        let url = self
            .poster_webhook_url
            .as_deref()
            .ok_or(WorkflowError::NotConfigured("comment poster"))?;
        let payload = json!({
            "postId": post_id,
            "comment": comment,
        });

        let response = self.post("comment poster", url, &payload).await?;
        Ok(WorkflowResponse {
            message: "Successfully triggered comment poster workflow.".to_string(),
            response,
        })
    }

    async fn post(&self, name: &str, url: &str, payload: &Value) -> Result<String, WorkflowError> {
        LoggingHelper::log_webhook_trigger(name, payload);
        let response = self.http_client.post(url).json(payload).send().await?;

        let status = response.status();
        let body = response.text().await?;
        LoggingHelper::log_webhook_response(name, status.as_u16(), &body);

        if status.is_success() {
            Ok(body)
        } else {
            Err(WorkflowError::Webhook {
                status: status.as_u16(),
                body,
            })
        }
    }
}
