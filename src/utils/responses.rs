//! HTTP response helpers
//!
//! Every handler error goes through [`ResponseBuilder`], so clients always get
//! the same `{"error", "message"}` JSON shape.

use crate::error::{RedditError, WorkflowError};
use crate::session::AuthOutcome;
use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;
use serde_json::json;

pub struct ResponseBuilder;

impl ResponseBuilder {
    /// JSON error body with a machine-readable code and a human message
    #[must_use]
    pub fn error(status: StatusCode, error: &str, message: &str) -> HttpResponse {
        HttpResponse::build(status).json(json!({
            "error": error,
            "message": message,
        }))
    }

    /// Map a Reddit failure onto an HTTP response
    #[must_use]
    pub fn from_reddit_error(err: &RedditError) -> HttpResponse {
        let message = err.to_string();
        match err {
            RedditError::NotAuthenticated => {
                Self::error(StatusCode::UNAUTHORIZED, "not_authenticated", &message)
            }
            RedditError::NoRefreshToken | RedditError::RefreshFailed(_) => Self::error(
                StatusCode::UNAUTHORIZED,
                "reauthentication_required",
                &message,
            ),
            RedditError::Http { status: 401, .. } => Self::error(
                StatusCode::UNAUTHORIZED,
                "reauthentication_required",
                &message,
            ),
            RedditError::InvalidState => {
                Self::error(StatusCode::BAD_REQUEST, "invalid_state", &message)
            }
            RedditError::ProviderRejected(_) => {
                Self::error(StatusCode::UNPROCESSABLE_ENTITY, "provider_rejected", &message)
            }
            RedditError::TokenExchangeFailed { .. } => {
                Self::error(StatusCode::BAD_GATEWAY, "token_exchange_failed", &message)
            }
            RedditError::Http { status, body } => HttpResponse::BadGateway().json(json!({
                "error": "upstream_error",
                "message": message,
                "upstream_status": status,
                "upstream_body": body,
            })),
            RedditError::Transport(_) | RedditError::InvalidResponse(_) => {
                Self::error(StatusCode::BAD_GATEWAY, "bad_gateway", &message)
            }
            RedditError::Storage(_) | RedditError::Configuration(_) => {
                log::error!("Internal error: {message}");
                Self::error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server_error",
                    "An internal server error occurred",
                )
            }
        }
    }

    /// Map a workflow webhook failure onto an HTTP response
    #[must_use]
    pub fn from_workflow_error(err: &WorkflowError) -> HttpResponse {
        let message = err.to_string();
        match err {
            WorkflowError::NotConfigured(_) => {
                Self::error(StatusCode::SERVICE_UNAVAILABLE, "workflow_not_configured", &message)
            }
            WorkflowError::Webhook { status, body } => HttpResponse::BadGateway().json(json!({
                "error": "workflow_failed",
                "message": message,
                "upstream_status": status,
                "upstream_body": body,
            })),
            WorkflowError::Transport(_) => {
                Self::error(StatusCode::BAD_GATEWAY, "bad_gateway", &message)
            }
        }
    }

    /// Page served to the OAuth popup
    ///
    /// It posts `REDDIT_AUTH_SUCCESS` or `REDDIT_AUTH_ERROR` to the opener,
    /// restricted to `target_origin`, and closes itself.
    #[must_use]
    pub fn callback_page(outcome: &AuthOutcome, target_origin: &str) -> HttpResponse {
        let message = match outcome {
            AuthOutcome::Success => json!({"type": "REDDIT_AUTH_SUCCESS"}),
            AuthOutcome::Error { error } => json!({"type": "REDDIT_AUTH_ERROR", "error": error}),
        };
        let headline = if outcome.is_success() {
            "Reddit account connected."
        } else {
            "Reddit authentication failed."
        };

        let body = format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Reddit authentication</title></head>
<body>
<p>{headline}</p>
<p>This window will close automatically.</p>
<script>
if (window.opener) {{
  window.opener.postMessage({message}, {origin});
}}
window.close();
</script>
</body>
</html>
"#,
            message = script_literal(&message.to_string()),
            origin = script_literal(&json!(target_origin).to_string()),
        );

        HttpResponse::Ok()
            .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .body(body)
    }
}

// JSON is valid JavaScript, but "</" could close the surrounding script tag
fn script_literal(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_string(response: HttpResponse) -> String {
        let bytes = to_bytes(response.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[actix_web::test]
    async fn test_reddit_error_status_mapping() {
        let cases = [
            (RedditError::NotAuthenticated, StatusCode::UNAUTHORIZED),
            (RedditError::NoRefreshToken, StatusCode::UNAUTHORIZED),
            (RedditError::InvalidState, StatusCode::BAD_REQUEST),
            (
                RedditError::ProviderRejected("SHADOWBANNED".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                RedditError::Http {
                    status: 503,
                    body: String::new(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                RedditError::Storage("disk full".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ResponseBuilder::from_reddit_error(&err).status(), expected, "{err}");
        }
    }

    #[actix_web::test]
    async fn test_storage_error_details_are_hidden() {
        let response =
            ResponseBuilder::from_reddit_error(&RedditError::Storage("/secret/path".into()));
        let body = body_string(response).await;
        assert!(!body.contains("/secret/path"));
    }

    #[actix_web::test]
    async fn test_callback_page_escapes_script_content() {
        let outcome = AuthOutcome::error("</script><script>alert(1)</script>");
        let response = ResponseBuilder::callback_page(&outcome, "http://localhost:5173");
        let body = body_string(response).await;

        assert!(body.contains("REDDIT_AUTH_ERROR"));
        assert!(!body.contains("</script><script>"));
        assert!(body.contains("\"http://localhost:5173\""));
    }

    #[actix_web::test]
    async fn test_callback_page_success() {
        let response = ResponseBuilder::callback_page(&AuthOutcome::Success, "http://localhost:5173");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("REDDIT_AUTH_SUCCESS"));
        assert!(body.contains("window.close()"));
    }
}
