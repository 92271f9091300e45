// Authenticated Reddit actions
use crate::session::TokenLifecycleManager;
use crate::utils::responses::ResponseBuilder;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    /// Bare post id or full thread URL
    pub post_id: String,
    pub text: String,
}

/// Current Reddit account
pub async fn reddit_me(manager: web::Data<TokenLifecycleManager>) -> HttpResponse {
    match manager.get_current_user().await {
        Ok(outcome) => {
            let refreshed = outcome.was_refreshed();
            HttpResponse::Ok().json(json!({
                "user": outcome.into_inner(),
                "refreshed": refreshed,
            }))
        }
        Err(e) => ResponseBuilder::from_reddit_error(&e),
    }
}

/// Post a comment as the connected Reddit account
pub async fn reddit_comment(
    manager: web::Data<TokenLifecycleManager>,
    request: web::Json<CommentRequest>,
) -> HttpResponse {
    let request = request.into_inner();
    if request.post_id.trim().is_empty() || request.text.trim().is_empty() {
        return ResponseBuilder::error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "post_id and text are required",
        );
    }

    match manager.post_comment(request.post_id.trim(), &request.text).await {
        Ok(outcome) => {
            let refreshed = outcome.was_refreshed();
            HttpResponse::Ok().json(json!({
                "comment": outcome.into_inner(),
                "refreshed": refreshed,
            }))
        }
        Err(e) => ResponseBuilder::from_reddit_error(&e),
    }
}
