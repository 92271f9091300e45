// Workflow automation triggers
use crate::models::SearchSignals;
use crate::utils::responses::ResponseBuilder;
use crate::workflow::WorkflowClient;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowCommentRequest {
    pub post_id: String,
    pub comment: String,
}

/// Start the Reddit search workflow
pub async fn trigger_search(
    client: web::Data<WorkflowClient>,
    signals: web::Json<SearchSignals>,
) -> HttpResponse {
    if signals.subreddits.is_empty() || signals.boolean_query.trim().is_empty() {
        return ResponseBuilder::error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "subreddits and boolean_query are required",
        );
    }

    match client.trigger_search(&signals).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => ResponseBuilder::from_workflow_error(&e),
    }
}

/// Hand a drafted comment to the poster workflow
pub async fn trigger_comment_post(
    client: web::Data<WorkflowClient>,
    request: web::Json<WorkflowCommentRequest>,
) -> HttpResponse {
    if request.post_id.trim().is_empty() || request.comment.trim().is_empty() {
        return ResponseBuilder::error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "postId and comment are required",
        );
    }

    match client
        .trigger_comment_post(request.post_id.trim(), &request.comment)
        .await
    {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => ResponseBuilder::from_workflow_error(&e),
    }
}
