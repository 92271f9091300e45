// HTTP request handlers for the Reddit session service
pub mod oauth;
pub mod reddit;
pub mod workflow;

use actix_web::{web, HttpResponse};

// Re-export the main handler functions
pub use oauth::{reddit_callback, reddit_login, reddit_logout, reddit_status, reddit_wait};
pub use reddit::{reddit_comment, reddit_me};
pub use workflow::{trigger_comment_post, trigger_search};

/// Health check
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

/// Register every route; shared by `main` and the handler tests
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Reddit OAuth endpoints
        .route("/auth/reddit/login", web::get().to(reddit_login))
        .route("/auth/reddit/wait", web::get().to(reddit_wait))
        .route("/auth/reddit/callback", web::get().to(reddit_callback))
        .route("/auth/reddit/status", web::get().to(reddit_status))
        .route("/auth/reddit/logout", web::post().to(reddit_logout))
        // Authenticated Reddit actions
        .route("/api/reddit/me", web::get().to(reddit_me))
        .route("/api/reddit/comment", web::post().to(reddit_comment))
        // Workflow triggers
        .route("/api/workflow/search", web::post().to(trigger_search))
        .route("/api/workflow/comment", web::post().to(trigger_comment_post))
        // Health endpoint
        .route("/ping", web::get().to(health));
}
