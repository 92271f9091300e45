// Reddit authorization handshake: login, popup wait, callback, status, logout
use crate::oauth::OAuthCallback;
use crate::session::{AuthOutcome, PopupChannel, TokenLifecycleManager};
use crate::settings::ScoutSettings;
use crate::utils::responses::ResponseBuilder;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use log::{debug, error, warn};
use serde_json::json;
use std::time::Duration;

/// Start an authorization attempt and open the popup handshake
///
/// Returns `{"authorization_url": ...}`; the front end opens it in a popup.
pub async fn reddit_login(
    manager: web::Data<TokenLifecycleManager>,
    popup: web::Data<PopupChannel>,
) -> HttpResponse {
    match manager.begin_authorization() {
        Ok(request) => {
            popup.open();
            HttpResponse::Ok()
                .insert_header(("Cache-Control", "no-store"))
                .json(json!({ "authorization_url": request.authorization_url }))
        }
        Err(e) => {
            error!("Failed to start Reddit authorization: {e}");
            ResponseBuilder::from_reddit_error(&e)
        }
    }
}

/// Wait for the popup to report back
///
/// Resolves once with `{"status": "success"}` or `{"status": "error", "error": ...}`.
pub async fn reddit_wait(
    popup: web::Data<PopupChannel>,
    settings: web::Data<ScoutSettings>,
) -> HttpResponse {
    let Some(pending) = popup.listen() else {
        return ResponseBuilder::error(
            StatusCode::CONFLICT,
            "no_pending_authorization",
            "No Reddit authorization is in progress or it already has a waiter",
        );
    };

    let limit = Duration::from_secs(settings.application.auth_wait_timeout_seconds);
    let outcome = pending.wait_timeout(limit).await;
    debug!("Authorization handshake finished: {outcome:?}");
    HttpResponse::Ok().json(outcome)
}

/// OAuth redirect target
///
/// Always relays exactly one outcome to the waiting initiator and answers with
/// the self-closing popup page.
pub async fn reddit_callback(
    query: web::Query<OAuthCallback>,
    manager: web::Data<TokenLifecycleManager>,
    popup: web::Data<PopupChannel>,
    settings: web::Data<ScoutSettings>,
) -> HttpResponse {
    let callback = query.into_inner();
    let outcome = process_callback(&callback, &manager).await;

    if !popup.deliver(outcome.clone()) {
        debug!("No initiator is waiting for this authorization outcome");
    }
    ResponseBuilder::callback_page(&outcome, &settings.get_frontend_origin())
}

async fn process_callback(callback: &OAuthCallback, manager: &TokenLifecycleManager) -> AuthOutcome {
    if let Some(provider_error) = &callback.error {
        error!("Reddit OAuth error: {provider_error}");
        discard_attempt(manager);
        return AuthOutcome::error(provider_error.clone());
    }

    let (Some(code), Some(state)) = (&callback.code, &callback.state) else {
        error!("OAuth callback without code or state");
        discard_attempt(manager);
        return AuthOutcome::error("missing code or state");
    };

    match manager.complete_authorization(code, state).await {
        Ok(()) => AuthOutcome::Success,
        Err(e) => {
            error!("Failed to exchange code for token: {e}");
            AuthOutcome::error(e.to_string())
        }
    }
}

fn discard_attempt(manager: &TokenLifecycleManager) {
    if let Err(e) = manager.discard_authorization() {
        warn!("Failed to discard pending authorization: {e}");
    }
}

/// Report whether a Reddit identity is connected
pub async fn reddit_status(manager: web::Data<TokenLifecycleManager>) -> HttpResponse {
    let credential = manager.credential().await;
    HttpResponse::Ok().json(json!({
        "authenticated": credential.is_authenticated(),
        "expires_at": credential.expires_at,
    }))
}

/// Forget the Reddit identity; safe to call repeatedly
pub async fn reddit_logout(manager: web::Data<TokenLifecycleManager>) -> HttpResponse {
    match manager.logout().await {
        Ok(()) => HttpResponse::Ok().json(json!({ "authenticated": false })),
        Err(e) => ResponseBuilder::from_reddit_error(&e),
    }
}
