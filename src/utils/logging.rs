// Centralized logging utilities for the OAuth lifecycle and webhook calls
use log::{debug, info, warn};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log that an authorization URL was handed out
    pub fn log_authorization_started(scopes: &str, redirect_uri: &str) {
        info!("🔍 Built Reddit OAuth URL with scopes: {scopes} (redirect_uri: {redirect_uri})");
    }

    /// Log a rejected callback `state`
    pub fn log_state_mismatch(pending: bool) {
        if pending {
            warn!("❌ OAuth state mismatch: callback state does not match the pending attempt");
        } else {
            warn!("❌ OAuth callback received but no authorization attempt is pending");
        }
    }

    /// Log token exchange start
    pub fn log_token_exchange_start() {
        info!("🔄 Exchanging authorization code for Reddit tokens");
    }

    /// Log token exchange summary without exposing token values
    pub fn log_token_exchange_summary(
        access_token_len: usize,
        refresh_token: Option<&String>,
        token_type: Option<&String>,
        scope: Option<&String>,
    ) {
        info!(
            "🔍 Token exchange summary: access_token={} chars, refresh_token={}, token_type={:?}, scope={:?}",
            access_token_len,
            refresh_token.map_or("missing", |_| "present"),
            token_type,
            scope,
        );
    }

    /// Log raw token endpoint failure for debugging
    pub fn log_token_endpoint_failure(grant_type: &str, status: u16, body: &str) {
        warn!("Token endpoint rejected {grant_type} grant with status {status}");
        debug!("Token endpoint response body: {body}");
    }

    /// Log a successful access token refresh
    pub fn log_token_refreshed() {
        info!("✅ Reddit access token refreshed");
    }

    /// Log the single retry after a 401
    pub fn log_retry_after_unauthorized() {
        info!("🔁 Reddit returned 401, retrying once with a refreshed access token");
    }

    /// Log a refresh failure that ends the retry sequence
    pub fn log_refresh_abandoned(reason: &str) {
        warn!("⚠️  Could not refresh Reddit access token: {reason}");
    }

    /// Log logout
    pub fn log_logout(had_tokens: bool) {
        if had_tokens {
            info!("👋 Reddit tokens cleared");
        } else {
            debug!("Logout requested with no stored Reddit tokens");
        }
    }

    /// Log a comment submission
    pub fn log_comment_submission(thing_id: &str, text_len: usize) {
        info!("📝 Posting comment to {thing_id} ({text_len} chars)");
    }

    /// Log a workflow webhook trigger
    pub fn log_webhook_trigger(name: &str, payload: &serde_json::Value) {
        info!("🚀 Triggering {name} workflow");
        debug!("Workflow payload: {payload}");
    }

    /// Log the outcome of a workflow webhook
    pub fn log_webhook_response(name: &str, status: u16, body: &str) {
        if (200..300).contains(&status) {
            info!("✅ {name} workflow triggered successfully");
            debug!("Workflow response: {body}");
        } else {
            warn!("❌ {name} workflow webhook failed with status {status}: {body}");
        }
    }
}
