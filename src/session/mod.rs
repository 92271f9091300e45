//! Reddit session state
//!
//! - [`manager`] - the token lifecycle and the authenticated-call retry policy
//! - [`store`] - persistence for tokens and the pending `state` nonce
//! - [`popup`] - one-shot relay for the authorization handshake

pub mod manager;
pub mod popup;
pub mod store;

pub use manager::{CallOutcome, TokenLifecycleManager};
pub use popup::{AuthOutcome, PendingAuthorization, PopupChannel};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

use crate::settings::ScoutSettings;
use std::sync::Arc;

/// Pick the token store configured in settings
///
/// An empty `storage.token_file` keeps tokens in memory only.
#[must_use]
pub fn token_store_from_settings(settings: &ScoutSettings) -> Arc<dyn TokenStore> {
    if settings.storage.token_file.trim().is_empty() {
        log::info!("Reddit tokens kept in memory only");
        Arc::new(MemoryTokenStore::new())
    } else {
        log::info!(
            "Reddit tokens persisted to {}",
            settings.storage.token_file
        );
        Arc::new(FileTokenStore::new(
            &settings.storage.token_file,
            &settings.storage.storage_secret,
        ))
    }
}
