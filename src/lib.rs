#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the signalscout application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod reddit;
pub mod session;
pub mod settings;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod utils;
pub mod workflow;

/// Re-export commonly used items
pub use error::{RedditError, WorkflowError};
pub use handlers::configure_services;
pub use session::{CallOutcome, PopupChannel, TokenLifecycleManager};
pub use settings::ScoutSettings;
pub use workflow::WorkflowClient;
