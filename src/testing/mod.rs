//! Shared testing utilities
//!
//! - [`fixtures`] - settings, stores, managers and canned Reddit responses
//! - [`mock`] - callback query builders
//!
//! ## Usage
//!
//! ```rust
//! use signalscout::testing::fixtures::TestFixtures;
//!
//! let settings = TestFixtures::settings("http://127.0.0.1:9");
//! assert_eq!(settings.reddit.client_id.as_deref(), Some(TestFixtures::CLIENT_ID));
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;
pub use mock::MockOAuthCallback;
