//! Bundled plugins.
//!
//! | Plugin | Constructor | What it does |
//! |--------|-------------|--------------|
//! | JSON:API | [`json_api()`] | Upgrades failures of JSON:API requests to [`JsonApiError`](jsonapi::JsonApiError) |
//! | Consumers | [`consumers()`] | Sends the configured consumer id header |
//! | Verification | [`verification()`] | Applies per-call [`Verification`](verification::Verification)s |
//!
//! [`oauth`] has no plugin; [`OAuthError::from_error`](oauth::OAuthError::from_error)
//! is called directly on failures of token endpoints.
//!
//! Each constructor returns the same shared instance every time, so
//! registering a plugin twice applies it once.

pub mod consumers;
pub mod jsonapi;
pub mod oauth;
pub mod verification;

pub use consumers::consumers;
pub use jsonapi::json_api;
pub use verification::verification;
