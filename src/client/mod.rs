//! The client and everything it is built from.
//!
//! This module provides the request kernel, enabling callers to:
//!
//! - **Compose plugins** into a client factory, applied in order at build time
//! - **Intercept requests** with before / error / after hooks
//! - **Build URLs** with locale segments, prefixes and nested query strings
//! - **Swap the transport** for tests, caches or proxies
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── fetch     - Client, request dispatch and URL building
//! ├── plugin    - Plugin trait, ClientFactory and namespace merging
//! ├── executor  - Descriptor -> network call -> normalized result
//! ├── transport - Transport trait and the reqwest implementation
//! ├── config    - Client configuration and the Log trait
//! └── utils     - Utility functions
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Cloneable handle for requests, hooks and extensions |
//! | [`ClientFactory`] | Ordered, de-duplicated plugin list |
//! | [`Plugin`] | A feature module applied at build time |
//! | [`ClientConfig`] | Construction-time configuration |
//! | [`Transport`] | Network backend |
//!
//! # Examples
//!
//! ## Creating a Client
//!
//! ```
//! use cmskit::{Client, ClientConfig};
//!
//! let client = Client::new(
//!     ClientConfig::new("https://cms.example.com")
//!         .with_locale("en")
//!         .with_default_locale("de"),
//! )
//! .unwrap();
//!
//! assert_eq!(client.available_locales(), ["en", "de"]);
//! ```
//!
//! ## Utility Functions
//!
//! ```
//! use cmskit::client::{is_empty_body_status, is_error_status};
//!
//! assert!(is_empty_body_status(204));
//! assert!(is_error_status(404));
//! assert!(!is_error_status(302));
//! ```

mod config;
mod executor;
mod fetch;
mod plugin;
mod transport;
mod utils;

pub use config::{ClientConfig, Log, TracingLog};
pub use fetch::{Client, RequestHooks};
pub use plugin::{merge_namespace, plugin_fn, ClientFactory, Extension, Namespace, Plugin};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
pub use utils::*;
