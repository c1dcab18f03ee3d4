//! Protocol-level helpers shared by the client and the plugins.
//!
//! - [`url`] - slash trimming, URL composition and nested query strings
//! - [`headers`] - content-type classification and credential redaction
//! - [`constants`] - header names, media types and defaults

pub mod constants;
pub mod headers;
pub mod url;

pub use headers::{body_kind, is_json_api_content_type, media_type, redact_credentials, BodyKind};
pub use self::url::{compose_url, is_absolute_url, to_query_string, trim_slashes, UrlOptions};
