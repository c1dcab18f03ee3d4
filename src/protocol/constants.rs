//! Protocol constants.

/// Name of the hook every [`Client::request`](crate::Client::request) runs through.
pub const REQUEST_HOOK: &str = "request";

/// Default `user-agent` sent with every request.
pub const DEFAULT_AGENT: &str = concat!("cmskit/", env!("CARGO_PKG_VERSION"));

/// Marker that replaces redacted credentials.
pub const REDACTED: &str = "[REDACTED]";

/// Message prefix used when an error body carries no usable message.
pub const UNKNOWN_ERROR_PREFIX: &str = "Unknown error:";

/// Header names used by the kernel.
pub mod headers {
    /// `authorization`
    pub const AUTHORIZATION: &str = "authorization";
    /// `user-agent`
    pub const USER_AGENT: &str = "user-agent";
    /// `content-type`
    pub const CONTENT_TYPE: &str = "content-type";
    /// `accept`
    pub const ACCEPT: &str = "accept";
    /// `cache-control`
    pub const CACHE_CONTROL: &str = "cache-control";
    /// `location`
    pub const LOCATION: &str = "location";
}

/// Media types the executor and error model recognise.
pub mod media_types {
    /// Plain JSON.
    pub const JSON: &str = "application/json";
    /// JSON:API documents, including multi-error payloads.
    pub const JSON_API: &str = "application/vnd.api+json";
}
