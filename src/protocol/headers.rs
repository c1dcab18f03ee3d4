//! Shared header parsing and formatting.
//!
//! | Helper | Purpose |
//! |--------|---------|
//! | [`media_type`] | Strip parameters from a `content-type` value |
//! | [`body_kind`] | Decide how a response body is read |
//! | [`is_json_api_content_type`] | Detect structured JSON:API payloads |
//! | [`redact_credentials`] | Mask an `authorization` value for snapshots |
//!
//! # Examples
//!
//! ```
//! use cmskit::protocol::{body_kind, redact_credentials, BodyKind};
//!
//! assert_eq!(body_kind(Some("application/vnd.api+json")), BodyKind::Json);
//! assert_eq!(body_kind(Some("text/html; charset=utf-8")), BodyKind::Text);
//! assert_eq!(body_kind(Some("image/png")), BodyKind::Binary);
//! assert_eq!(redact_credentials("Bearer secret"), "Bearer [REDACTED]");
//! ```

use super::constants::{media_types, REDACTED};

/// How a response body is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Parse as JSON.
    Json,
    /// Read as UTF-8 text.
    Text,
    /// Keep the raw bytes.
    Binary,
}

/// The media type of a `content-type` value, without parameters.
///
/// ```
/// use cmskit::protocol::media_type;
///
/// assert_eq!(media_type("application/json; charset=utf-8"), "application/json");
/// ```
pub fn media_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .unwrap_or_default()
}

/// Classify a response body by its `content-type`.
///
/// JSON and vendor JSON are parsed; a missing content type, `text/*` and
/// values ending in `charset=utf-8` are read as text; anything else stays
/// binary.
pub fn body_kind(content_type: Option<&str>) -> BodyKind {
    let Some(content_type) = content_type else {
        return BodyKind::Text;
    };
    let lowered = content_type.to_ascii_lowercase();

    if lowered.contains(media_types::JSON_API) || lowered.contains(media_types::JSON) {
        BodyKind::Json
    } else if lowered.starts_with("text/") || lowered.ends_with("charset=utf-8") {
        BodyKind::Text
    } else {
        BodyKind::Binary
    }
}

/// Whether a `content-type` value announces a JSON:API document.
pub fn is_json_api_content_type(content_type: &str) -> bool {
    media_type(content_type).eq_ignore_ascii_case(media_types::JSON_API)
}

/// Mask an `authorization` value.
///
/// Keeps the leading scheme token (word characters up to the first non-word
/// character) and replaces the remainder with `" [REDACTED]"`.
pub fn redact_credentials(value: &str) -> String {
    let scheme_end = value
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(value.len());

    format!("{} {}", &value[..scheme_end], REDACTED)
}
