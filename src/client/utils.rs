//! Utility functions for the client.
//!
//! This module provides helper functions for:
//! - Status code classification
//! - `authorization` header values

use base64::Engine;

/// Whether a status code never carries a body (`204 No Content`,
/// `205 Reset Content`).
///
/// # Examples
///
/// ```
/// use cmskit::client::is_empty_body_status;
///
/// assert!(is_empty_body_status(204));
/// assert!(!is_empty_body_status(200));
/// ```
pub fn is_empty_body_status(status: u16) -> bool {
    matches!(status, 204 | 205)
}

/// Whether a status code is a client or server error.
pub fn is_error_status(status: u16) -> bool {
    status >= 400
}

/// `authorization` value for HTTP Basic authentication.
///
/// ```
/// use cmskit::client::basic_credentials;
///
/// assert_eq!(basic_credentials("user", "pass"), "Basic dXNlcjpwYXNz");
/// ```
pub fn basic_credentials(username: &str, password: &str) -> String {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}

/// `authorization` value for a bearer token.
pub fn bearer_credentials(token: &str) -> String {
    format!("Bearer {token}")
}
