//! OAuth token endpoint errors.
//!
//! Token endpoints answer failures with `{error, error_description, hint}`.
//! [`OAuthError::from_error`] attaches that payload to a [`ClientError`] and
//! [`OAuthError::invalid_request_type`] narrows `invalid_request` failures
//! down using the hint.

use crate::error::ClientError;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

/// The `error` value for malformed requests.
pub const INVALID_REQUEST: &str = "invalid_request";

/// What exactly was wrong with an `invalid_request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidRequestType {
    /// Anything not recognised below.
    Generic,
    /// A parameter was missing or invalid; holds its name.
    InvalidParameter(String),
    /// The authorization code was revoked.
    AuthCodeRevoked,
    /// The authorization code is malformed.
    AuthCodeMalformed,
    /// The authorization code expired.
    AuthCodeExpired,
    /// The authorization code belongs to another client.
    AuthCodeWrongClient,
    /// The authorization code could not be decrypted.
    AuthCodeDecryptError,
    /// The PKCE code verifier is malformed.
    CodeVerifierRfcError,
    /// The redirect URI does not match.
    RedirectUriInvalid,
    /// Unsupported code challenge method.
    CodeChallengeInvalid,
    /// The PKCE code challenge is malformed.
    CodeChallengeRfcError,
    /// Public clients must send a code challenge.
    CodeChallengeMissingPublicClient,
}

const HINTS: &[(&str, InvalidRequestType)] = &[
    ("Authorization code has been revoked", InvalidRequestType::AuthCodeRevoked),
    ("Authorization code malformed", InvalidRequestType::AuthCodeMalformed),
    ("Authorization code has expired", InvalidRequestType::AuthCodeExpired),
    (
        "Authorization code was not issued to this client",
        InvalidRequestType::AuthCodeWrongClient,
    ),
    ("Cannot decrypt the authorization code", InvalidRequestType::AuthCodeDecryptError),
    (
        "Code Verifier must follow the specifications of RFC-7636.",
        InvalidRequestType::CodeVerifierRfcError,
    ),
    ("Invalid redirect URI", InvalidRequestType::RedirectUriInvalid),
    (
        "Code challenge must follow the specifications of RFC-7636.",
        InvalidRequestType::CodeChallengeRfcError,
    ),
    (
        "Code challenge must be provided for public clients",
        InvalidRequestType::CodeChallengeMissingPublicClient,
    ),
];

fn parameter_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"`(\w+)`").ok()).as_ref()
}

fn challenge_method_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^Code challenge method must be one of .*$").ok())
        .as_ref()
}

/// An OAuth error payload, attached to a [`ClientError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("oauth error `{error}`")]
pub struct OAuthError {
    /// The `error` code (`invalid_request`, `invalid_grant`, ...).
    pub error: String,
    /// The `error_description`, if sent.
    pub description: Option<String>,
    /// The `hint`, if sent.
    pub hint: Option<String>,
}

impl OAuthError {
    /// Attach the OAuth payload of `error`'s response.
    ///
    /// Returns `error` unchanged when there is no response or its body has
    /// no string `error` field. Otherwise the message becomes the
    /// `error_description`, when one is present.
    pub fn from_error(error: ClientError) -> ClientError {
        let Some(payload) = error
            .response()
            .and_then(|response| response.data.as_json())
            .and_then(Self::from_payload)
        else {
            return error;
        };

        let message = payload
            .description
            .clone()
            .unwrap_or_else(|| error.message().to_string());
        error.with_message(message).with_domain(payload)
    }

    fn from_payload(data: &Value) -> Option<Self> {
        let text = |key: &str| data.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            error: text("error")?,
            description: text("error_description"),
            hint: text("hint"),
        })
    }

    /// The OAuth details attached to `error`, if any.
    pub fn of(error: &ClientError) -> Option<&OAuthError> {
        error.domain::<OAuthError>()
    }

    /// Classify an `invalid_request` failure by its hint.
    pub fn invalid_request_type(&self) -> InvalidRequestType {
        let Some(hint) = self.hint.as_deref() else {
            return InvalidRequestType::Generic;
        };
        if self.error != INVALID_REQUEST {
            return InvalidRequestType::Generic;
        }

        if hint.contains("Check the") {
            let parameter = parameter_pattern()
                .and_then(|pattern| pattern.captures(hint))
                .and_then(|captures| captures.get(1));
            if let Some(parameter) = parameter {
                return InvalidRequestType::InvalidParameter(parameter.as_str().to_string());
            }
        }

        for (text, kind) in HINTS {
            if hint.contains(text) {
                return kind.clone();
            }
        }

        if challenge_method_pattern().is_some_and(|pattern| pattern.is_match(hint)) {
            return InvalidRequestType::CodeChallengeInvalid;
        }

        InvalidRequestType::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Headers, RequestDescriptor, Response, ResponseData};
    use http::Method;
    use serde_json::json;

    fn failure(data: Option<Value>) -> ClientError {
        let request = RequestDescriptor::new(Method::POST, "https://x/oauth/token");
        let response = data.map(|data| Response {
            status: 400,
            url: request.url.clone(),
            headers: Headers::from([("content-type", "application/json")]),
            data: ResponseData::Json(data),
        });
        ClientError::new("test-error", 400, &request, response)
    }

    fn oauth(error: &str, hint: Option<&str>) -> OAuthError {
        OAuthError {
            error: error.to_string(),
            description: None,
            hint: hint.map(str::to_string),
        }
    }

    #[test]
    fn test_from_error() {
        let error = OAuthError::from_error(failure(Some(json!({
            "error": "invalid_grant",
            "error_description": "The provided authorization grant is invalid.",
            "hint": "Check the configuration"
        }))));

        assert_eq!(error.message(), "The provided authorization grant is invalid.");
        assert_eq!(error.status_code(), 400);
        let details = OAuthError::of(&error).unwrap();
        assert_eq!(details.error, "invalid_grant");
        assert_eq!(details.hint.as_deref(), Some("Check the configuration"));
    }

    #[test]
    fn test_from_error_keeps_message_without_description() {
        let error = OAuthError::from_error(failure(Some(json!({ "error": "invalid_client" }))));
        assert_eq!(error.message(), "test-error");
        assert!(OAuthError::of(&error).is_some());
    }

    #[test]
    fn test_from_error_returns_original() {
        let error = OAuthError::from_error(failure(None));
        assert!(OAuthError::of(&error).is_none());

        let error = OAuthError::from_error(failure(Some(json!({ "message": "x" }))));
        assert!(OAuthError::of(&error).is_none());

        let error = OAuthError::from_error(failure(Some(json!({ "error": 5 }))));
        assert!(OAuthError::of(&error).is_none());
        assert_eq!(error.message(), "test-error");
    }

    #[test]
    fn test_invalid_request_type() {
        let cases = [
            ("invalid_grant", Some("Invalid redirect URI"), InvalidRequestType::Generic),
            (INVALID_REQUEST, None, InvalidRequestType::Generic),
            (
                INVALID_REQUEST,
                Some("Check the `client_id` parameter"),
                InvalidRequestType::InvalidParameter("client_id".to_string()),
            ),
            (
                INVALID_REQUEST,
                Some("Authorization code has expired"),
                InvalidRequestType::AuthCodeExpired,
            ),
            (
                INVALID_REQUEST,
                Some("Code challenge method must be one of `plain` or `S256`"),
                InvalidRequestType::CodeChallengeInvalid,
            ),
            (
                INVALID_REQUEST,
                Some("Code challenge must be provided for public clients"),
                InvalidRequestType::CodeChallengeMissingPublicClient,
            ),
            (INVALID_REQUEST, Some("Something else entirely"), InvalidRequestType::Generic),
        ];

        for (error, hint, expected) in cases {
            assert_eq!(oauth(error, hint).invalid_request_type(), expected, "hint: {hint:?}");
        }
    }
}
