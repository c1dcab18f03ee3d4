//! Error types and result handling.
//!
//! | Type | Produced by |
//! |------|-------------|
//! | [`ClientError`] | Every failed [`Client::request`](crate::Client::request) |
//! | [`TransportError`] | [`Transport`](crate::Transport) implementations |
//! | [`BuildError`] | [`ClientFactory::build`](crate::ClientFactory::build) |
//!
//! # Failure taxonomy
//!
//! 1. **Transport failure** - no response was obtained; status is forced to
//!    `500` and there is no response snapshot.
//! 2. **HTTP failure** - a response with status `>= 400`; the full response is
//!    kept and the message is derived from the body.
//! 3. **Reclassification** - an `error` hook attaches a domain error (see
//!    [`ClientError::with_domain`]) such as
//!    [`JsonApiError`](crate::plugins::jsonapi::JsonApiError).
//!
//! Nothing is retried inside the kernel.

use crate::protocol::constants::{headers, UNKNOWN_ERROR_PREFIX};
use crate::protocol::{is_json_api_content_type, redact_credentials};
use crate::types::{RequestDescriptor, Response};
use serde_json::{json, Value};
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Result alias for request outcomes.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// A failed request.
///
/// Carries the status code, a snapshot of the request with its
/// `authorization` header redacted, the response when one was received and,
/// for JSON:API responses, the parsed `errors` array.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    message: String,
    status_code: u16,
    request: RequestDescriptor,
    response: Option<Response>,
    errors: Option<Vec<Value>>,
    domain: Option<Arc<dyn StdError + Send + Sync>>,
}

impl ClientError {
    /// Build an error from the request that caused it and, if one was
    /// received, its response.
    ///
    /// The request is copied; the caller's descriptor is never modified.
    pub fn new(
        message: impl Into<String>,
        status_code: u16,
        request: &RequestDescriptor,
        response: Option<Response>,
    ) -> Self {
        let mut message = message.into();

        let mut request = request.clone();
        if let Some(credentials) = request.headers.get(headers::AUTHORIZATION) {
            let redacted = redact_credentials(credentials);
            request.headers.insert(headers::AUTHORIZATION, redacted);
        }

        let errors = response.as_ref().and_then(|response| {
            if is_json_api_response(response) {
                response
                    .data
                    .as_json()
                    .and_then(|data| data.get("errors"))
                    .and_then(Value::as_array)
                    .cloned()
            } else {
                Some(vec![response.data.to_value()])
            }
        });

        if message.starts_with(UNKNOWN_ERROR_PREFIX)
            && response.as_ref().is_some_and(is_json_api_response)
        {
            if let Some(replacement) = errors.as_ref().and_then(|e| e.first()).and_then(summary) {
                message = replacement;
            }
        }

        Self {
            message,
            status_code,
            request,
            response,
            errors,
            domain: None,
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status code (`500` for transport failures).
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// The redacted request snapshot.
    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    /// The response, if one was received.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Whether the failure happened before any response was received.
    pub fn is_transport_error(&self) -> bool {
        self.response.is_none()
    }

    /// Structured error entries.
    ///
    /// For JSON:API responses these are the document's `errors`; for any other
    /// response the whole body is the single entry.
    pub fn errors(&self) -> Option<&[Value]> {
        self.errors.as_deref()
    }

    /// The first structured error entry.
    pub fn first_error(&self) -> Option<&Value> {
        self.errors.as_ref().and_then(|errors| errors.first())
    }

    /// Whether the response was a JSON:API document with at least one error.
    pub fn is_structured_error(&self) -> bool {
        self.response.as_ref().is_some_and(is_json_api_response)
            && self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }

    /// The first error entry whose `code` matches.
    pub fn error_by_code(&self, code: &str) -> Option<&Value> {
        self.errors()?
            .iter()
            .find(|error| field_as_string(error, "code").as_deref() == Some(code))
    }

    /// All error entries whose `status` matches, compared as strings.
    pub fn errors_by_status(&self, status: u16) -> Vec<&Value> {
        let status = status.to_string();
        self.errors()
            .unwrap_or_default()
            .iter()
            .filter(|error| field_as_string(error, "status").as_deref() == Some(status.as_str()))
            .collect()
    }

    /// A JSON:API error object describing this failure.
    ///
    /// Structured errors return their first entry; anything else becomes a
    /// generic `{code, detail, status}` object.
    pub fn to_json_api_error(&self) -> Value {
        if self.is_structured_error() {
            if let Some(first) = self.first_error() {
                return first.clone();
            }
        }

        json!({
            "code": "client_error",
            "detail": self.message,
            "status": self.status_code.to_string(),
        })
    }

    /// Replace the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach a domain error, turning this into a more specific failure.
    ///
    /// Error hooks use this to reclassify a generic failure; callers get the
    /// details back with [`domain`](Self::domain).
    pub fn with_domain<E>(mut self, domain: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.domain = Some(Arc::new(domain));
        self
    }

    /// The attached domain error, if it is a `T`.
    pub fn domain<T>(&self) -> Option<&T>
    where
        T: StdError + 'static,
    {
        self.domain.as_deref()?.downcast_ref::<T>()
    }

    /// Whether any domain error is attached.
    pub fn has_domain(&self) -> bool {
        self.domain.is_some()
    }
}

fn is_json_api_response(response: &Response) -> bool {
    response.content_type().is_some_and(is_json_api_content_type)
}

fn summary(error: &Value) -> Option<String> {
    ["detail", "title"]
        .iter()
        .find_map(|field| error.get(*field).and_then(Value::as_str))
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn field_as_string(error: &Value, field: &str) -> Option<String> {
    match error.get(field)? {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Failures raised by a [`Transport`](crate::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be delivered (DNS, connection, TLS, ...).
    #[error("{0}")]
    Network(String),

    /// A redirect was received while the redirect policy forbids them.
    #[error("unexpected redirect to {0}")]
    Redirect(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Error reported by `reqwest`.
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

/// Failures while building a [`Client`](crate::Client).
#[derive(Debug, Error)]
pub enum BuildError {
    /// The configured base URL is empty after trimming.
    #[error("base URL must not be empty")]
    EmptyBaseUrl,

    /// A plugin failed while being applied.
    #[error("plugin `{plugin}` failed: {source}")]
    Plugin {
        /// Name of the failing plugin.
        plugin: String,
        /// What went wrong.
        #[source]
        source: anyhow::Error,
    },

    /// The default transport could not be created.
    #[error("failed to create transport: {0}")]
    Transport(#[from] TransportError),
}
