//! Normalized responses.

use super::Headers;
use bytes::Bytes;
use serde_json::Value;

/// A response body decoded by content type.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResponseData {
    /// No body was read (`204`/`205`, or an empty payload).
    #[default]
    Empty,
    /// `application/json` or `application/vnd.api+json`.
    Json(Value),
    /// Missing content type, `text/*` or `charset=utf-8`.
    Text(String),
    /// Anything else.
    Binary(Bytes),
}

impl ResponseData {
    /// Whether no body was read.
    pub fn is_empty(&self) -> bool {
        matches!(self, ResponseData::Empty)
    }

    /// The decoded JSON document, if the body was JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The body text, if the body was read as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The raw bytes, if the body was binary.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseData::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// A JSON view of the body.
    ///
    /// `Empty` maps to `null`, text to a JSON string and binary bodies to a
    /// lossily decoded string.
    pub fn to_value(&self) -> Value {
        match self {
            ResponseData::Empty => Value::Null,
            ResponseData::Json(value) => value.clone(),
            ResponseData::Text(text) => Value::String(text.clone()),
            ResponseData::Binary(bytes) => {
                Value::String(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }

    /// Consume into a JSON value, avoiding a clone for JSON bodies.
    pub fn into_value(self) -> Value {
        match self {
            ResponseData::Json(value) => value,
            other => other.to_value(),
        }
    }
}

/// `{status, url, headers, data}` of a received response.
///
/// Returned for successful calls and kept as the response snapshot of a
/// [`ClientError`](crate::ClientError).
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T = ResponseData> {
    /// HTTP status code.
    pub status: u16,
    /// URL of the response after redirects.
    pub url: String,
    /// Response headers as returned by the transport.
    pub headers: Headers,
    /// Decoded body.
    pub data: T,
}

impl<T> Response<T> {
    /// Replace the body, keeping status, URL and headers.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            status: self.status,
            url: self.url,
            headers: self.headers,
            data: f(self.data),
        }
    }

    /// The response `content-type`, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(crate::protocol::constants::headers::CONTENT_TYPE)
    }
}
