//! Request options and the per-call request descriptor.

use super::Headers;
use crate::client::Log;
use http::Method;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Sent verbatim.
    Text(String),
    /// Objects and arrays are serialized to JSON before transmission.
    Json(Value),
}

impl Body {
    /// Serialize a JSON payload into its wire form.
    ///
    /// Objects and arrays become JSON text; a JSON string is sent as its
    /// contents and other scalars as their JSON representation.
    pub fn serialized(self) -> Body {
        match self {
            Body::Json(Value::String(text)) => Body::Text(text),
            Body::Json(value) => Body::Text(value.to_string()),
            text => text,
        }
    }

    /// The payload as it will be sent.
    pub fn to_wire(&self) -> String {
        match self {
            Body::Text(text) => text.clone(),
            Body::Json(Value::String(text)) => text.clone(),
            Body::Json(value) => value.to_string(),
        }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

/// Redirect handling requested from the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Redirect {
    /// Follow redirects (default).
    #[default]
    Follow,
    /// Treat a redirect response as a transport failure.
    Error,
    /// Return the redirect response as-is.
    Manual,
}

/// Options passed through untouched to the [`Transport`](crate::Transport).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    /// Per-request timeout. `None` leaves the transport's default in place.
    pub timeout: Option<Duration>,
    /// Redirect policy.
    pub redirect: Redirect,
    /// Cache mode hint (`"no-store"`, `"no-cache"`, `"reload"`, ...).
    pub cache: Option<String>,
    /// Free-form tags for transports that support tagged fetches.
    pub tags: Vec<String>,
}

/// What a caller passes to [`Client::request`](crate::Client::request).
///
/// # Examples
///
/// ```
/// use cmskit::RequestOptions;
/// use serde_json::json;
///
/// let options = RequestOptions::post()
///     .header("X-Custom", "value")
///     .json(json!({ "hello": "world" }))
///     .locale("de");
/// assert_eq!(options.method, http::Method::POST);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// HTTP method.
    pub method: Method,
    /// Caller headers. They are merged on top of the client defaults.
    pub headers: Headers,
    /// Optional payload.
    pub body: Option<Body>,
    /// Locale override for URL composition.
    pub locale: Option<String>,
    /// Default-locale override for URL composition.
    pub default_locale: Option<String>,
    /// Skip the stored credential and strip any `authorization` header.
    pub unauthenticated: bool,
    /// Plugin-defined per-call values.
    pub extras: Map<String, Value>,
    /// Transport passthrough options.
    pub transport: TransportOptions,
}

impl RequestOptions {
    /// Options for the given method.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// `GET` options.
    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    /// `POST` options.
    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    /// `PUT` options.
    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    /// `PATCH` options.
    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    /// `DELETE` options.
    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Set a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace all caller headers.
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Set a body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body.
    pub fn json(self, value: Value) -> Self {
        self.body(Body::Json(value))
    }

    /// Override the locale for this call.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Override the default locale for this call.
    pub fn default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    /// Send this call without credentials.
    pub fn unauthenticated(mut self) -> Self {
        self.unauthenticated = true;
        self
    }

    /// Attach a plugin-defined value.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    /// Set a per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = Some(timeout);
        self
    }

    /// Set the redirect policy.
    pub fn redirect(mut self, redirect: Redirect) -> Self {
        self.transport.redirect = redirect;
        self
    }

    /// Set a cache mode hint.
    pub fn cache(mut self, mode: impl Into<String>) -> Self {
        self.transport.cache = Some(mode.into());
        self
    }

    /// Add a transport tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.transport.tags.push(tag.into());
        self
    }
}

/// The resolved, per-call request record.
///
/// Created fresh by every [`Client::request`](crate::Client::request) call and
/// threaded through the `before` hooks, which may rewrite any field. The
/// executor sends exactly what the descriptor holds once the hooks are done.
#[derive(Clone)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: Method,
    /// Outgoing headers.
    pub headers: Headers,
    /// Optional payload.
    pub body: Option<Body>,
    /// Absolute request URL.
    pub url: String,
    /// The client's base URL.
    pub base_url: String,
    /// The client's logger.
    pub log: Option<Arc<dyn Log>>,
    /// Locale override the URL was built with.
    pub locale: Option<String>,
    /// Default-locale override the URL was built with.
    pub default_locale: Option<String>,
    /// Send without credentials.
    pub unauthenticated: bool,
    /// Plugin-defined per-call values.
    pub extras: Map<String, Value>,
    /// Transport passthrough options.
    pub transport: TransportOptions,
}

impl RequestDescriptor {
    /// A bare descriptor for `url`, mostly useful in tests and custom transports.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            headers: Headers::new(),
            body: None,
            url: url.into(),
            base_url: String::new(),
            log: None,
            locale: None,
            default_locale: None,
            unauthenticated: false,
            extras: Map::new(),
            transport: TransportOptions::default(),
        }
    }

    /// Look up a header, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("locale", &self.locale)
            .field("default_locale", &self.default_locale)
            .field("unauthenticated", &self.unauthenticated)
            .field("extras", &self.extras)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
