//! Network transport.
//!
//! The executor never talks to the network directly. It hands a
//! [`TransportRequest`] to a [`Transport`] and gets back a
//! [`TransportResponse`] whose body is read lazily, so `204`/`205` responses
//! never touch the payload.

use crate::error::TransportError;
use crate::protocol::constants::headers;
use crate::types::{Headers, Redirect, TransportOptions};
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use http::Method;
use std::fmt;
use url::Url;

/// A fully resolved request, ready to send.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Outgoing headers.
    pub headers: Headers,
    /// Serialized payload.
    pub body: Option<String>,
    /// Timeout, redirect and cache options.
    pub options: TransportOptions,
}

/// Status line and headers of a received response, with a deferred body.
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    /// Response headers.
    pub headers: Headers,
    body: BoxFuture<'static, Result<Bytes, TransportError>>,
}

impl TransportResponse {
    /// A response whose body is produced by `body` when read.
    pub fn new<F>(status: u16, url: impl Into<String>, headers: Headers, body: F) -> Self
    where
        F: std::future::Future<Output = Result<Bytes, TransportError>> + Send + 'static,
    {
        Self {
            status,
            url: url.into(),
            headers,
            body: body.boxed(),
        }
    }

    /// A response with an in-memory body.
    pub fn from_bytes(
        status: u16,
        url: impl Into<String>,
        headers: Headers,
        body: impl Into<Bytes>,
    ) -> Self {
        let body = body.into();
        Self::new(status, url, headers, async move { Ok(body) })
    }

    /// Read the whole body.
    pub async fn bytes(self) -> Result<Bytes, TransportError> {
        self.body.await
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Sends requests over the network.
///
/// Implement this to route requests through a custom stack (a mock in tests,
/// a tagged-fetch cache, a proxy).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request`. A non-2xx status is not an error at this level.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// The default [`Transport`], backed by `reqwest`.
///
/// Keeps two connection pools: one that follows redirects and one that
/// never does, used for [`Redirect::Error`] and [`Redirect::Manual`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    no_redirect: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with default settings.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a transport around an existing redirect-following client.
    pub fn with_client(client: reqwest::Client) -> Result<Self, TransportError> {
        let no_redirect = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            client,
            no_redirect,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let TransportRequest {
            method,
            url,
            headers: mut outgoing,
            body,
            options,
        } = request;

        let client = match options.redirect {
            Redirect::Follow => &self.client,
            Redirect::Error | Redirect::Manual => &self.no_redirect,
        };

        if let Some(cache) = options.cache.as_deref() {
            if !outgoing.contains(headers::CACHE_CONTROL) {
                match cache {
                    "no-store" => {
                        outgoing.insert(headers::CACHE_CONTROL, "no-store");
                    }
                    "no-cache" | "reload" => {
                        outgoing.insert(headers::CACHE_CONTROL, "no-cache");
                    }
                    _ => {}
                }
            }
        }

        let target = Url::parse(&url)
            .map_err(|err| TransportError::InvalidRequest(format!("{url}: {err}")))?;

        let mut builder = client.request(method, target);
        for (name, value) in outgoing.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        if options.redirect == Redirect::Error && response.status().is_redirection() {
            let location = response
                .headers()
                .get(headers::LOCATION)
                .and_then(|value| value.to_str().ok())
                .unwrap_or(url.as_str())
                .to_string();
            return Err(TransportError::Redirect(location));
        }

        let mut response_headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                response_headers.append(name.as_str(), value);
            }
        }

        let final_url = response.url().to_string();
        Ok(TransportResponse::new(
            status,
            final_url,
            response_headers,
            async move { Ok(response.bytes().await?) },
        ))
    }
}
