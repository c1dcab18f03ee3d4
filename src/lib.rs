#![warn(missing_docs)]

//! # cmskit: an extensible HTTP client kernel for headless CMS backends
//!
//! `cmskit` is the request kernel a family of CMS integrations is built on. Feature
//! modules ("plugins") cooperatively build and intercept outgoing requests without
//! knowing about each other, and every response or failure is normalized into a
//! single [`Result`] shape.
//!
//! ## Overview
//!
//! The kernel is made of four pieces:
//!
//! 1. **Plugin composition** - a [`ClientFactory`] carries an ordered, de-duplicated
//!    list of [`Plugin`]s. Building a client applies each plugin in order and merges
//!    the namespaces they return onto the instance.
//! 2. **Hook pipeline** - a [`HookCollection`] runs `before`, `error` and `after`
//!    callbacks around every request.
//! 3. **Request executor** - builds the final URL (locale, prefix, query), dispatches
//!    through a [`Transport`] and classifies the response by status and content type.
//! 4. **Error model** - [`ClientError`] keeps a credential-redacted request snapshot,
//!    the response (when one was received) and structured JSON:API error entries.
//!
//! ## Client Usage
//!
//! ```ignore
//! use cmskit::{Client, ClientConfig, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(
//!         ClientConfig::new("https://cms.example.com")
//!             .with_locale("en")
//!             .with_default_locale("de"),
//!     )?;
//!
//!     // GET https://cms.example.com/en/node/1
//!     let response = client.request("/node/1", RequestOptions::get()).await?;
//!     println!("{} {:?}", response.status, response.data);
//!     Ok(())
//! }
//! ```
//!
//! ## Plugins
//!
//! ```ignore
//! use cmskit::plugins::{consumers, json_api, verification};
//! use cmskit::{Client, ClientConfig};
//!
//! let factory = Client::with_plugins([json_api(), consumers(), verification()]);
//! let client = factory.build(
//!     ClientConfig::new("https://cms.example.com")
//!         .with_option("consumer_id", "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d"),
//! )?;
//! ```
//!
//! ## Hooks
//!
//! ```ignore
//! use cmskit::{RequestDescriptor, REQUEST_HOOK};
//!
//! client.hook().before(REQUEST_HOOK, |mut request: RequestDescriptor| async move {
//!     request.headers.insert("x-trace", "1");
//!     Ok(request)
//! });
//! ```
//!
//! ## Module Structure
//!
//! - **[client]** - [`Client`], configuration, plugins, transport and the executor
//! - **[hooks]** - the generic before/error/after pipeline
//! - **[error]** - [`ClientError`] and construction errors
//! - **[types]** - request descriptors, options, headers and responses
//! - **[protocol]** - URL composition, header helpers and constants
//! - **[plugins]** - bundled plugins (JSON:API errors, consumers, verification, OAuth errors)

pub mod client;
pub mod error;
pub mod hooks;
pub mod plugins;
pub mod protocol;
pub mod types;

pub use client::{
    Client, ClientConfig, ClientFactory, Extension, Log, Namespace, Plugin, ReqwestTransport,
    RequestHooks, TracingLog, Transport, TransportRequest, TransportResponse,
};
pub use error::{BuildError, ClientError, Result, TransportError};
pub use hooks::{HookCollection, Rescue};
pub use protocol::constants::REQUEST_HOOK;
pub use protocol::url::{trim_slashes, UrlOptions};
pub use types::{
    Body, Headers, Redirect, RequestDescriptor, RequestOptions, Response, ResponseData,
    TransportOptions,
};

#[cfg(test)]
mod tests;
