//! Core data types that flow through the request kernel.
//!
//! # Type Flow
//!
//! ```text
//! RequestOptions ──(Client::request)──► RequestDescriptor ──(hooks, executor)──► Response
//!   caller input                          per-call, mutable                        normalized
//! ```
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RequestOptions`] | What a caller asks for: method, headers, body, locale overrides |
//! | [`RequestDescriptor`] | The resolved per-call record `before` hooks may rewrite |
//! | [`Headers`] | Case-preserving header map with case-insensitive lookup |
//! | [`Body`] | Text or JSON request payload |
//! | [`Response`] | `{status, url, headers, data}` for successful calls and error snapshots |
//! | [`ResponseData`] | Body decoded by content type |
//! | [`TransportOptions`] | Passthrough knobs for the transport (timeout, redirect, cache) |

mod headers;
mod request;
mod response;

pub use headers::Headers;
pub use request::{Body, Redirect, RequestDescriptor, RequestOptions, TransportOptions};
pub use response::{Response, ResponseData};
