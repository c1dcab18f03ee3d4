//! JSON:API error handling.
//!
//! The [`json_api()`] plugin watches failures of requests sent with
//! `content-type: application/vnd.api+json` and attaches a [`JsonApiError`]
//! to them, giving typed access to the document's `errors` array.
//!
//! ```ignore
//! use cmskit::plugins::jsonapi::{json_api, json_api_options, json_api_url, JsonApiError};
//! use cmskit::{Client, ClientConfig, UrlOptions};
//!
//! let client = Client::plugin(json_api()).build(ClientConfig::new("https://cms.example.com"))?;
//! let url = json_api_url(&client, "node/article", &UrlOptions::new());
//!
//! if let Err(err) = client.request(&url, json_api_options(http::Method::POST)).await {
//!     if let Some(details) = JsonApiError::of(&err) {
//!         println!("invalid fields: {:?}", details.invalid_fields());
//!     }
//! }
//! ```

use crate::client::{plugin_fn, Client, Extension, Namespace, Plugin};
use crate::error::ClientError;
use crate::hooks::Rescue;
use crate::protocol::constants::{headers, media_types, REQUEST_HOOK};
use crate::protocol::is_json_api_content_type;
use crate::protocol::url::UrlOptions;
use crate::types::RequestOptions;
use http::Method;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Option holding the JSON:API path prefix.
pub const PREFIX_OPTION: &str = "json_api_prefix";

/// Prefix used when [`PREFIX_OPTION`] is unset.
pub const DEFAULT_PREFIX: &str = "jsonapi";

/// Namespace the plugin contributes to the client.
pub const NAMESPACE: &str = "json_api";

/// Where in the request an error originates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSource {
    /// JSON pointer into the request document, e.g. `/data/attributes/title`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    /// Offending query parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    /// Offending request header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

/// One entry of a JSON:API `errors` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonApiErrorObject {
    /// Unique identifier of this occurrence.
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    /// HTTP status, normalized to a string.
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    /// Application-specific code.
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,
    /// Short summary.
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    /// Explanation of this occurrence.
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub detail: Option<String>,
    /// Origin of the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
    /// Non-standard meta information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// Related links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
}

impl JsonApiErrorObject {
    /// Decode one `errors` entry.
    ///
    /// An entry that is not a JSON:API error object is kept with the raw
    /// value in `meta`.
    pub fn from_entry(entry: &Value) -> Self {
        serde_json::from_value(entry.clone()).unwrap_or_else(|_| Self {
            meta: Some(entry.clone()),
            ..Self::default()
        })
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(status)) => Some(status),
        Some(other) => Some(other.to_string()),
    })
}

/// Typed view of a failed JSON:API request, attached to a [`ClientError`].
#[derive(Debug, Clone, Default, PartialEq, Error)]
#[error("JSON:API request failed with {} error(s)", .errors.len())]
pub struct JsonApiError {
    errors: Vec<JsonApiErrorObject>,
}

impl JsonApiError {
    /// Re-derive `error` as a JSON:API failure.
    ///
    /// The structured entries of a JSON:API response are parsed and attached
    /// as a [`JsonApiError`]; a generic `Unknown error:` message is replaced
    /// by the first entry's `detail` (or `title`).
    pub fn from_error(error: ClientError) -> ClientError {
        let upgraded = ClientError::new(
            error.message(),
            error.status_code(),
            error.request(),
            error.response().cloned(),
        );

        let errors = if upgraded.is_structured_error() {
            upgraded
                .errors()
                .unwrap_or_default()
                .iter()
                .map(JsonApiErrorObject::from_entry)
                .collect()
        } else {
            Vec::new()
        };

        upgraded.with_domain(JsonApiError { errors })
    }

    /// The JSON:API details attached to `error`, if any.
    pub fn of(error: &ClientError) -> Option<&JsonApiError> {
        error.domain::<JsonApiError>()
    }

    /// The parsed error entries.
    pub fn errors(&self) -> &[JsonApiErrorObject] {
        &self.errors
    }

    /// Whether any entry reports `422 Unprocessable Entity`.
    pub fn has_validation_errors(&self) -> bool {
        self.errors
            .iter()
            .any(|error| error.status.as_deref() == Some("422"))
    }

    /// Entries whose status matches.
    pub fn errors_by_status(&self, status: u16) -> Vec<&JsonApiErrorObject> {
        let status = status.to_string();
        self.errors
            .iter()
            .filter(|error| error.status.as_deref() == Some(status.as_str()))
            .collect()
    }

    /// Names of the fields that failed validation: the last segment of each
    /// `422` entry's source pointer.
    pub fn invalid_fields(&self) -> Vec<String> {
        self.errors_by_status(422)
            .into_iter()
            .filter_map(|error| error.source.as_ref()?.pointer.as_deref())
            .filter_map(|pointer| pointer.rsplit('/').next())
            .map(str::to_string)
            .collect()
    }
}

/// The JSON:API plugin.
pub fn json_api() -> Arc<dyn Plugin> {
    static PLUGIN: OnceLock<Arc<dyn Plugin>> = OnceLock::new();
    PLUGIN
        .get_or_init(|| {
            plugin_fn("json_api", |client, config| {
                let prefix = config
                    .option_str(PREFIX_OPTION)
                    .unwrap_or(DEFAULT_PREFIX)
                    .to_string();

                client.hook().error(REQUEST_HOOK, |error: ClientError| async move {
                    let json_api_request = error
                        .request()
                        .header(headers::CONTENT_TYPE)
                        .is_some_and(is_json_api_content_type);
                    if json_api_request {
                        Rescue::Raise(JsonApiError::from_error(error))
                    } else {
                        Rescue::Forward(error)
                    }
                });

                let settings = Namespace::from([(
                    "prefix".to_string(),
                    Extension::from(Value::from(prefix)),
                )]);
                Ok(Some(Namespace::from([(
                    NAMESPACE.to_string(),
                    Extension::Map(settings),
                )])))
            })
        })
        .clone()
}

/// Build a URL under the configured JSON:API prefix.
pub fn json_api_url(client: &Client, path: &str, options: &UrlOptions) -> String {
    let prefix = client
        .extension_value(NAMESPACE, "prefix")
        .and_then(|prefix| prefix.as_str().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

    client.build_url(path, &options.clone().prefix(prefix))
}

/// Request options with JSON:API `accept` and `content-type` headers.
pub fn json_api_options(method: Method) -> RequestOptions {
    RequestOptions::new(method)
        .header(headers::ACCEPT, media_types::JSON_API)
        .header(headers::CONTENT_TYPE, media_types::JSON_API)
}
