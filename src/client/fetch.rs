//! The client.
//!
//! Provides [`Client`], the handle every request and plugin goes through.
//!
//! # Examples
//!
//! ## Simple GET request
//!
//! ```ignore
//! use cmskit::{Client, ClientConfig, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::new("https://cms.example.com"))?;
//!     let response = client.request("/node/1", RequestOptions::get()).await?;
//!     println!("Status: {}", response.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Typed JSON
//!
//! ```ignore
//! use cmskit::{Client, ClientConfig, RequestOptions};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Node {
//!     title: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::new("https://cms.example.com"))?;
//!     let node = client.request_json::<Node>("/node/1", RequestOptions::get()).await?;
//!     println!("Title: {}", node.data.title);
//!     Ok(())
//! }
//! ```

use super::config::{ClientConfig, Log, TracingLog};
use super::executor;
use super::plugin::{merge_namespace, ClientFactory, Extension, Namespace, Plugin};
use super::transport::{ReqwestTransport, Transport};
use super::utils::{basic_credentials, bearer_credentials};
use crate::error::{BuildError, ClientError};
use crate::hooks::HookCollection;
use crate::protocol::constants::{headers, DEFAULT_AGENT, REQUEST_HOOK};
use crate::protocol::url::{compose_url, trim_slashes, UrlOptions};
use crate::types::{Headers, RequestDescriptor, RequestOptions, Response};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Hooks every [`Client::request`] runs through, under [`REQUEST_HOOK`].
pub type RequestHooks = HookCollection<RequestDescriptor, Response, ClientError>;

/// The client
///
/// A cheap, cloneable handle. Clones share hooks, credentials, locale and
/// plugin extensions.
///
/// # Features
///
/// - Plugin composition with identity de-duplication
/// - Named before / error / after hooks around every request
/// - Locale-aware URL building
/// - Errors carrying a redacted request snapshot
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: String,
    locale: RwLock<Option<String>>,
    default_locale: Option<String>,
    available_locales: Vec<String>,
    agent: String,
    log: Arc<dyn Log>,
    hook: RequestHooks,
    transport: Arc<dyn Transport>,
    auth: RwLock<Option<String>>,
    extensions: RwLock<Namespace>,
    factory: ClientFactory,
}

/// `(locale, default_locale, available_locales)` after defaults are applied.
fn resolve_locales(config: &ClientConfig) -> (Option<String>, Option<String>, Vec<String>) {
    let mut available = Vec::new();

    if let Some(locale) = &config.locale {
        available.push(locale.clone());
    }
    if let Some(default_locale) = &config.default_locale {
        if !available.contains(default_locale) {
            available.push(default_locale.clone());
        }
    }
    if let Some(explicit) = &config.available_locales {
        available = explicit.clone();
    }

    let locale = config.locale.clone().or_else(|| config.default_locale.clone());
    let default_locale = config.default_locale.clone().or_else(|| config.locale.clone());

    (locale, default_locale, available)
}

impl Client {
    /// Create a client without plugins.
    pub fn new(config: ClientConfig) -> Result<Self, BuildError> {
        ClientFactory::new().build(config)
    }

    /// A factory with `plugin` registered.
    pub fn plugin(plugin: Arc<dyn Plugin>) -> ClientFactory {
        ClientFactory::new().plugin(plugin)
    }

    /// A factory with every plugin in `plugins` registered, in order.
    pub fn with_plugins<I>(plugins: I) -> ClientFactory
    where
        I: IntoIterator<Item = Arc<dyn Plugin>>,
    {
        ClientFactory::new().with_plugins(plugins)
    }

    pub(crate) fn build(
        factory: ClientFactory,
        mut config: ClientConfig,
    ) -> Result<Self, BuildError> {
        let base_url = trim_slashes(&config.base_url).to_string();
        if base_url.is_empty() {
            return Err(BuildError::EmptyBaseUrl);
        }

        let (locale, default_locale, available_locales) = resolve_locales(&config);

        let transport: Arc<dyn Transport> = match config.transport.clone() {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        let client = Client {
            inner: Arc::new(ClientInner {
                base_url,
                locale: RwLock::new(locale),
                default_locale,
                available_locales,
                agent: config.agent.clone().unwrap_or_else(|| DEFAULT_AGENT.to_string()),
                log: config.log.clone().unwrap_or_else(|| Arc::new(TracingLog)),
                hook: RequestHooks::new(),
                transport,
                auth: RwLock::new(config.auth.clone()),
                extensions: RwLock::new(Namespace::new()),
                factory: factory.clone(),
            }),
        };

        for plugin in factory.plugins() {
            let namespace = plugin
                .apply(&client, &mut config)
                .map_err(|source| BuildError::Plugin {
                    plugin: plugin.name().to_string(),
                    source,
                })?;

            if let Some(namespace) = namespace {
                merge_namespace(&mut client.inner.extensions.write(), namespace);
            }
            tracing::debug!(plugin = plugin.name(), "plugin applied");
        }

        Ok(client)
    }

    /// Dispatch a request.
    ///
    /// `url` is relative to the base URL (locale and query are applied by
    /// [`build_url`](Self::build_url)) or absolute. The request runs through
    /// the [`REQUEST_HOOK`] hooks. Every failure, including hook failures,
    /// comes back as `Err`.
    pub async fn request(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response, ClientError> {
        let descriptor = self.descriptor(url, options);

        let client = self.clone();
        let result = self
            .inner
            .hook
            .run(
                REQUEST_HOOK,
                move |descriptor| async move {
                    let auth = client.inner.auth.read().clone();
                    executor::execute(
                        descriptor,
                        client.inner.transport.as_ref(),
                        &client.inner.agent,
                        auth.as_deref(),
                    )
                    .await
                },
                descriptor,
            )
            .await;

        if let Err(err) = &result {
            self.inner.log.debug(
                &format!("request failed: {err}"),
                Some(&Value::from(err.status_code())),
            );
        }

        result
    }

    /// Dispatch a request and decode the JSON body into `T`.
    ///
    /// A body that does not decode is reported as a [`ClientError`] carrying
    /// the response and its status.
    pub async fn request_json<T>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response<T>, ClientError>
    where
        T: DeserializeOwned,
    {
        let snapshot = self.descriptor(url, options.clone());
        let response = self.request(url, options).await?;

        match serde_json::from_value::<T>(response.data.to_value()) {
            Ok(data) => Ok(response.map(|_| data)),
            Err(err) => Err(ClientError::new(
                format!("failed to decode response: {err}"),
                response.status,
                &snapshot,
                Some(response),
            )),
        }
    }

    fn descriptor(&self, url: &str, options: RequestOptions) -> RequestDescriptor {
        let RequestOptions {
            method,
            headers: caller_headers,
            body,
            locale,
            default_locale,
            unauthenticated,
            extras,
            transport,
        } = options;

        let url = self.build_url(
            url,
            &UrlOptions {
                locale: locale.clone(),
                default_locale: default_locale.clone(),
                ..UrlOptions::default()
            },
        );

        let mut request_headers = Headers::from([(headers::USER_AGENT, self.agent())]);
        request_headers.extend(caller_headers);

        RequestDescriptor {
            method,
            headers: request_headers,
            body,
            url,
            base_url: self.inner.base_url.clone(),
            log: Some(self.inner.log.clone()),
            locale,
            default_locale,
            unauthenticated,
            extras,
            transport,
        }
    }

    /// Build a request URL.
    ///
    /// Per-call locale overrides in `options` win over the client's locale
    /// and default locale.
    ///
    /// ```
    /// use cmskit::{Client, ClientConfig, UrlOptions};
    ///
    /// let client = Client::new(
    ///     ClientConfig::new("https://cms.example.com").with_locale("en").with_default_locale("de"),
    /// ).unwrap();
    ///
    /// assert_eq!(client.build_url("/node", &UrlOptions::new()), "https://cms.example.com/en/node");
    /// assert_eq!(
    ///     client.build_url("/node", &UrlOptions::new().locale("de")),
    ///     "https://cms.example.com/node"
    /// );
    /// ```
    pub fn build_url(&self, path: &str, options: &UrlOptions) -> String {
        let locale = options.locale.clone().or_else(|| self.locale());
        let default_locale = options
            .default_locale
            .as_deref()
            .or(self.inner.default_locale.as_deref());

        compose_url(
            &self.inner.base_url,
            path,
            locale.as_deref(),
            default_locale,
            options,
        )
    }

    /// Replace the stored credential. `None` clears it.
    pub fn set_auth(&self, auth: Option<String>) {
        *self.inner.auth.write() = auth;
    }

    /// Store HTTP Basic credentials.
    pub fn set_basic_auth(&self, username: &str, password: &str) {
        self.set_auth(Some(basic_credentials(username, password)));
    }

    /// Store a bearer token.
    pub fn set_bearer_auth(&self, token: &str) {
        self.set_auth(Some(bearer_credentials(token)));
    }

    /// Whether a credential is stored.
    pub fn has_auth(&self) -> bool {
        self.inner.auth.read().is_some()
    }

    /// Switch the active locale.
    pub fn set_locale(&self, locale: impl Into<String>) {
        *self.inner.locale.write() = Some(locale.into());
    }

    /// The active locale.
    pub fn locale(&self) -> Option<String> {
        self.inner.locale.read().clone()
    }

    /// The default locale.
    pub fn default_locale(&self) -> Option<&str> {
        self.inner.default_locale.as_deref()
    }

    /// Locales the backend serves.
    pub fn available_locales(&self) -> &[String] {
        &self.inner.available_locales
    }

    /// The base URL, without surrounding slashes.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// The `user-agent` sent with every request.
    pub fn agent(&self) -> &str {
        &self.inner.agent
    }

    /// The logger.
    pub fn log(&self) -> &Arc<dyn Log> {
        &self.inner.log
    }

    /// The hook collection. Plugins register their hooks here.
    pub fn hook(&self) -> &RequestHooks {
        &self.inner.hook
    }

    /// A top-level extension contributed by a plugin.
    pub fn extension(&self, key: &str) -> Option<Extension> {
        self.inner.extensions.read().get(key).cloned()
    }

    /// A namespace contributed by a plugin.
    pub fn namespace(&self, key: &str) -> Option<Namespace> {
        self.inner
            .extensions
            .read()
            .get(key)
            .and_then(Extension::as_map)
            .cloned()
    }

    /// A typed service contributed by a plugin.
    pub fn service<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.inner.extensions.read().get(key)?.downcast::<T>()
    }

    /// A JSON value inside a namespace, whether the namespace is an
    /// [`Extension::Map`] or a JSON object.
    pub fn extension_value(&self, namespace: &str, key: &str) -> Option<Value> {
        let extensions = self.inner.extensions.read();
        match extensions.get(namespace)? {
            Extension::Map(map) => map.get(key)?.as_value().cloned(),
            Extension::Value(Value::Object(object)) => object.get(key).cloned(),
            _ => None,
        }
    }

    /// Names of the applied plugins, in application order.
    pub fn plugin_names(&self) -> Vec<String> {
        self.inner
            .factory
            .plugins()
            .iter()
            .map(|plugin| plugin.name().to_string())
            .collect()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .field("locale", &self.locale())
            .field("default_locale", &self.inner.default_locale)
            .field("available_locales", &self.inner.available_locales)
            .field("agent", &self.inner.agent)
            .field("plugins", &self.inner.factory)
            .field("hook", &self.inner.hook)
            .finish_non_exhaustive()
    }
}
