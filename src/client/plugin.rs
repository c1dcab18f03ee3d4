//! Plugin composition.
//!
//! A [`ClientFactory`] is an immutable, ordered list of [`Plugin`]s. Adding
//! plugins returns a new factory; the original is untouched. Building a
//! client applies every plugin in order, and whatever [`Namespace`] a plugin
//! returns is merged onto the client with [`merge_namespace`].
//!
//! Plugins are identified by `Arc` pointer, so registering the same instance
//! twice (directly or through two factories) applies it once.

use super::{Client, ClientConfig};
use crate::error::BuildError;
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Key/value extensions contributed by plugins.
pub type Namespace = BTreeMap<String, Extension>;

/// A single extension value.
#[derive(Clone)]
pub enum Extension {
    /// Plain data.
    Value(Value),
    /// A nested namespace.
    Map(Namespace),
    /// A typed service object, retrieved with [`Client::service`].
    Service(Arc<dyn Any + Send + Sync>),
}

impl Extension {
    /// Wrap a service object.
    pub fn service<T: Any + Send + Sync>(service: T) -> Self {
        Extension::Service(Arc::new(service))
    }

    /// The JSON value, if this is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Extension::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The nested namespace, if this is one.
    pub fn as_map(&self) -> Option<&Namespace> {
        match self {
            Extension::Map(map) => Some(map),
            _ => None,
        }
    }

    /// The service object, if it is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Extension::Service(service) => service.clone().downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extension::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Extension::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Extension::Service(_) => f.write_str("Service(..)"),
        }
    }
}

impl From<Value> for Extension {
    fn from(value: Value) -> Self {
        Extension::Value(value)
    }
}

impl From<Namespace> for Extension {
    fn from(map: Namespace) -> Self {
        Extension::Map(map)
    }
}

/// Merge `incoming` onto `target`.
///
/// Per top-level key, two maps (or two JSON objects) are merged key by key,
/// one level deep; in every other case the incoming value replaces the
/// existing one.
pub fn merge_namespace(target: &mut Namespace, incoming: Namespace) {
    for (key, incoming) in incoming {
        let incoming = match (target.get_mut(&key), incoming) {
            (Some(Extension::Map(existing)), Extension::Map(incoming)) => {
                existing.extend(incoming);
                continue;
            }
            (
                Some(Extension::Value(Value::Object(existing))),
                Extension::Value(Value::Object(incoming)),
            ) => {
                existing.extend(incoming);
                continue;
            }
            (_, incoming) => incoming,
        };
        target.insert(key, incoming);
    }
}

/// A feature module applied while a client is built.
///
/// `apply` may register hooks on [`Client::hook`], rewrite options on the
/// config that later plugins will see, and return a [`Namespace`] to expose
/// on the client.
pub trait Plugin: Send + Sync + 'static {
    /// Name used in logs and build errors.
    fn name(&self) -> &str;

    /// Apply the plugin to a client under construction.
    fn apply(
        &self,
        client: &Client,
        config: &mut ClientConfig,
    ) -> anyhow::Result<Option<Namespace>>;
}

struct FnPlugin<F> {
    name: String,
    apply: F,
}

impl<F> Plugin for FnPlugin<F>
where
    F: Fn(&Client, &mut ClientConfig) -> anyhow::Result<Option<Namespace>> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        client: &Client,
        config: &mut ClientConfig,
    ) -> anyhow::Result<Option<Namespace>> {
        (self.apply)(client, config)
    }
}

/// A plugin from a closure.
///
/// ```
/// use cmskit::client::plugin_fn;
/// use cmskit::{Client, ClientConfig};
///
/// let tracing = plugin_fn("trace", |client, _config| {
///     client.hook().before("request", |mut request: cmskit::RequestDescriptor| async move {
///         request.headers.insert("x-trace", "1");
///         Ok(request)
///     });
///     Ok(None)
/// });
///
/// let client = Client::plugin(tracing).build(ClientConfig::new("https://cms.example.com"));
/// assert!(client.is_ok());
/// ```
pub fn plugin_fn<F>(name: impl Into<String>, apply: F) -> Arc<dyn Plugin>
where
    F: Fn(&Client, &mut ClientConfig) -> anyhow::Result<Option<Namespace>> + Send + Sync + 'static,
{
    Arc::new(FnPlugin {
        name: name.into(),
        apply,
    })
}

/// An ordered, de-duplicated plugin list that builds clients.
#[derive(Clone, Default)]
pub struct ClientFactory {
    plugins: Arc<[Arc<dyn Plugin>]>,
}

impl ClientFactory {
    /// A factory without plugins.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new factory with `plugin` appended, unless it is already registered.
    pub fn plugin(&self, plugin: Arc<dyn Plugin>) -> Self {
        self.with_plugins([plugin])
    }

    /// A new factory with every plugin in `plugins` appended in order,
    /// skipping instances that are already registered.
    pub fn with_plugins<I>(&self, plugins: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Plugin>>,
    {
        let mut list: Vec<Arc<dyn Plugin>> = self.plugins.to_vec();
        for plugin in plugins {
            if !list.iter().any(|known| Arc::ptr_eq(known, &plugin)) {
                list.push(plugin);
            }
        }
        Self { plugins: list.into() }
    }

    /// Registered plugins, in application order.
    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Build a client, applying every plugin in order.
    pub fn build(&self, config: ClientConfig) -> Result<Client, BuildError> {
        Client::build(self.clone(), config)
    }
}

impl fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|plugin| plugin.name()))
            .finish()
    }
}
