//! Client configuration and logging.

use super::Transport;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Logger injected into the client and every request descriptor.
///
/// `debug` and `info` are silent by default; `warn` and `error` forward to
/// `tracing`.
pub trait Log: Send + Sync {
    /// Debug-level message.
    fn debug(&self, _message: &str, _info: Option<&Value>) {}

    /// Info-level message.
    fn info(&self, _message: &str, _info: Option<&Value>) {}

    /// Warning.
    fn warn(&self, message: &str, info: Option<&Value>) {
        match info {
            Some(info) => tracing::warn!(%info, "{}", message),
            None => tracing::warn!("{}", message),
        }
    }

    /// Error.
    fn error(&self, message: &str, info: Option<&Value>) {
        match info {
            Some(info) => tracing::error!(%info, "{}", message),
            None => tracing::error!("{}", message),
        }
    }
}

/// Routes every level to the matching `tracing` macro.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl Log for TracingLog {
    fn debug(&self, message: &str, info: Option<&Value>) {
        match info {
            Some(info) => tracing::debug!(%info, "{}", message),
            None => tracing::debug!("{}", message),
        }
    }

    fn info(&self, message: &str, info: Option<&Value>) {
        match info {
            Some(info) => tracing::info!(%info, "{}", message),
            None => tracing::info!("{}", message),
        }
    }
}

/// Construction-time configuration of a [`Client`](crate::Client).
///
/// Plugins receive a mutable reference while the client is being built and
/// read their own settings from [`options`](Self::options).
///
/// # Examples
///
/// ```
/// use cmskit::ClientConfig;
///
/// let config = ClientConfig::new("https://cms.example.com/")
///     .with_locale("en")
///     .with_default_locale("de")
///     .with_option("json_api_prefix", "api");
///
/// assert_eq!(config.option_str("json_api_prefix"), Some("api"));
/// ```
#[derive(Clone, Default)]
pub struct ClientConfig {
    /// Base URL; surrounding slashes are trimmed at build time.
    pub base_url: String,
    /// Active locale.
    pub locale: Option<String>,
    /// Locale that gets no URL segment.
    pub default_locale: Option<String>,
    /// Locales the backend serves. Replaces the derived list when set.
    pub available_locales: Option<Vec<String>>,
    /// Logger. Defaults to [`TracingLog`].
    pub log: Option<Arc<dyn Log>>,
    /// Transport. Defaults to [`ReqwestTransport`](crate::ReqwestTransport).
    pub transport: Option<Arc<dyn Transport>>,
    /// Initial `authorization` value.
    pub auth: Option<String>,
    /// `user-agent` sent with every request.
    pub agent: Option<String>,
    /// Plugin-specific settings.
    pub options: Map<String, Value>,
}

impl ClientConfig {
    /// Configuration for `base_url` with everything else unset.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the active locale.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Set the default locale.
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    /// Set the available locales.
    pub fn with_available_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_locales = Some(locales.into_iter().map(Into::into).collect());
        self
    }

    /// Use a custom logger.
    pub fn with_log(mut self, log: Arc<dyn Log>) -> Self {
        self.log = Some(log);
        self
    }

    /// Use a custom transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the initial credential.
    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    /// Set the `user-agent`.
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Set a plugin option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// A plugin option.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// A string plugin option.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.option(key).and_then(Value::as_str)
    }

    /// A boolean plugin option.
    pub fn option_bool(&self, key: &str) -> Option<bool> {
        self.option(key).and_then(Value::as_bool)
    }

    /// Move a deprecated option to its replacement.
    ///
    /// The deprecated key is removed and its value overwrites the
    /// replacement, so with several aliases the last one promoted wins.
    /// Returns whether the deprecated key was present.
    pub fn promote_option(&mut self, deprecated: &str, replacement: &str) -> bool {
        let Some(value) = self.options.remove(deprecated) else {
            return false;
        };
        self.options.insert(replacement.to_string(), value);
        true
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("locale", &self.locale)
            .field("default_locale", &self.default_locale)
            .field("available_locales", &self.available_locales)
            .field("log", &self.log.is_some())
            .field("transport", &self.transport.is_some())
            .field("auth", &self.auth.as_ref().map(|_| "[REDACTED]"))
            .field("agent", &self.agent)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let config = ClientConfig::new("https://cms.example.com")
            .with_available_locales(["en", "de"])
            .with_auth("Bearer t")
            .with_option("flag", true);

        assert_eq!(
            config.available_locales,
            Some(vec!["en".to_string(), "de".to_string()])
        );
        assert_eq!(config.option_bool("flag"), Some(true));
        assert_eq!(config.option_str("flag"), None);
    }

    #[test]
    fn test_debug_hides_auth() {
        let config = ClientConfig::new("https://x").with_auth("Bearer secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_promote_option() {
        let mut config = ClientConfig::new("https://x").with_option("apiPrefix", "old");
        assert!(config.promote_option("apiPrefix", "json_api_prefix"));
        assert_eq!(config.option("json_api_prefix"), Some(&json!("old")));
        assert!(config.option("apiPrefix").is_none());

        let mut config = ClientConfig::new("https://x")
            .with_option("apiPrefix", "old")
            .with_option("json_api_prefix", "new");
        assert!(config.promote_option("apiPrefix", "json_api_prefix"));
        assert_eq!(config.option_str("json_api_prefix"), Some("old"));

        assert!(!config.promote_option("missing", "json_api_prefix"));
        assert_eq!(config.option_str("json_api_prefix"), Some("old"));
    }

    #[test]
    fn test_promote_option_last_alias_wins() {
        let mut config = ClientConfig::new("https://x")
            .with_option("alias_a", "from_a")
            .with_option("alias_b", "from_b");

        assert!(config.promote_option("alias_a", "target"));
        assert!(config.promote_option("alias_b", "target"));
        assert_eq!(config.option_str("target"), Some("from_b"));
        assert!(config.option("alias_a").is_none());
        assert!(config.option("alias_b").is_none());
    }
}
