//! URL composition.
//!
//! A relative path is resolved against the client's base URL in a fixed order:
//!
//! ```text
//! {base_url}[/{locale}][/{custom_prefix}][/{path}][?{query}]
//! ```
//!
//! - the locale segment appears only when a locale is set and differs from the
//!   default locale;
//! - every segment is trimmed of surrounding slashes with [`trim_slashes`];
//! - the query is serialized with nested-object rules (`filter[status]=1`,
//!   `include[0]=uid`).
//!
//! Absolute `http://` / `https://` URLs bypass composition entirely.

use serde_json::Value;

/// Per-call options for [`Client::build_url`](crate::Client::build_url).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlOptions {
    /// Locale override.
    pub locale: Option<String>,
    /// Default-locale override.
    pub default_locale: Option<String>,
    /// Segment inserted between the locale and the path (e.g. `jsonapi`).
    pub custom_prefix: Option<String>,
    /// Query parameters, usually a JSON object.
    pub query: Option<Value>,
}

impl UrlOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the locale.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Override the default locale.
    pub fn default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    /// Set the custom prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.custom_prefix = Some(prefix.into());
        self
    }

    /// Set the query parameters.
    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }
}

/// Strip every leading and trailing `/` from a segment.
///
/// Interior slashes are kept. The scan is idempotent and reduces an all-slash
/// input to the empty string.
///
/// ```
/// use cmskit::trim_slashes;
///
/// assert_eq!(trim_slashes("//a/b//"), "a/b");
/// assert_eq!(trim_slashes("///"), "");
/// ```
pub fn trim_slashes(segment: &str) -> &str {
    let bytes = segment.as_bytes();
    let mut start = 0;
    let mut end = bytes.len();

    while start < end && bytes[start] == b'/' {
        start += 1;
    }
    while end > start && bytes[end - 1] == b'/' {
        end -= 1;
    }

    &segment[start..end]
}

/// Whether `url` already carries an `http` or `https` scheme.
pub fn is_absolute_url(url: &str) -> bool {
    let lowered = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

/// Compose a request URL.
///
/// `locale` and `default_locale` are the effective values: callers resolve
/// per-call overrides against the client's configuration first.
pub fn compose_url(
    base_url: &str,
    path: &str,
    locale: Option<&str>,
    default_locale: Option<&str>,
    options: &UrlOptions,
) -> String {
    if is_absolute_url(path) {
        return path.to_string();
    }

    let mut url = base_url.to_string();

    if let Some(locale) = locale.filter(|locale| !locale.is_empty()) {
        if Some(locale) != default_locale {
            url.push('/');
            url.push_str(locale);
        }
    }

    if let Some(prefix) = options.custom_prefix.as_deref().filter(|p| !p.is_empty()) {
        url.push('/');
        url.push_str(trim_slashes(prefix));
    }

    if !path.is_empty() {
        url.push('/');
        url.push_str(trim_slashes(path));
    }

    if let Some(query) = &options.query {
        url.push('?');
        url.push_str(&to_query_string(query));
    }

    url
}

/// Serialize query parameters with nested-object rules.
///
/// Nested objects become `outer[inner]=value`, arrays use their index
/// (`list[0]=a`), `null` becomes an empty value and empty containers are
/// dropped. Keys and values are percent-encoded per RFC 3986: a space
/// becomes `%20` and unreserved characters (`-_.~`) are left alone.
///
/// ```
/// use cmskit::protocol::to_query_string;
/// use serde_json::json;
///
/// let query = json!({ "filter": { "status": 1 }, "include": ["uid"] });
/// assert_eq!(
///     to_query_string(&query),
///     "filter%5Bstatus%5D=1&include%5B0%5D=uid"
/// );
/// ```
pub fn to_query_string(query: &Value) -> String {
    let mut pairs = Vec::new();
    match query {
        Value::Object(map) => {
            for (key, value) in map {
                flatten(key.clone(), value, &mut pairs);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(index.to_string(), item, &mut pairs);
            }
        }
        _ => {}
    }

    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn flatten(prefix: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => pairs.push((prefix, String::new())),
        Value::Bool(flag) => pairs.push((prefix, flag.to_string())),
        Value::Number(number) => pairs.push((prefix, number.to_string())),
        Value::String(text) => pairs.push((prefix, text.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(format!("{prefix}[{index}]"), item, pairs);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten(format!("{prefix}[{key}]"), item, pairs);
            }
        }
    }
}
