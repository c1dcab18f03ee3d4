//! Consumer identification.
//!
//! Sends the configured consumer id with every request so the backend can
//! apply per-consumer settings.
//!
//! | Option | Default | Meaning |
//! |--------|---------|---------|
//! | `consumer_id` | unset | Value of the header; nothing is sent when unset |
//! | `consumer_header_name` | `X-Consumer-ID` | Header name |
//! | `consumer_uuid` | | Deprecated alias of `consumer_id` |

use crate::client::{plugin_fn, Plugin};
use crate::error::ClientError;
use crate::protocol::constants::REQUEST_HOOK;
use crate::types::RequestDescriptor;
use std::sync::{Arc, OnceLock};

/// Option holding the consumer id.
pub const CONSUMER_ID_OPTION: &str = "consumer_id";

/// Deprecated spelling of [`CONSUMER_ID_OPTION`].
pub const CONSUMER_UUID_OPTION: &str = "consumer_uuid";

/// Option holding the header name.
pub const HEADER_NAME_OPTION: &str = "consumer_header_name";

/// Header used when [`HEADER_NAME_OPTION`] is unset.
pub const DEFAULT_HEADER_NAME: &str = "X-Consumer-ID";

/// The consumers plugin.
pub fn consumers() -> Arc<dyn Plugin> {
    static PLUGIN: OnceLock<Arc<dyn Plugin>> = OnceLock::new();
    PLUGIN
        .get_or_init(|| {
            plugin_fn("consumers", |client, config| {
                if config.promote_option(CONSUMER_UUID_OPTION, CONSUMER_ID_OPTION) {
                    client.log().warn(
                        "`consumer_uuid` is deprecated, use `consumer_id` instead",
                        None,
                    );
                }

                let header_name = config
                    .option_str(HEADER_NAME_OPTION)
                    .unwrap_or(DEFAULT_HEADER_NAME)
                    .to_string();
                let Some(consumer_id) = config.option_str(CONSUMER_ID_OPTION).map(str::to_string)
                else {
                    return Ok(None);
                };

                client
                    .hook()
                    .before(REQUEST_HOOK, move |mut request: RequestDescriptor| {
                        let header_name = header_name.clone();
                        let consumer_id = consumer_id.clone();
                        async move {
                            request.headers.insert(header_name, consumer_id);
                            Ok::<_, ClientError>(request)
                        }
                    });
                Ok(None)
            })
        })
        .clone()
}
