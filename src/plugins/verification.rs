//! Per-request verification headers.
//!
//! Some backend operations (changing a password, deleting an account) must be
//! confirmed with a verification value sent as a header. Attach one to a
//! single call with [`VerificationExt::verification`]; the plugin's `before`
//! hook turns it into the header. Nothing carries over to later requests.
//!
//! ```
//! use cmskit::plugins::verification::{Verification, VerificationExt};
//! use cmskit::RequestOptions;
//!
//! let options = RequestOptions::post().verification(Verification::hash("abc123"));
//! assert!(options.extras.contains_key("verification"));
//! ```

use crate::client::{plugin_fn, Plugin};
use crate::error::ClientError;
use crate::protocol::constants::REQUEST_HOOK;
use crate::types::{RequestDescriptor, RequestOptions};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Key under which a [`Verification`] travels in the request extras.
pub const VERIFICATION_EXTRA: &str = "verification";

/// Header used by hash verification.
pub const HASH_HEADER: &str = "x-verification-hash";

/// Header used by magic-code verification.
pub const MAGIC_CODE_HEADER: &str = "x-verification-magic-code";

/// A verification value sent as a request header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// Header name.
    pub header: String,
    /// Header value.
    pub value: String,
}

impl Verification {
    /// Verification through an arbitrary header.
    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            header: name.into(),
            value: value.into(),
        }
    }

    /// Hash verification.
    pub fn hash(hash: impl Into<String>) -> Self {
        Self::header(HASH_HEADER, hash)
    }

    /// Magic-code verification.
    pub fn magic_code(code: impl Into<String>) -> Self {
        Self::header(MAGIC_CODE_HEADER, code)
    }

    /// Set the header on `request`.
    pub fn apply(&self, request: &mut RequestDescriptor) {
        request.headers.insert(self.header.clone(), self.value.clone());
    }
}

/// Attach a [`Verification`] to [`RequestOptions`].
pub trait VerificationExt {
    /// Verify this call.
    fn verification(self, verification: Verification) -> Self;
}

impl VerificationExt for RequestOptions {
    fn verification(self, verification: Verification) -> Self {
        let value = serde_json::json!({
            "header": verification.header,
            "value": verification.value,
        });
        self.extra(VERIFICATION_EXTRA, value)
    }
}

fn take_verification(request: &mut RequestDescriptor) -> Result<Option<Verification>, ClientError> {
    let Some(value) = request.extras.remove(VERIFICATION_EXTRA) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }

    serde_json::from_value::<Verification>(value)
        .map(Some)
        .map_err(|err| ClientError::new(format!("invalid verification: {err}"), 500, request, None))
}

/// The verification plugin.
pub fn verification() -> Arc<dyn Plugin> {
    static PLUGIN: OnceLock<Arc<dyn Plugin>> = OnceLock::new();
    PLUGIN
        .get_or_init(|| {
            plugin_fn("verification", |client, _config| {
                client
                    .hook()
                    .before(REQUEST_HOOK, |mut request: RequestDescriptor| async move {
                        if let Some(verification) = take_verification(&mut request)? {
                            verification.apply(&mut request);
                        }
                        Ok::<_, ClientError>(request)
                    });
                Ok(None)
            })
        })
        .clone()
}
