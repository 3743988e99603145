//! State parameter handling for OAuth CSRF protection.
//!
//! The state parameter is sent with the authorization URL and echoed back by
//! Twitch on the redirect. Comparing the two detects forged callbacks. It can
//! optionally carry custom data through the flow.
//!
//! # Example
//!
//! ```rust
//! use twitch_api::auth::oauth::StateParam;
//! use serde::{Serialize, Deserialize};
//!
//! let state = StateParam::new();
//! assert_eq!(state.as_ref().len(), 16);
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct FlowData {
//!     return_url: String,
//! }
//!
//! let state = StateParam::with_data(&FlowData { return_url: "/dashboard".to_string() });
//! let extracted: Option<FlowData> = state.extract_data();
//! assert_eq!(extracted.unwrap().return_url, "/dashboard");
//! ```

use base64::prelude::*;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// OAuth state parameter for CSRF protection and data preservation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateParam {
    value: String,
}

#[derive(Serialize, Deserialize)]
struct StructuredState<T> {
    nonce: String,
    data: T,
}

// Verify StateParam is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StateParam>();
};

impl StateParam {
    const NONCE_LENGTH: usize = 16;

    fn nonce() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::NONCE_LENGTH)
            .map(char::from)
            .collect()
    }

    /// Creates a new state parameter holding a random alphanumeric nonce.
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: Self::nonce(),
        }
    }

    /// Creates a state parameter embedding custom data next to a random nonce.
    ///
    /// The value is URL-safe base64 of `{"nonce": .., "data": ..}`.
    #[must_use]
    pub fn with_data<T: Serialize>(data: &T) -> Self {
        let structured = StructuredState {
            nonce: Self::nonce(),
            data,
        };
        let json = serde_json::to_string(&structured).unwrap_or_default();

        Self {
            value: BASE64_URL_SAFE_NO_PAD.encode(json.as_bytes()),
        }
    }

    /// Wraps a caller-chosen state string as-is.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self { value: raw.into() }
    }

    /// Returns `true` if `returned` is exactly this state.
    #[must_use]
    pub fn matches(&self, returned: &str) -> bool {
        self.value == returned
    }

    /// Extracts data embedded with [`with_data`](Self::with_data).
    ///
    /// Returns `None` for plain nonces or when the data does not deserialize to `T`.
    #[must_use]
    pub fn extract_data<T: DeserializeOwned>(&self) -> Option<T> {
        let decoded = BASE64_URL_SAFE_NO_PAD.decode(self.value.as_bytes()).ok()?;
        let structured: StructuredState<T> = serde_json::from_slice(&decoded).ok()?;
        Some(structured.data)
    }
}

impl Default for StateParam {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<str> for StateParam {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for StateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
