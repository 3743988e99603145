//! Request types for the Twitch API clients.
//!
//! A [`RequestEnvelope`] describes one logical call: method, path, query
//! parameters or body, and the credentials to authenticate with. It is built
//! once and reissued for every retry, refresh and pagination step.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::auth::Credentials;

/// HTTP methods used by the Twitch API clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// HTTP GET method for retrieving resources.
    Get,
    /// HTTP POST method for creating resources.
    Post,
    /// HTTP PUT method for updating resources.
    Put,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

/// Per-call options accepted by `get`, `post` and `put`.
///
/// # Example
///
/// ```rust
/// use twitch_api::{Credentials, RequestOptions};
///
/// let options = RequestOptions::default()
///     .credentials(Credentials::new("user-token").with_refresh_token("refresh"))
///     .header("X-Trace", "abc");
///
/// assert!(options.credentials.is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Credentials used to authenticate the call.
    pub credentials: Option<Credentials>,
    /// Headers added to the call, overriding the client defaults.
    pub extra_headers: HashMap<String, String>,
}

impl RequestOptions {
    /// Sets the credentials.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }
}

/// One logical API call.
///
/// The base URL is not part of the envelope; the dispatcher that sends it
/// joins `path` onto its own base.
///
/// # Example
///
/// ```rust
/// use twitch_api::clients::{HttpMethod, RequestEnvelope};
/// use serde_json::json;
///
/// let mut envelope = RequestEnvelope::new(HttpMethod::Get, "users")
///     .with_query(&json!({"login": ["twitchdev", "twitch"], "first": 20}));
///
/// envelope.set_query("after", "cursor-1");
///
/// assert_eq!(envelope.query.len(), 4);
/// assert_eq!(envelope.query_param("after"), Some("cursor-1"));
/// ```
#[derive(Clone, Debug)]
pub struct RequestEnvelope {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The path relative to the client's base URL.
    pub path: String,
    /// Query parameters, in order. Keys may repeat.
    pub query: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<Value>,
    /// Credentials to authenticate with.
    pub credentials: Option<Credentials>,
    /// Additional headers.
    pub extra_headers: HashMap<String, String>,
}

impl RequestEnvelope {
    /// Creates an envelope with no parameters or credentials.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            credentials: None,
            extra_headers: HashMap::new(),
        }
    }

    /// Appends the entries of a JSON object as query parameters.
    ///
    /// See [`query_pairs`] for the conversion rules.
    #[must_use]
    pub fn with_query(mut self, params: &Value) -> Self {
        self.query.extend(query_pairs(params));
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Applies per-call options.
    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.credentials = options.credentials;
        self.extra_headers.extend(options.extra_headers);
        self
    }

    /// Replaces the credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Sets a query parameter, replacing every existing value for `key`.
    pub fn set_query(&mut self, key: &str, value: impl Into<String>) {
        self.query.retain(|(k, _)| k != key);
        self.query.push((key.to_string(), value.into()));
    }

    /// Returns the first value of a query parameter.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Converts a JSON object into query pairs.
///
/// Strings are used as-is, numbers and booleans in their JSON form, arrays
/// become one pair per element, `null` is skipped and nested objects are sent
/// as JSON text. Anything other than an object yields no pairs.
#[must_use]
pub fn query_pairs(params: &Value) -> Vec<(String, String)> {
    let Some(object) = params.as_object() else {
        return Vec::new();
    };

    let mut pairs = Vec::new();
    for (key, value) in object {
        match value {
            Value::Array(items) => {
                pairs.extend(
                    items
                        .iter()
                        .filter_map(scalar_to_string)
                        .map(|v| (key.clone(), v)),
                );
            }
            other => {
                if let Some(v) = scalar_to_string(other) {
                    pairs.push((key.clone(), v));
                }
            }
        }
    }
    pairs
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// Verify request types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RequestEnvelope>();
    assert_send_sync::<RequestOptions>();
};
