//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated Twitch application client ID.
///
/// # Example
///
/// ```rust
/// use twitch_api::ClientId;
///
/// let id = ClientId::new("abc123").unwrap();
/// assert_eq!(id.as_ref(), "abc123");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientId(String);

impl ClientId {
    /// Creates a new validated client ID.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyClientId`] if the ID is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ConfigError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ConfigError::EmptyClientId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated Twitch application client secret.
///
/// The `Debug` implementation masks the secret value, displaying only
/// `ClientSecret(*****)`.
///
/// # Example
///
/// ```rust
/// use twitch_api::ClientSecret;
///
/// let secret = ClientSecret::new("my-secret").unwrap();
/// assert_eq!(format!("{:?}", secret), "ClientSecret(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecret(String);

impl ClientSecret {
    /// Creates a new validated client secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyClientSecret`] if the secret is empty.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(ConfigError::EmptyClientSecret);
        }
        Ok(Self(secret))
    }
}

impl AsRef<str> for ClientSecret {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret(*****)")
    }
}

/// Checks that `url` is an absolute http(s) URL with a non-empty host.
fn validate_http_url(url: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        url: url.to_string(),
    };

    let (scheme, remainder) = url.split_once("://").ok_or_else(invalid)?;
    if scheme != "http" && scheme != "https" {
        return Err(invalid());
    }

    let host_end = remainder.find([':', '/', '?', '#']).unwrap_or(remainder.len());
    if remainder[..host_end].is_empty() {
        return Err(invalid());
    }

    Ok(())
}

/// A validated base URL that request paths are appended to.
///
/// Trailing slashes are removed so that `"{base}/{path}"` never produces a
/// double slash.
///
/// # Example
///
/// ```rust
/// use twitch_api::BaseUrl;
///
/// let url = BaseUrl::new("https://api.twitch.tv/helix/").unwrap();
/// assert_eq!(url.as_ref(), "https://api.twitch.tv/helix");
/// assert_eq!(url.join("users"), "https://api.twitch.tv/helix/users");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseUrl(String);

impl BaseUrl {
    /// Creates a new validated base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the URL has no http(s) scheme or host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let url = url.trim().trim_end_matches('/').to_string();
        validate_http_url(&url)?;
        Ok(Self(url))
    }

    /// Appends a path to this base URL, inserting exactly one slash.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.0, path.trim_start_matches('/'))
    }
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated OAuth redirect URI.
///
/// Unlike [`BaseUrl`], the value is kept exactly as registered with Twitch,
/// since the identity service compares it byte for byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectUri(String);

impl RedirectUri {
    /// Creates a new validated redirect URI.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the URI has no http(s) scheme or host.
    pub fn new(uri: impl Into<String>) -> Result<Self, ConfigError> {
        let uri = uri.into().trim().to_string();
        validate_http_url(&uri)?;
        Ok(Self(uri))
    }
}

impl AsRef<str> for RedirectUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for RedirectUri {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RedirectUri {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}
