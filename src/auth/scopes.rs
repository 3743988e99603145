//! OAuth scope handling for the Twitch API.
//!
//! This module provides the [`AuthScopes`] type for managing OAuth scopes.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A set of OAuth scopes for Twitch API access.
///
/// Twitch scopes look like `user:read:email` (Helix) or `user_read` (Kraken).
/// Scopes keep the order they were given in; duplicates are dropped.
/// Equality ignores order.
///
/// # Serialization
///
/// `AuthScopes` serializes to the space-separated form Twitch uses in
/// authorization URLs, and deserializes from either that form or the JSON
/// array returned by the token endpoint:
///
/// ```rust
/// use twitch_api::AuthScopes;
///
/// let scopes: AuthScopes = serde_json::from_str(r#"["chat:read","user:read:email"]"#).unwrap();
/// assert_eq!(scopes.to_string(), "chat:read user:read:email");
///
/// let json = serde_json::to_string(&scopes).unwrap();
/// assert_eq!(json, r#""chat:read user:read:email""#);
/// ```
#[derive(Clone, Debug, Default)]
pub struct AuthScopes {
    scopes: Vec<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the scope set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns `true` if this scope set contains every scope in `other`.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.iter().all(|scope| self.contains(scope))
    }

    /// Returns `true` if `scope` is in the set.
    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Returns an iterator over the scopes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    fn insert(&mut self, scope: String) {
        if !self.contains(&scope) {
            self.scopes.push(scope);
        }
    }

    fn validate(scope: &str) -> Result<(), ConfigError> {
        if scope
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-'))
        {
            Ok(())
        } else {
            Err(ConfigError::InvalidScopes {
                reason: format!("Invalid characters in scope: '{scope}'"),
            })
        }
    }
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    /// Parses scopes separated by whitespace or commas.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scopes = Self::new();

        for scope in s.split(|c: char| c.is_whitespace() || c == ',') {
            if scope.is_empty() {
                continue;
            }
            Self::validate(scope)?;
            scopes.insert(scope.to_string());
        }

        Ok(scopes)
    }
}

impl From<Vec<String>> for AuthScopes {
    fn from(list: Vec<String>) -> Self {
        let mut scopes = Self::new();
        for scope in list {
            let scope = scope.trim();
            if !scope.is_empty() {
                scopes.insert(scope.to_string());
            }
        }
        scopes
    }
}

impl PartialEq for AuthScopes {
    fn eq(&self, other: &Self) -> bool {
        self.scopes.len() == other.scopes.len() && self.covers(other)
    }
}

impl Eq for AuthScopes {}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scopes: Vec<&str> = self.iter().collect();
        f.write_str(&scopes.join(" "))
    }
}

impl Serialize for AuthScopes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AuthScopes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Joined(String),
            List(Vec<String>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Joined(s) => s.parse().map_err(de::Error::custom),
            Repr::List(list) => Ok(Self::from(list)),
        }
    }
}
