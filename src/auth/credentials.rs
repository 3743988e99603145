//! Bearer credentials for authenticated Twitch API calls.

use crate::auth::AuthScopes;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An access/refresh token pair used to authenticate a call.
///
/// Credentials are immutable once issued: a refresh produces a *new*
/// `Credentials` value and never mutates an existing one. They are
/// serializable so applications can persist them between runs.
///
/// # Example
///
/// ```rust
/// use twitch_api::Credentials;
///
/// let credentials = Credentials::new("access-token").with_refresh_token("refresh-token");
///
/// assert!(credentials.can_refresh());
/// assert!(!credentials.expired());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// The access token sent with each request.
    pub access_token: String,

    /// The refresh token, if the grant issued one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// When the access token expires, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// The scopes granted to the access token.
    #[serde(default)]
    pub scopes: AuthScopes,
}

impl Credentials {
    /// Creates credentials holding only an access token.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            scopes: AuthScopes::new(),
        }
    }

    /// Returns a copy of these credentials carrying the given refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Returns a copy of these credentials with the given expiry.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Builds credentials from a token endpoint response.
    ///
    /// `expires_in` is converted to an absolute expiry relative to now.
    #[must_use]
    pub fn from_token_response(response: AccessTokenResponse) -> Self {
        let expires_at = response
            .expires_in
            .map(|seconds| Utc::now() + Duration::seconds(seconds));

        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at,
            scopes: response.scope,
        }
    }

    /// Returns `true` if the access token has a known expiry in the past.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expires_at.is_some_and(|expires| Utc::now() > expires)
    }

    /// Returns `true` if these credentials carry a non-empty refresh token.
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"*****")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "*****"))
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Successful response body of the Twitch token endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct AccessTokenResponse {
    /// The issued access token.
    pub access_token: String,
    /// The issued refresh token. Absent for client-credentials grants.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Granted scopes.
    #[serde(default)]
    pub scope: AuthScopes,
    /// Token type, normally `bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
}

// Verify Credentials is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Credentials>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_expired() {
        let past = Credentials::new("t").with_expires_at(Utc::now() - Duration::hours(1));
        assert!(past.expired());

        let future = Credentials::new("t").with_expires_at(Utc::now() + Duration::hours(1));
        assert!(!future.expired());

        assert!(!Credentials::new("t").expired());
    }

    #[test]
    fn test_can_refresh_requires_non_empty_refresh_token() {
        assert!(!Credentials::new("t").can_refresh());
        assert!(!Credentials::new("t").with_refresh_token("").can_refresh());
        assert!(Credentials::new("t").with_refresh_token("r").can_refresh());
    }

    #[test]
    fn test_from_token_response_computes_expiry() {
        let response: AccessTokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "new-access",
            "refresh_token": "new-refresh",
            "expires_in": 3600,
            "scope": ["chat:read"],
            "token_type": "bearer"
        }))
        .unwrap();

        let credentials = Credentials::from_token_response(response);

        assert_eq!(credentials.access_token, "new-access");
        assert_eq!(credentials.refresh_token.as_deref(), Some("new-refresh"));
        let remaining = credentials.expires_at.unwrap() - Utc::now();
        assert!(remaining > Duration::minutes(59));
        assert!(credentials.scopes.iter().any(|s| s == "chat:read"));
    }

    #[test]
    fn test_client_credentials_response_has_no_refresh_token() {
        let response: AccessTokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "app-token",
            "expires_in": 5000000,
            "token_type": "bearer"
        }))
        .unwrap();

        let credentials = Credentials::from_token_response(response);
        assert!(!credentials.can_refresh());
        assert!(credentials.scopes.is_empty());
    }

    #[test]
    fn test_debug_masks_tokens() {
        let credentials = Credentials::new("secret-access").with_refresh_token("secret-refresh");
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
    }

    #[test]
    fn test_credentials_serialize_for_persistence() {
        let credentials = Credentials::new("a").with_refresh_token("r");
        let json = serde_json::to_value(&credentials).unwrap();
        assert_eq!(json["access_token"], "a");
        assert_eq!(json["refresh_token"], "r");
        assert!(json.get("expires_at").is_none());

        let restored: Credentials = serde_json::from_value(json).unwrap();
        assert_eq!(restored, credentials);
    }
}
