//! Configuration types for the Twitch API client.
//!
//! # Overview
//!
//! - [`TwitchConfig`]: all client settings
//! - [`TwitchConfigBuilder`]: a builder for constructing [`TwitchConfig`] instances
//! - [`ClientId`], [`ClientSecret`]: application credentials
//! - [`BaseUrl`], [`RedirectUri`]: validated URLs
//!
//! # Example
//!
//! ```rust
//! use twitch_api::{TwitchConfig, ClientId, ClientSecret};
//!
//! let config = TwitchConfig::builder()
//!     .client_id(ClientId::new("my-client-id").unwrap())
//!     .client_secret(ClientSecret::new("my-secret").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert!(config.has_client_credentials());
//! ```

mod newtypes;

pub use newtypes::{BaseUrl, ClientId, ClientSecret, RedirectUri};

use crate::auth::{AuthScopes, Credentials};
use crate::error::ConfigError;

/// Default base URL of the current (Helix) API.
pub const HELIX_URL: &str = "https://api.twitch.tv/helix";

/// Default base URL of the legacy (Kraken v5) API.
pub const KRAKEN_URL: &str = "https://api.twitch.tv/kraken";

/// Default base URL of the Twitch identity service.
pub const AUTHENTICATION_URL: &str = "https://id.twitch.tv";

/// Configuration for the Twitch API client.
///
/// `TwitchConfig` is `Clone`, `Send`, and `Sync`. Client credentials are
/// optional: without them the client can still call the API with
/// caller-supplied tokens, but cannot authenticate or refresh.
#[derive(Clone, Debug)]
pub struct TwitchConfig {
    client_id: Option<ClientId>,
    client_secret: Option<ClientSecret>,
    redirect_uri: Option<RedirectUri>,
    scopes: AuthScopes,
    app_token: Option<Credentials>,
    helix_url: BaseUrl,
    kraken_url: BaseUrl,
    authentication_url: BaseUrl,
    user_agent_prefix: Option<String>,
}

impl TwitchConfig {
    /// Creates a new builder for constructing a `TwitchConfig`.
    #[must_use]
    pub fn builder() -> TwitchConfigBuilder {
        TwitchConfigBuilder::new()
    }

    /// Returns the client ID, if configured.
    #[must_use]
    pub const fn client_id(&self) -> Option<&ClientId> {
        self.client_id.as_ref()
    }

    /// Returns the client secret, if configured.
    #[must_use]
    pub const fn client_secret(&self) -> Option<&ClientSecret> {
        self.client_secret.as_ref()
    }

    /// Returns `true` when both client ID and client secret are configured.
    #[must_use]
    pub const fn has_client_credentials(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    /// Returns the default OAuth redirect URI, if configured.
    #[must_use]
    pub const fn redirect_uri(&self) -> Option<&RedirectUri> {
        self.redirect_uri.as_ref()
    }

    /// Returns the default OAuth scopes.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the preconfigured app token, if any.
    #[must_use]
    pub const fn app_token(&self) -> Option<&Credentials> {
        self.app_token.as_ref()
    }

    /// Returns the Helix base URL.
    #[must_use]
    pub const fn helix_url(&self) -> &BaseUrl {
        &self.helix_url
    }

    /// Returns the Kraken base URL.
    #[must_use]
    pub const fn kraken_url(&self) -> &BaseUrl {
        &self.kraken_url
    }

    /// Returns the identity service base URL.
    #[must_use]
    pub const fn authentication_url(&self) -> &BaseUrl {
        &self.authentication_url
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }
}

// Verify TwitchConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TwitchConfig>();
};

/// Builder for constructing [`TwitchConfig`] instances.
///
/// # Defaults
///
/// - base URLs: the public Twitch endpoints
/// - `scopes`: empty
/// - everything else: `None`
///
/// # Example
///
/// ```rust
/// use twitch_api::{TwitchConfig, ClientId, ClientSecret, RedirectUri, BaseUrl};
///
/// let config = TwitchConfig::builder()
///     .client_id(ClientId::new("id").unwrap())
///     .client_secret(ClientSecret::new("secret").unwrap())
///     .redirect_uri(RedirectUri::new("http://localhost:3000/auth").unwrap())
///     .scopes("user:read:email chat:read".parse().unwrap())
///     .helix_url(BaseUrl::new("http://127.0.0.1:9000/helix").unwrap())
///     .user_agent_prefix("MyBot/1.0")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.helix_url().as_ref(), "http://127.0.0.1:9000/helix");
/// ```
#[derive(Debug, Default)]
pub struct TwitchConfigBuilder {
    client_id: Option<ClientId>,
    client_secret: Option<ClientSecret>,
    redirect_uri: Option<RedirectUri>,
    scopes: Option<AuthScopes>,
    app_token: Option<Credentials>,
    helix_url: Option<BaseUrl>,
    kraken_url: Option<BaseUrl>,
    authentication_url: Option<BaseUrl>,
    user_agent_prefix: Option<String>,
}

impl TwitchConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application client ID.
    #[must_use]
    pub fn client_id(mut self, id: ClientId) -> Self {
        self.client_id = Some(id);
        self
    }

    /// Sets the application client secret.
    #[must_use]
    pub fn client_secret(mut self, secret: ClientSecret) -> Self {
        self.client_secret = Some(secret);
        self
    }

    /// Sets the default OAuth redirect URI for user authorization.
    #[must_use]
    pub fn redirect_uri(mut self, uri: RedirectUri) -> Self {
        self.redirect_uri = Some(uri);
        self
    }

    /// Sets the default OAuth scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets an app token obtained earlier, so the client can be used without
    /// calling `authenticate` first.
    #[must_use]
    pub fn app_token(mut self, token: Credentials) -> Self {
        self.app_token = Some(token);
        self
    }

    /// Overrides the Helix base URL.
    #[must_use]
    pub fn helix_url(mut self, url: BaseUrl) -> Self {
        self.helix_url = Some(url);
        self
    }

    /// Overrides the Kraken base URL.
    #[must_use]
    pub fn kraken_url(mut self, url: BaseUrl) -> Self {
        self.kraken_url = Some(url);
        self
    }

    /// Overrides the identity service base URL.
    #[must_use]
    pub fn authentication_url(mut self, url: BaseUrl) -> Self {
        self.authentication_url = Some(url);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Builds the [`TwitchConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IncompleteClientCredentials`] if only one of
    /// client ID and client secret is set, or [`ConfigError::InvalidUrl`] if a
    /// default base URL cannot be parsed.
    pub fn build(self) -> Result<TwitchConfig, ConfigError> {
        // A lone client ID is allowed: Kraken and Helix accept it without a secret.
        if self.client_secret.is_some() && self.client_id.is_none() {
            return Err(ConfigError::IncompleteClientCredentials);
        }

        let helix_url = match self.helix_url {
            Some(url) => url,
            None => BaseUrl::new(HELIX_URL)?,
        };
        let kraken_url = match self.kraken_url {
            Some(url) => url,
            None => BaseUrl::new(KRAKEN_URL)?,
        };
        let authentication_url = match self.authentication_url {
            Some(url) => url,
            None => BaseUrl::new(AUTHENTICATION_URL)?,
        };

        Ok(TwitchConfig {
            client_id: self.client_id,
            client_secret: self.client_secret,
            redirect_uri: self.redirect_uri,
            scopes: self.scopes.unwrap_or_default(),
            app_token: self.app_token,
            helix_url,
            kraken_url,
            authentication_url,
            user_agent_prefix: self.user_agent_prefix,
        })
    }
}
