//! The authentication agent: app tokens, user authorization and refresh.
//!
//! [`AuthenticationAgent`] wraps an [`OAuthProvider`] with the configured
//! defaults (scopes, redirect URI) and publishes a [`TokenRefreshEvent`] every
//! time it refreshes credentials, so applications can persist the new tokens.
//!
//! # Example
//!
//! ```rust,ignore
//! use twitch_api::auth::{AuthenticationAgent, UserAuthOptions};
//!
//! let agent = AuthenticationAgent::from_config(&config)?;
//!
//! // App token
//! let app = agent.authenticate(&"".parse()?).await?;
//!
//! // User token
//! let authorization = agent.authenticate_user(UserAuthOptions::default().generate_state())?;
//! // redirect the user to authorization.uri(), then on the callback:
//! let user = authorization.get_token(&code, Some(&returned_state)).await?;
//!
//! // Observe refreshes
//! let mut events = agent.subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         store.save(&event.new).await;
//!     }
//! });
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;

use crate::auth::oauth::{AuthorizationParams, OAuthError, OAuthProvider, StateParam, TwitchOAuth};
use crate::auth::{AuthScopes, Credentials};
use crate::config::{RedirectUri, TwitchConfig};

const EVENT_CAPACITY: usize = 16;

/// Published after every successful refresh.
#[derive(Clone, Debug)]
pub struct TokenRefreshEvent {
    /// The refreshed credentials.
    pub new: Credentials,
    /// The credentials that were refreshed.
    pub old: Credentials,
}

/// Options for [`AuthenticationAgent::authenticate_user`].
///
/// Unset scopes and redirect URI fall back to the agent's defaults.
#[derive(Clone, Debug, Default)]
pub struct UserAuthOptions {
    /// Requested scopes.
    pub scopes: Option<AuthScopes>,
    /// CSRF state to send and verify on the callback.
    pub state: Option<StateParam>,
    /// Forces the consent screen.
    pub force_verify: bool,
    /// Redirect URI for this authorization.
    pub redirect_uri: Option<RedirectUri>,
}

impl UserAuthOptions {
    /// Sets the requested scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Uses the given CSRF state.
    #[must_use]
    pub fn state(mut self, state: StateParam) -> Self {
        self.state = Some(state);
        self
    }

    /// Generates a random CSRF state.
    #[must_use]
    pub fn generate_state(mut self) -> Self {
        self.state = Some(StateParam::new());
        self
    }

    /// Forces the consent screen.
    #[must_use]
    pub const fn force_verify(mut self, force_verify: bool) -> Self {
        self.force_verify = force_verify;
        self
    }

    /// Overrides the redirect URI.
    #[must_use]
    pub fn redirect_uri(mut self, redirect_uri: RedirectUri) -> Self {
        self.redirect_uri = Some(redirect_uri);
        self
    }
}

/// A pending authorization-code flow.
///
/// Send the user to [`uri`](Self::uri); when Twitch redirects back, pass the
/// returned `code` and `state` to [`get_token`](Self::get_token).
pub struct UserAuthorization {
    uri: String,
    state: Option<StateParam>,
    redirect_uri: RedirectUri,
    scopes: AuthScopes,
    provider: Arc<dyn OAuthProvider>,
}

impl UserAuthorization {
    /// The authorization URL.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The CSRF state sent with the URL, if any.
    #[must_use]
    pub const fn state(&self) -> Option<&StateParam> {
        self.state.as_ref()
    }

    /// Exchanges the authorization code for user credentials.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::StateMismatch`] without contacting Twitch when a
    /// state was sent and `returned_state` differs from it. Exchange failures
    /// are returned as [`OAuthError::TokenExchangeFailed`].
    pub async fn get_token(
        &self,
        code: &str,
        returned_state: Option<&str>,
    ) -> Result<Credentials, OAuthError> {
        if let Some(expected) = &self.state {
            let received = returned_state.unwrap_or_default();
            if !expected.matches(received) {
                tracing::warn!("Authorization callback state does not match");
                return Err(OAuthError::StateMismatch {
                    expected: expected.to_string(),
                    received: received.to_string(),
                });
            }
        }

        self.provider
            .exchange_authorization_code(code, &self.redirect_uri, &self.scopes)
            .await
    }
}

impl fmt::Debug for UserAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAuthorization")
            .field("uri", &self.uri)
            .field("state", &self.state)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

/// Obtains and refreshes Twitch credentials.
pub struct AuthenticationAgent {
    provider: Arc<dyn OAuthProvider>,
    scopes: AuthScopes,
    redirect_uri: Option<RedirectUri>,
    events: broadcast::Sender<TokenRefreshEvent>,
    app_token: Mutex<Option<Credentials>>,
}

impl AuthenticationAgent {
    /// Creates an agent over `provider` with the given defaults.
    #[must_use]
    pub fn new(
        provider: Arc<dyn OAuthProvider>,
        scopes: AuthScopes,
        redirect_uri: Option<RedirectUri>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            provider,
            scopes,
            redirect_uri,
            events,
            app_token: Mutex::new(None),
        }
    }

    /// Creates an agent backed by [`TwitchOAuth`] using the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingClientCredentials`] when the client ID or
    /// secret is not configured.
    pub fn from_config(config: &TwitchConfig) -> Result<Self, OAuthError> {
        let provider = TwitchOAuth::from_config(config)?;
        Ok(Self::new(
            Arc::new(provider),
            config.scopes().clone(),
            config.redirect_uri().cloned(),
        ))
    }

    /// Obtains app credentials with the client-credentials grant.
    ///
    /// Empty `scopes` request the agent's default scopes. The returned token
    /// is also kept as the agent's [`app_token`](Self::app_token).
    ///
    /// # Errors
    ///
    /// Returns the provider's error when the grant fails.
    pub async fn authenticate(&self, scopes: &AuthScopes) -> Result<Credentials, OAuthError> {
        let scopes = if scopes.is_empty() { &self.scopes } else { scopes };
        tracing::debug!(scopes = %scopes, "Requesting app access token");
        let credentials = self.provider.exchange_client_credentials(scopes).await?;

        *self.app_token.lock().unwrap_or_else(PoisonError::into_inner) = Some(credentials.clone());
        Ok(credentials)
    }

    /// Returns the app token obtained by the last successful
    /// [`authenticate`](Self::authenticate), if any.
    #[must_use]
    pub fn app_token(&self) -> Option<Credentials> {
        self.app_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Starts an authorization-code flow.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingRedirectUri`] when neither the options nor
    /// the agent provide a redirect URI.
    pub fn authenticate_user(
        &self,
        options: UserAuthOptions,
    ) -> Result<UserAuthorization, OAuthError> {
        let redirect_uri = options
            .redirect_uri
            .or_else(|| self.redirect_uri.clone())
            .ok_or(OAuthError::MissingRedirectUri)?;
        let scopes = options.scopes.unwrap_or_else(|| self.scopes.clone());

        let params = AuthorizationParams {
            redirect_uri,
            scopes,
            state: options.state,
            force_verify: options.force_verify,
        };
        let uri = self.provider.authorization_url(&params);

        Ok(UserAuthorization {
            uri,
            state: params.state,
            redirect_uri: params.redirect_uri,
            scopes: params.scopes,
            provider: Arc::clone(&self.provider),
        })
    }

    /// Exchanges the refresh token of `credentials` for new credentials.
    ///
    /// On success a [`TokenRefreshEvent`] is published before returning.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error unchanged.
    pub async fn refresh_token(&self, credentials: &Credentials) -> Result<Credentials, OAuthError> {
        let refreshed = self.provider.refresh(credentials).await?;

        // No subscribers is not an error.
        if self
            .events
            .send(TokenRefreshEvent {
                new: refreshed.clone(),
                old: credentials.clone(),
            })
            .is_err()
        {
            tracing::trace!("Token refreshed with no subscribers");
        }

        Ok(refreshed)
    }

    /// Subscribes to [`TokenRefreshEvent`]s published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TokenRefreshEvent> {
        self.events.subscribe()
    }

    /// Returns the default scopes.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the default redirect URI.
    #[must_use]
    pub const fn redirect_uri(&self) -> Option<&RedirectUri> {
        self.redirect_uri.as_ref()
    }
}

impl fmt::Debug for AuthenticationAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationAgent")
            .field("scopes", &self.scopes)
            .field("redirect_uri", &self.redirect_uri)
            .field("subscribers", &self.events.receiver_count())
            .field("has_app_token", &self.app_token().is_some())
            .finish_non_exhaustive()
    }
}

// Verify agent types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AuthenticationAgent>();
    assert_send_sync::<UserAuthorization>();
    assert_send_sync::<TokenRefreshEvent>();
};
