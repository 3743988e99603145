//! The application-level client.

use std::sync::Arc;

use crate::auth::oauth::{OAuthError, OAuthProvider, TwitchOAuth};
use crate::auth::{AuthenticationAgent, Credentials};
use crate::clients::{HelixClient, KrakenClient, ReqwestTransport, Transport, TransportError};
use crate::config::TwitchConfig;

/// Entry point bundling configuration, authentication and both API clients.
///
/// The authentication agent exists only when a client ID and secret are
/// configured. Without it, calls still work with caller-supplied tokens, but
/// expired credentials are not refreshed.
///
/// # Example
///
/// ```rust,ignore
/// use serde_json::json;
/// use twitch_api::{ClientId, ClientSecret, RequestOptions, TwitchClient, TwitchConfig};
///
/// let client = TwitchClient::new(
///     TwitchConfig::builder()
///         .client_id(ClientId::new("id")?)
///         .client_secret(ClientSecret::new("secret")?)
///         .build()?,
/// )?;
///
/// let app_token = client.auth()?.authenticate(&Default::default()).await?;
/// let streams = client
///     .helix()
///     .get("streams", json!({"first": 20}), RequestOptions::default().credentials(app_token))
///     .await?;
/// ```
#[derive(Clone, Debug)]
pub struct TwitchClient {
    config: TwitchConfig,
    auth: Option<Arc<AuthenticationAgent>>,
    helix: HelixClient,
    kraken: KrakenClient,
}

impl TwitchClient {
    /// Creates a client using `reqwest` for HTTP and the Twitch identity service
    /// for OAuth.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the HTTP client cannot be initialized.
    pub fn new(config: TwitchConfig) -> Result<Self, TransportError> {
        let transport = Arc::new(ReqwestTransport::new()?);
        let provider = TwitchOAuth::from_config(&config)
            .ok()
            .map(|p| Arc::new(p) as Arc<dyn OAuthProvider>);
        Ok(Self::with_transport(config, transport, provider))
    }

    /// Creates a client over the given transport and OAuth provider.
    ///
    /// With `provider` set, an authentication agent is created even if the
    /// configuration lacks client credentials.
    #[must_use]
    pub fn with_transport(
        config: TwitchConfig,
        transport: Arc<dyn Transport>,
        provider: Option<Arc<dyn OAuthProvider>>,
    ) -> Self {
        let auth = provider.map(|provider| {
            Arc::new(AuthenticationAgent::new(
                provider,
                config.scopes().clone(),
                config.redirect_uri().cloned(),
            ))
        });

        let helix = HelixClient::new(&config, Arc::clone(&transport), auth.clone());
        let kraken = KrakenClient::new(&config, transport, auth.clone());

        Self {
            config,
            auth,
            helix,
            kraken,
        }
    }

    /// Returns the authentication agent.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingClientCredentials`] when no client ID and
    /// secret were configured.
    pub fn auth(&self) -> Result<&AuthenticationAgent, OAuthError> {
        self.auth
            .as_deref()
            .ok_or(OAuthError::MissingClientCredentials)
    }

    /// Returns the Helix client.
    #[must_use]
    pub const fn helix(&self) -> &HelixClient {
        &self.helix
    }

    /// Returns the Kraken client.
    #[must_use]
    pub const fn kraken(&self) -> &KrakenClient {
        &self.kraken
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &TwitchConfig {
        &self.config
    }

    /// Returns the current app token: the one last obtained through
    /// [`AuthenticationAgent::authenticate`], else the configured one.
    #[must_use]
    pub fn app_token(&self) -> Option<Credentials> {
        self.auth
            .as_ref()
            .and_then(|agent| agent.app_token())
            .or_else(|| self.config.app_token().cloned())
    }
}

// Verify TwitchClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TwitchClient>();
};
