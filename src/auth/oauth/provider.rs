//! The OAuth2 token-exchange capability and its Twitch implementation.
//!
//! [`OAuthProvider`] is the seam between the authentication agent and the
//! identity service. [`TwitchOAuth`] talks to `id.twitch.tv` over `reqwest`;
//! tests substitute their own implementation.

use async_trait::async_trait;
use serde::Serialize;

use crate::auth::credentials::AccessTokenResponse;
use crate::auth::oauth::{authorization_url, AuthorizationParams, OAuthError};
use crate::auth::{AuthScopes, Credentials};
use crate::config::{BaseUrl, ClientId, ClientSecret, RedirectUri, TwitchConfig};

/// OAuth2 grants used by the authentication agent.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Builds the URL the user is sent to for the authorization code flow.
    fn authorization_url(&self, params: &AuthorizationParams) -> String;

    /// Performs the client-credentials grant, producing app credentials.
    async fn exchange_client_credentials(
        &self,
        scopes: &AuthScopes,
    ) -> Result<Credentials, OAuthError>;

    /// Exchanges an authorization code for user credentials.
    async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &RedirectUri,
        scopes: &AuthScopes,
    ) -> Result<Credentials, OAuthError>;

    /// Exchanges the refresh token of `credentials` for new credentials.
    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials, OAuthError>;
}

/// Form body sent to `/oauth2/token`. Client credentials travel in the body.
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_uri: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

/// Which grant a token request performs; selects the error variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Grant {
    Exchange,
    Refresh,
}

impl Grant {
    fn error(self, status: u16, message: String) -> OAuthError {
        match self {
            Self::Exchange => OAuthError::TokenExchangeFailed { status, message },
            Self::Refresh => OAuthError::TokenRefreshFailed { status, message },
        }
    }
}

/// [`OAuthProvider`] backed by the Twitch identity service.
///
/// # Example
///
/// ```rust
/// use twitch_api::{TwitchConfig, ClientId, ClientSecret};
/// use twitch_api::auth::oauth::TwitchOAuth;
///
/// let config = TwitchConfig::builder()
///     .client_id(ClientId::new("id").unwrap())
///     .client_secret(ClientSecret::new("secret").unwrap())
///     .build()
///     .unwrap();
///
/// let provider = TwitchOAuth::from_config(&config).unwrap();
/// assert_eq!(provider.token_url(), "https://id.twitch.tv/oauth2/token");
/// ```
#[derive(Debug, Clone)]
pub struct TwitchOAuth {
    client_id: ClientId,
    client_secret: ClientSecret,
    authentication_url: BaseUrl,
    http: reqwest::Client,
}

impl TwitchOAuth {
    /// Creates a provider for the given application credentials.
    #[must_use]
    pub fn new(client_id: ClientId, client_secret: ClientSecret, authentication_url: BaseUrl) -> Self {
        Self {
            client_id,
            client_secret,
            authentication_url,
            http: reqwest::Client::new(),
        }
    }

    /// Creates a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MissingClientCredentials`] if the configuration
    /// lacks the client ID or secret.
    pub fn from_config(config: &TwitchConfig) -> Result<Self, OAuthError> {
        match (config.client_id(), config.client_secret()) {
            (Some(id), Some(secret)) => Ok(Self::new(
                id.clone(),
                secret.clone(),
                config.authentication_url().clone(),
            )),
            _ => Err(OAuthError::MissingClientCredentials),
        }
    }

    /// Returns the token endpoint URL.
    #[must_use]
    pub fn token_url(&self) -> String {
        self.authentication_url.join("oauth2/token")
    }

    fn base_request<'a>(&'a self, grant_type: &'a str) -> TokenRequest<'a> {
        TokenRequest {
            client_id: self.client_id.as_ref(),
            client_secret: self.client_secret.as_ref(),
            grant_type,
            scope: None,
            code: None,
            redirect_uri: None,
            refresh_token: None,
        }
    }

    async fn request_token(
        &self,
        grant: Grant,
        body: &TokenRequest<'_>,
    ) -> Result<AccessTokenResponse, OAuthError> {
        let response = self
            .http
            .post(self.token_url())
            .form(body)
            .send()
            .await
            .map_err(|e| grant.error(0, format!("Network error: {e}")))?;

        let status = response.status().as_u16();

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(grant.error(status, error_body));
        }

        response
            .json()
            .await
            .map_err(|e| grant.error(status, format!("Failed to parse token response: {e}")))
    }
}

#[async_trait]
impl OAuthProvider for TwitchOAuth {
    fn authorization_url(&self, params: &AuthorizationParams) -> String {
        authorization_url(&self.authentication_url, &self.client_id, params)
    }

    async fn exchange_client_credentials(
        &self,
        scopes: &AuthScopes,
    ) -> Result<Credentials, OAuthError> {
        let mut body = self.base_request("client_credentials");
        if !scopes.is_empty() {
            body.scope = Some(scopes.to_string());
        }

        let token = self.request_token(Grant::Exchange, &body).await?;
        Ok(Credentials::from_token_response(token))
    }

    async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &RedirectUri,
        scopes: &AuthScopes,
    ) -> Result<Credentials, OAuthError> {
        let mut body = self.base_request("authorization_code");
        body.code = Some(code);
        body.redirect_uri = Some(redirect_uri.as_ref());
        if !scopes.is_empty() {
            body.scope = Some(scopes.to_string());
        }

        let token = self.request_token(Grant::Exchange, &body).await?;
        Ok(Credentials::from_token_response(token))
    }

    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials, OAuthError> {
        let refresh_token = credentials
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(OAuthError::MissingRefreshToken)?;

        let mut body = self.base_request("refresh_token");
        body.refresh_token = Some(refresh_token);

        let token = self.request_token(Grant::Refresh, &body).await?;
        let mut refreshed = Credentials::from_token_response(token);

        // Twitch rotates refresh tokens, but keep the old one if none came back.
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = credentials.refresh_token.clone();
        }
        if refreshed.scopes.is_empty() {
            refreshed.scopes = credentials.scopes.clone();
        }

        Ok(refreshed)
    }
}

// Verify types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TwitchOAuth>();
    assert_send_sync::<TokenRequest<'_>>();
};
