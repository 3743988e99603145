//! Client for the legacy Twitch API (Kraken v5).

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::auth::AuthenticationAgent;
use crate::clients::dispatcher::{DispatchConfig, Dispatcher};
use crate::clients::errors::ApiError;
use crate::clients::http_request::{HttpMethod, RequestOptions};
use crate::clients::rate_limit::RateLimit;
use crate::clients::response::Response;
use crate::clients::transport::Transport;
use crate::config::TwitchConfig;

/// Sends calls to `https://api.twitch.tv/kraken`.
///
/// Credentials go in `Authorization: OAuth <token>`, the client ID in
/// `Client-ID`, and the v5 `Accept` header is always set. Parameters are
/// always sent as the query string, payloads are returned as-is, and error
/// messages carry only the status message.
#[derive(Clone, Debug)]
pub struct KrakenClient {
    dispatcher: Dispatcher,
}

impl KrakenClient {
    /// Creates a Kraken client.
    #[must_use]
    pub fn new(
        config: &TwitchConfig,
        transport: Arc<dyn Transport>,
        auth: Option<Arc<AuthenticationAgent>>,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(DispatchConfig::kraken(config), transport, auth),
        }
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::send`].
    pub async fn get(
        &self,
        path: &str,
        params: Value,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        self.send(HttpMethod::Get, path, params, options).await
    }

    /// Sends a POST request.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::send`].
    pub async fn post(
        &self,
        path: &str,
        params: Value,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        self.send(HttpMethod::Post, path, params, options).await
    }

    /// Sends a PUT request.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::send`].
    pub async fn put(
        &self,
        path: &str,
        params: Value,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        self.send(HttpMethod::Put, path, params, options).await
    }

    /// Sends a request with any supported method.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::send`].
    pub async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        params: Value,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        let envelope = self.dispatcher.envelope(method, path, params, options);
        self.dispatcher.send(envelope).await
    }

    /// Returns the latest rate-limit state reported by Kraken.
    #[must_use]
    pub fn rate_limit(&self) -> RateLimit {
        self.dispatcher.rate_limit().snapshot()
    }

    /// Returns how long to wait between calls to stay within the rate limit.
    #[must_use]
    pub fn rate_limit_interval(&self, minimum: Duration) -> Duration {
        self.dispatcher.rate_limit().interval_until_safe(minimum)
    }

    /// Returns the underlying dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
