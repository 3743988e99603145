//! Client for the current Twitch API (Helix).

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
use crate::webhooks::{HubMode, WebhookSubscription};

/// Path of the webhook hub endpoint.
pub const WEBHOOK_HUB_PATH: &str = "webhooks/hub";

/// Sends calls to `https://api.twitch.tv/helix`.
///
/// - Credentials are sent as `Authorization: Bearer <token>`, the client ID as
///   `Client-Id`.
/// - POST parameters form the JSON body; other methods use the query string.
/// - Results are wrapped as `{"data": ..., "pagination": {"cursor": ..}}`.
/// - Error messages are `<status message> : <body>`.
///
/// # Example
///
/// ```rust,ignore
/// use serde_json::json;
/// use twitch_api::RequestOptions;
///
/// let response = client
///     .helix()
///     .get("users", json!({"login": "twitchdev"}), RequestOptions::default().credentials(token))
///     .await?;
///
/// println!("{}", response.data()[0]["display_name"]);
/// ```
#[derive(Clone, Debug)]
pub struct HelixClient {
    dispatcher: Dispatcher,
}

impl HelixClient {
    /// Creates a Helix client.
    #[must_use]
    pub fn new(
        config: &TwitchConfig,
        transport: Arc<dyn Transport>,
        auth: Option<Arc<AuthenticationAgent>>,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(DispatchConfig::helix(config), transport, auth),
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

    /// Sends a POST request with `params` as the JSON body.
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

    /// Subscribes to a webhook topic.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::send`].
    pub async fn subscribe(
        &self,
        subscription: &WebhookSubscription,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        self.hub(HubMode::Subscribe, subscription, options).await
    }

    /// Cancels a webhook subscription.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::send`].
    pub async fn unsubscribe(
        &self,
        subscription: &WebhookSubscription,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        self.hub(HubMode::Unsubscribe, subscription, options).await
    }

    async fn hub(
        &self,
        mode: HubMode,
        subscription: &WebhookSubscription,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        let params = subscription.hub_params(mode, &self.dispatcher.config().base_url);
        tracing::debug!(mode = %mode, callback = %subscription.callback, "Webhook hub request");
        self.post(WEBHOOK_HUB_PATH, params, options).await
    }

    /// Returns the latest rate-limit state reported by Helix.
    #[must_use]
    pub fn rate_limit(&self) -> RateLimit {
        self.dispatcher.rate_limit().snapshot()
    }

    /// Returns how long to wait between calls to stay within the rate limit.
    ///
    /// Advisory only; never less than `minimum`.
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
