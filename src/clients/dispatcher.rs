//! The request dispatch engine shared by the Helix and Kraken clients.
//!
//! A [`Dispatcher`] turns one [`RequestEnvelope`] into exactly one outcome:
//! a [`Response`] or an [`ApiError`]. Along the way it
//!
//! - records the rate-limit headers of every HTTP response,
//! - refreshes expired credentials once on 401 and reissues the call,
//! - reissues the call up to three times while the API answers 501.
//!
//! The sub-clients differ only in their [`DispatchConfig`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::auth::AuthenticationAgent;
use crate::clients::errors::{ApiError, ApiErrorKind};
use crate::clients::http_request::{HttpMethod, RequestEnvelope, RequestOptions};
use crate::clients::http_response::{HttpResponse, RateLimitHeaders};
use crate::clients::rate_limit::RateLimitTracker;
use crate::clients::response::Response;
use crate::clients::transport::{Transport, TransportRequest};
use crate::config::{BaseUrl, TwitchConfig};

/// Crate version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `Accept` header selecting Kraken v5.
pub const KRAKEN_ACCEPT: &str = "application/vnd.twitchtv.v5+json";

/// How the access token is attached to a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthPlacement {
    /// `Authorization: Bearer <token>` (Helix).
    Bearer,
    /// `Authorization: OAuth <token>` (Kraken).
    OAuthHeader,
}

impl AuthPlacement {
    fn header_value(self, token: &str) -> String {
        match self {
            Self::Bearer => format!("Bearer {token}"),
            Self::OAuthHeader => format!("OAuth {token}"),
        }
    }
}

/// Where call parameters go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamPlacement {
    /// JSON body for POST, query string otherwise (Helix).
    BodyForPost,
    /// Always the query string (Kraken).
    AlwaysQuery,
}

/// Shape of a successful payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeShape {
    /// `{"data": [...], "pagination": {"cursor": ".."}}` (Helix).
    DataWithPagination,
    /// The payload is the data (Kraken). Cursors appear as `_cursor`.
    Flat,
}

impl EnvelopeShape {
    /// Extracts the pagination cursor of a payload. Empty cursors count as none.
    #[must_use]
    pub fn cursor(self, payload: &Value) -> Option<String> {
        let from_pagination = payload
            .get("pagination")
            .and_then(|p| p.get("cursor"))
            .and_then(Value::as_str);

        let cursor = match self {
            Self::DataWithPagination => from_pagination,
            Self::Flat => {
                from_pagination.or_else(|| payload.get("_cursor").and_then(Value::as_str))
            }
        };

        cursor.filter(|c| !c.is_empty()).map(str::to_string)
    }
}

/// The per-sub-client half of the dispatcher: base URL and conventions.
#[derive(Clone, Debug)]
pub struct DispatchConfig {
    /// Base URL that envelope paths are joined onto.
    pub base_url: BaseUrl,
    /// How the access token is sent.
    pub auth_placement: AuthPlacement,
    /// Where parameters go.
    pub param_placement: ParamPlacement,
    /// Shape of successful payloads.
    pub envelope_shape: EnvelopeShape,
    /// Whether error messages append the response body (` : <body>`).
    pub error_includes_body: bool,
    /// Names of the rate-limit headers.
    pub rate_limit_headers: RateLimitHeaders,
    /// Headers sent with every call.
    pub default_headers: HashMap<String, String>,
}

impl DispatchConfig {
    /// Conventions of the Helix API.
    #[must_use]
    pub fn helix(config: &TwitchConfig) -> Self {
        let mut default_headers = base_headers(config);
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        if let Some(client_id) = config.client_id() {
            default_headers.insert("Client-Id".to_string(), client_id.as_ref().to_string());
        }

        Self {
            base_url: config.helix_url().clone(),
            auth_placement: AuthPlacement::Bearer,
            param_placement: ParamPlacement::BodyForPost,
            envelope_shape: EnvelopeShape::DataWithPagination,
            error_includes_body: true,
            rate_limit_headers: RateLimitHeaders::TWITCH,
            default_headers,
        }
    }

    /// Conventions of the Kraken v5 API.
    #[must_use]
    pub fn kraken(config: &TwitchConfig) -> Self {
        let mut default_headers = base_headers(config);
        default_headers.insert("Accept".to_string(), KRAKEN_ACCEPT.to_string());
        if let Some(client_id) = config.client_id() {
            default_headers.insert("Client-ID".to_string(), client_id.as_ref().to_string());
        }

        Self {
            base_url: config.kraken_url().clone(),
            auth_placement: AuthPlacement::OAuthHeader,
            param_placement: ParamPlacement::AlwaysQuery,
            envelope_shape: EnvelopeShape::Flat,
            error_includes_body: false,
            rate_limit_headers: RateLimitHeaders::TWITCH,
            default_headers,
        }
    }
}

fn base_headers(config: &TwitchConfig) -> HashMap<String, String> {
    let user_agent_prefix = config
        .user_agent_prefix()
        .map_or(String::new(), |prefix| format!("{prefix} | "));
    let rust_version = env!("CARGO_PKG_RUST_VERSION");
    let user_agent =
        format!("{user_agent_prefix}Twitch API Library v{SDK_VERSION} | Rust {rust_version}");

    let mut headers = HashMap::new();
    headers.insert("User-Agent".to_string(), user_agent);
    headers
}

/// Retry bookkeeping of one logical call.
///
/// Passed by value through the dispatch loop; every call starts from
/// [`RetryState::new`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetryState {
    refreshed: bool,
    transient_retries: u32,
}

impl RetryState {
    /// Maximum number of automatic retries on 501.
    pub const MAX_TRANSIENT_RETRIES: u32 = 3;

    /// A fresh state: no refresh, no retries.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            refreshed: false,
            transient_retries: 0,
        }
    }

    /// Whether the credentials were already refreshed in this call.
    #[must_use]
    pub const fn refreshed(self) -> bool {
        self.refreshed
    }

    /// Number of 501 responses seen in this call.
    #[must_use]
    pub const fn transient_retries(self) -> u32 {
        self.transient_retries
    }

    /// The state after a successful refresh.
    #[must_use]
    pub const fn after_refresh(self) -> Self {
        Self {
            refreshed: true,
            ..self
        }
    }

    /// The state after a 501.
    #[must_use]
    pub const fn after_transient(self) -> Self {
        Self {
            transient_retries: self.transient_retries.saturating_add(1),
            ..self
        }
    }

    /// Whether the 501 budget is spent.
    #[must_use]
    pub const fn transient_exhausted(self) -> bool {
        self.transient_retries > Self::MAX_TRANSIENT_RETRIES
    }
}

struct DispatcherInner {
    config: DispatchConfig,
    transport: Arc<dyn Transport>,
    auth: Option<Arc<AuthenticationAgent>>,
    rate_limit: RateLimitTracker,
}

/// Sends envelopes for one sub-client and owns its rate-limit tracker.
///
/// Cloning is cheap; clones share the transport, agent and tracker.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    /// Creates a dispatcher. Without an agent, 401 responses are never refreshed.
    #[must_use]
    pub fn new(
        config: DispatchConfig,
        transport: Arc<dyn Transport>,
        auth: Option<Arc<AuthenticationAgent>>,
    ) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                config,
                transport,
                auth,
                rate_limit: RateLimitTracker::new(),
            }),
        }
    }

    /// Returns the sub-client conventions.
    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.inner.config
    }

    /// Returns the rate-limit tracker.
    #[must_use]
    pub fn rate_limit(&self) -> &RateLimitTracker {
        &self.inner.rate_limit
    }

    /// Builds an envelope, placing `params` according to the conventions.
    #[must_use]
    pub fn envelope(
        &self,
        method: HttpMethod,
        path: &str,
        params: Value,
        options: RequestOptions,
    ) -> RequestEnvelope {
        let envelope = RequestEnvelope::new(method, path.trim_start_matches('/'));
        let envelope = match (self.inner.config.param_placement, method) {
            (ParamPlacement::BodyForPost, HttpMethod::Post) => envelope.with_body(params),
            _ => envelope.with_query(&params),
        };
        envelope.with_options(options)
    }

    /// Resolves an envelope into a transport request.
    #[must_use]
    pub fn build_request(&self, envelope: &RequestEnvelope) -> TransportRequest {
        let config = &self.inner.config;

        let mut headers = config.default_headers.clone();
        if let Some(credentials) = &envelope.credentials {
            headers.insert(
                "Authorization".to_string(),
                config.auth_placement.header_value(&credentials.access_token),
            );
        }
        for (key, value) in &envelope.extra_headers {
            headers.insert(key.clone(), value.clone());
        }

        TransportRequest {
            method: envelope.method,
            url: config.base_url.join(&envelope.path),
            headers,
            query: envelope.query.clone(),
            body: envelope.body.clone(),
        }
    }

    /// Sends an envelope until it reaches a terminal outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for transport failures, unrecoverable 401s, a
    /// failed refresh, more than three 501s, and any other non-2xx status.
    pub async fn send(&self, envelope: RequestEnvelope) -> Result<Response, ApiError> {
        let mut envelope = envelope;
        let mut state = RetryState::new();

        loop {
            let request = self.build_request(&envelope);
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                refreshed = state.refreshed(),
                transient_retries = state.transient_retries(),
                "Sending Twitch API request"
            );

            let response = match self.inner.transport.send(request).await {
                Ok(response) => response,
                Err(error) => {
                    tracing::debug!(error = %error, "Request failed without a response");
                    return Err(self.fail(ApiErrorKind::Transport(error), envelope, None));
                }
            };

            self.record_rate_limit(&response);

            match response.code {
                401 => {
                    let agent = self.inner.auth.as_ref().filter(|_| !state.refreshed());
                    let stale = envelope.credentials.as_ref().filter(|c| c.can_refresh());

                    let (Some(agent), Some(stale)) = (agent, stale) else {
                        let message = response.status_message.clone();
                        return Err(self.fail(
                            ApiErrorKind::Unauthorized { message },
                            envelope,
                            Some(response),
                        ));
                    };

                    tracing::debug!("Credentials rejected, refreshing");
                    let refreshed = agent.refresh_token(stale).await;
                    match refreshed {
                        Ok(refreshed) => {
                            envelope.credentials = Some(refreshed);
                            state = state.after_refresh();
                        }
                        Err(error) => {
                            tracing::warn!(error = %error, "Token refresh failed");
                            return Err(self.fail(
                                ApiErrorKind::RefreshFailed(error),
                                envelope,
                                Some(response),
                            ));
                        }
                    }
                }
                501 => {
                    state = state.after_transient();
                    if state.transient_exhausted() {
                        tracing::warn!(
                            retries = RetryState::MAX_TRANSIENT_RETRIES,
                            "Giving up after repeated 501 responses"
                        );
                        let message = response.status_message.clone();
                        return Err(self.fail(
                            ApiErrorKind::RetriesExhausted {
                                retries: RetryState::MAX_TRANSIENT_RETRIES,
                                message,
                            },
                            envelope,
                            Some(response),
                        ));
                    }
                    tracing::debug!(
                        transient_retries = state.transient_retries(),
                        "Retrying after 501"
                    );
                }
                _ if response.is_ok() => {
                    return Ok(Response::new(response, envelope, self.clone()));
                }
                code => {
                    let message = self.error_message(&response);
                    return Err(self.fail(
                        ApiErrorKind::Status { code, message },
                        envelope,
                        Some(response),
                    ));
                }
            }
        }
    }

    fn record_rate_limit(&self, response: &HttpResponse) {
        if let Some(rate_limit) = response.rate_limit(&self.inner.config.rate_limit_headers) {
            self.inner.rate_limit.record(rate_limit);
        }
    }

    fn error_message(&self, response: &HttpResponse) -> String {
        if self.inner.config.error_includes_body {
            format!("{} : {}", response.status_message, response.body_text())
        } else {
            response.status_message.clone()
        }
    }

    fn fail(
        &self,
        kind: ApiErrorKind,
        envelope: RequestEnvelope,
        response: Option<HttpResponse>,
    ) -> ApiError {
        ApiError::new(kind, envelope, response, self.clone())
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.inner.config)
            .field("rate_limit", &self.inner.rate_limit)
            .field("has_auth", &self.inner.auth.is_some())
            .finish_non_exhaustive()
    }
}

// Verify Dispatcher is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Dispatcher>();
    assert_send_sync::<DispatchConfig>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use crate::clients::transport::TransportError;
    use crate::config::ClientId;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays canned responses and records requests.
    struct ScriptedTransport {
        responses: Mutex<Vec<Result<HttpResponse, TransportError>>>,
        requests: Mutex<Vec<TransportRequest>>,
    }

    impl ScriptedTransport {
        fn new(mut responses: Vec<Result<HttpResponse, TransportError>>) -> Arc<Self> {
            responses.reverse();
            Arc::new(Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<TransportRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: TransportRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(TransportError::Other("script exhausted".to_string())))
        }
    }

    fn status(code: u16, message: &str, body: Value) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(code, message, HashMap::new(), body))
    }

    fn config() -> TwitchConfig {
        TwitchConfig::builder()
            .client_id(ClientId::new("client-123").unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_retry_state_budget() {
        let mut state = RetryState::new();
        for _ in 0..RetryState::MAX_TRANSIENT_RETRIES {
            state = state.after_transient();
            assert!(!state.transient_exhausted());
        }
        assert!(state.after_transient().transient_exhausted());
        assert!(!state.refreshed());
        assert!(state.after_refresh().refreshed());
    }

    #[test]
    fn test_cursor_extraction_per_shape() {
        let helix = json!({"data": [], "pagination": {"cursor": "abc"}});
        assert_eq!(
            EnvelopeShape::DataWithPagination.cursor(&helix),
            Some("abc".to_string())
        );
        assert_eq!(
            EnvelopeShape::DataWithPagination.cursor(&json!({"data": [], "pagination": {}})),
            None
        );
        assert_eq!(
            EnvelopeShape::Flat.cursor(&json!({"follows": [], "_cursor": "k1"})),
            Some("k1".to_string())
        );
        assert_eq!(EnvelopeShape::Flat.cursor(&json!({"_cursor": ""})), None);
    }

    #[test]
    fn test_helix_envelope_puts_post_params_in_body() {
        let dispatcher = Dispatcher::new(
            DispatchConfig::helix(&config()),
            ScriptedTransport::new(vec![]),
            None,
        );

        let post = dispatcher.envelope(
            HttpMethod::Post,
            "webhooks/hub",
            json!({"a": 1}),
            RequestOptions::default(),
        );
        assert_eq!(post.body, Some(json!({"a": 1})));
        assert!(post.query.is_empty());

        let get = dispatcher.envelope(
            HttpMethod::Get,
            "/users",
            json!({"a": 1}),
            RequestOptions::default(),
        );
        assert!(get.body.is_none());
        assert_eq!(get.path, "users");
        assert_eq!(get.query_param("a"), Some("1"));
    }

    #[test]
    fn test_kraken_envelope_always_uses_query() {
        let dispatcher = Dispatcher::new(
            DispatchConfig::kraken(&config()),
            ScriptedTransport::new(vec![]),
            None,
        );
        let post = dispatcher.envelope(
            HttpMethod::Post,
            "channels",
            json!({"a": 1}),
            RequestOptions::default(),
        );
        assert!(post.body.is_none());
        assert_eq!(post.query_param("a"), Some("1"));
    }

    #[test]
    fn test_build_request_auth_headers() {
        let credentials = RequestOptions::default().credentials(Credentials::new("tok"));

        let helix = Dispatcher::new(
            DispatchConfig::helix(&config()),
            ScriptedTransport::new(vec![]),
            None,
        );
        let envelope = helix.envelope(HttpMethod::Get, "users", json!({}), credentials.clone());
        let request = helix.build_request(&envelope);
        assert_eq!(request.headers.get("Authorization").unwrap(), "Bearer tok");
        assert_eq!(request.headers.get("Client-Id").unwrap(), "client-123");
        assert_eq!(request.url, "https://api.twitch.tv/helix/users");

        let kraken = Dispatcher::new(
            DispatchConfig::kraken(&config()),
            ScriptedTransport::new(vec![]),
            None,
        );
        let envelope = kraken.envelope(HttpMethod::Get, "user", json!({}), credentials);
        let request = kraken.build_request(&envelope);
        assert_eq!(request.headers.get("Authorization").unwrap(), "OAuth tok");
        assert_eq!(request.headers.get("Client-ID").unwrap(), "client-123");
        assert_eq!(request.headers.get("Accept").unwrap(), KRAKEN_ACCEPT);
    }

    #[test]
    fn test_user_agent_includes_prefix() {
        let config = TwitchConfig::builder()
            .user_agent_prefix("MyBot/1.0")
            .build()
            .unwrap();
        let headers = DispatchConfig::helix(&config).default_headers;
        let user_agent = headers.get("User-Agent").unwrap();
        assert!(user_agent.starts_with("MyBot/1.0 | Twitch API Library v"));
        assert!(!headers.contains_key("Client-Id"));
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let transport =
            ScriptedTransport::new(vec![Err(TransportError::Other("reset".to_string()))]);
        let dispatcher = Dispatcher::new(DispatchConfig::helix(&config()), transport.clone(), None);

        let envelope = RequestEnvelope::new(HttpMethod::Get, "users");
        let error = dispatcher.send(envelope).await.unwrap_err();

        assert!(matches!(error.kind(), ApiErrorKind::Transport(_)));
        assert!(error.response().is_none());
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_501_retried_three_times_then_fails() {
        let transport = ScriptedTransport::new(vec![
            status(501, "Not Implemented", json!({})),
            status(501, "Not Implemented", json!({})),
            status(501, "Not Implemented", json!({})),
            status(501, "Not Implemented", json!({})),
        ]);
        let dispatcher = Dispatcher::new(DispatchConfig::helix(&config()), transport.clone(), None);

        let error = dispatcher
            .send(RequestEnvelope::new(HttpMethod::Get, "users"))
            .await
            .unwrap_err();

        assert!(matches!(
            error.kind(),
            ApiErrorKind::RetriesExhausted { retries: 3, .. }
        ));
        assert_eq!(transport.sent().len(), 4);
    }

    #[tokio::test]
    async fn test_501_then_success() {
        let transport = ScriptedTransport::new(vec![
            status(501, "Not Implemented", json!({})),
            status(200, "OK", json!({"data": [1]})),
        ]);
        let dispatcher = Dispatcher::new(DispatchConfig::helix(&config()), transport.clone(), None);

        let response = dispatcher
            .send(RequestEnvelope::new(HttpMethod::Get, "users"))
            .await
            .unwrap();

        assert_eq!(response.data(), &json!([1]));
        assert_eq!(transport.sent().len(), 2);
        assert_eq!(transport.sent()[0], transport.sent()[1]);
    }

    #[tokio::test]
    async fn test_401_without_agent_is_unauthorized() {
        let transport = ScriptedTransport::new(vec![status(401, "Unauthorized", json!({}))]);
        let dispatcher = Dispatcher::new(DispatchConfig::helix(&config()), transport.clone(), None);

        let envelope = RequestEnvelope::new(HttpMethod::Get, "users")
            .with_credentials(Some(Credentials::new("a").with_refresh_token("r")));
        let error = dispatcher.send(envelope).await.unwrap_err();

        assert!(matches!(
            error.kind(),
            ApiErrorKind::Unauthorized { message } if message == "Unauthorized"
        ));
        assert_eq!(error.status_code(), Some(401));
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_error_message_conventions() {
        let body = json!({"error": "Bad Request", "status": 400, "message": "Invalid login"});

        let helix = Dispatcher::new(
            DispatchConfig::helix(&config()),
            ScriptedTransport::new(vec![status(400, "Bad Request", body.clone())]),
            None,
        );
        let error = helix
            .send(RequestEnvelope::new(HttpMethod::Get, "users"))
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), format!("Bad Request : {body}"));

        let kraken = Dispatcher::new(
            DispatchConfig::kraken(&config()),
            ScriptedTransport::new(vec![status(400, "Bad Request", body)]),
            None,
        );
        let error = kraken
            .send(RequestEnvelope::new(HttpMethod::Get, "users"))
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Bad Request");
    }

    #[tokio::test]
    async fn test_rate_limit_recorded_on_failure() {
        let mut headers = HashMap::new();
        headers.insert("Ratelimit-Limit".to_string(), vec!["800".to_string()]);
        headers.insert("Ratelimit-Remaining".to_string(), vec!["0".to_string()]);
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(
            429,
            "Too Many Requests",
            headers,
            json!({}),
        ))]);
        let dispatcher = Dispatcher::new(DispatchConfig::helix(&config()), transport, None);

        let error = dispatcher
            .send(RequestEnvelope::new(HttpMethod::Get, "users"))
            .await
            .unwrap_err();

        assert!(matches!(error.kind(), ApiErrorKind::Status { code: 429, .. }));
        let snapshot = dispatcher.rate_limit().snapshot();
        assert_eq!(snapshot.limit, 800);
        assert_eq!(snapshot.remaining, 0);
    }

    #[tokio::test]
    async fn test_negative_remaining_recorded_as_received() {
        let mut headers = HashMap::new();
        headers.insert("Ratelimit-Limit".to_string(), vec!["800".to_string()]);
        headers.insert("Ratelimit-Remaining".to_string(), vec!["-1".to_string()]);
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(
            429,
            "Too Many Requests",
            headers,
            json!({}),
        ))]);
        let dispatcher = Dispatcher::new(DispatchConfig::helix(&config()), transport, None);

        let result = dispatcher
            .send(RequestEnvelope::new(HttpMethod::Get, "x"))
            .await;

        assert!(result.is_err());
        let snapshot = dispatcher.rate_limit().snapshot();
        assert_eq!(snapshot.limit, 800);
        assert_eq!(snapshot.remaining, -1);
    }
}
