//! Webhook hub subscription types.

use std::fmt;

use serde_json::{Map, Value};

use crate::config::BaseUrl;

/// The `hub.mode` of a hub request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HubMode {
    /// Start or renew a subscription.
    Subscribe,
    /// Cancel a subscription.
    Unsubscribe,
}

impl HubMode {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
        }
    }
}

impl fmt::Display for HubMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resource a webhook subscription watches.
///
/// # Example
///
/// ```rust
/// use twitch_api::BaseUrl;
/// use twitch_api::webhooks::WebhookTopic;
///
/// let helix = BaseUrl::new("https://api.twitch.tv/helix").unwrap();
///
/// let topic = WebhookTopic::endpoint("users/follows")
///     .param("first", 1)
///     .param("toId", "1337");
/// assert_eq!(
///     topic.to_url(&helix),
///     "https://api.twitch.tv/helix/users/follows?first=1&to_id=1337"
/// );
///
/// let topic = WebhookTopic::url("streams?user_id=5678");
/// assert_eq!(topic.to_url(&helix), "https://api.twitch.tv/helix/streams?user_id=5678");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookTopic {
    /// A topic URL, or an endpoint path relative to the Helix base.
    Url(String),
    /// A Helix endpoint and its query parameters.
    ///
    /// Parameter names may be camelCase; they are sent in snake case.
    Endpoint {
        /// Endpoint path relative to the Helix base.
        endpoint: String,
        /// Query parameters, in order.
        params: Vec<(String, String)>,
    },
}

impl WebhookTopic {
    /// A topic given as a URL or relative endpoint path.
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    /// A topic built from an endpoint and parameters added with [`param`](Self::param).
    #[must_use]
    pub fn endpoint(endpoint: impl Into<String>) -> Self {
        Self::Endpoint {
            endpoint: endpoint.into(),
            params: Vec::new(),
        }
    }

    /// Adds a query parameter. Has no effect on [`WebhookTopic::Url`].
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        if let Self::Endpoint { params, .. } = &mut self {
            params.push((key.into(), value.to_string()));
        }
        self
    }

    /// Resolves the topic against the Helix base URL.
    ///
    /// URLs already starting with the base (or with any `http(s)://` scheme)
    /// are used as-is; anything else is joined onto the base.
    #[must_use]
    pub fn to_url(&self, helix_url: &BaseUrl) -> String {
        match self {
            Self::Url(url) => {
                if url.starts_with(helix_url.as_ref())
                    || url.starts_with("https://")
                    || url.starts_with("http://")
                {
                    url.clone()
                } else {
                    helix_url.join(url)
                }
            }
            Self::Endpoint { endpoint, params } => {
                let base = helix_url.join(endpoint);
                if params.is_empty() {
                    return base;
                }

                let query = params
                    .iter()
                    .map(|(k, v)| format!("{}={}", snake_case(k), urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&");
                format!("{base}?{query}")
            }
        }
    }
}

/// Converts `camelCase` to `snake_case`. Already snake-cased names pass through.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// A webhook hub subscription request.
///
/// # Example
///
/// ```rust
/// use twitch_api::BaseUrl;
/// use twitch_api::webhooks::{HubMode, WebhookSubscription, WebhookTopic};
///
/// let subscription = WebhookSubscription::new(
///     "https://example.com/hooks/follows",
///     WebhookTopic::endpoint("users/follows").param("toId", "1337"),
/// )
/// .lease_seconds(864_000)
/// .secret("s3cr3t");
///
/// let helix = BaseUrl::new("https://api.twitch.tv/helix").unwrap();
/// let params = subscription.hub_params(HubMode::Subscribe, &helix);
///
/// assert_eq!(params["hub.mode"], "subscribe");
/// assert_eq!(params["hub.lease_seconds"], 864_000);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSubscription {
    /// Where Twitch delivers notifications.
    pub callback: String,
    /// The watched resource.
    pub topic: WebhookTopic,
    /// Subscription lifetime in seconds.
    pub lease_seconds: Option<u32>,
    /// Secret used by Twitch to sign notifications.
    pub secret: Option<String>,
}

impl WebhookSubscription {
    /// Creates a subscription request with no lease or secret.
    #[must_use]
    pub fn new(callback: impl Into<String>, topic: WebhookTopic) -> Self {
        Self {
            callback: callback.into(),
            topic,
            lease_seconds: None,
            secret: None,
        }
    }

    /// Sets the lease.
    #[must_use]
    pub const fn lease_seconds(mut self, seconds: u32) -> Self {
        self.lease_seconds = Some(seconds);
        self
    }

    /// Sets the signing secret.
    #[must_use]
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Builds the `hub.*` parameters of a hub request.
    #[must_use]
    pub fn hub_params(&self, mode: HubMode, helix_url: &BaseUrl) -> Value {
        let mut params = Map::new();
        params.insert("hub.callback".to_string(), Value::from(self.callback.clone()));
        params.insert(
            "hub.topic".to_string(),
            Value::from(self.topic.to_url(helix_url)),
        );
        params.insert("hub.mode".to_string(), Value::from(mode.as_str()));

        if let Some(seconds) = self.lease_seconds {
            params.insert("hub.lease_seconds".to_string(), Value::from(seconds));
        }
        if let Some(secret) = &self.secret {
            params.insert("hub.secret".to_string(), Value::from(secret.clone()));
        }

        Value::Object(params)
    }
}

impl fmt::Debug for WebhookSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSubscription")
            .field("callback", &self.callback)
            .field("topic", &self.topic)
            .field("lease_seconds", &self.lease_seconds)
            .field("secret", &self.secret.as_ref().map(|_| "*****"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helix() -> BaseUrl {
        BaseUrl::new("https://api.twitch.tv/helix").unwrap()
    }

    #[test]
    fn test_snake_case_conversion() {
        assert_eq!(snake_case("userId"), "user_id");
        assert_eq!(snake_case("fromId"), "from_id");
        assert_eq!(snake_case("broadcasterUserId"), "broadcaster_user_id");
        assert_eq!(snake_case("first"), "first");
        assert_eq!(snake_case("user_id"), "user_id");
    }

    #[test]
    fn test_url_topic_is_prefixed_unless_absolute() {
        assert_eq!(
            WebhookTopic::url("streams?user_id=1").to_url(&helix()),
            "https://api.twitch.tv/helix/streams?user_id=1"
        );
        assert_eq!(
            WebhookTopic::url("https://api.twitch.tv/helix/streams?user_id=1").to_url(&helix()),
            "https://api.twitch.tv/helix/streams?user_id=1"
        );
    }

    #[test]
    fn test_endpoint_topic_encodes_values() {
        let topic = WebhookTopic::endpoint("users").param("login", "a b&c");
        assert_eq!(
            topic.to_url(&helix()),
            "https://api.twitch.tv/helix/users?login=a%20b%26c"
        );
    }

    #[test]
    fn test_endpoint_topic_without_params_has_no_query() {
        assert_eq!(
            WebhookTopic::endpoint("users").to_url(&helix()),
            "https://api.twitch.tv/helix/users"
        );
    }

    #[test]
    fn test_param_ignored_on_url_topic() {
        assert_eq!(WebhookTopic::url("x").param("a", 1), WebhookTopic::url("x"));
    }

    #[test]
    fn test_hub_params_omit_optional_fields() {
        let params = WebhookSubscription::new("https://cb", WebhookTopic::url("streams"))
            .hub_params(HubMode::Unsubscribe, &helix());

        assert_eq!(params["hub.mode"], "unsubscribe");
        assert_eq!(params["hub.callback"], "https://cb");
        assert_eq!(params["hub.topic"], "https://api.twitch.tv/helix/streams");
        assert!(params.get("hub.lease_seconds").is_none());
        assert!(params.get("hub.secret").is_none());
    }

    #[test]
    fn test_debug_masks_secret() {
        let subscription =
            WebhookSubscription::new("https://cb", WebhookTopic::url("streams")).secret("hidden");
        assert!(!format!("{subscription:?}").contains("hidden"));
    }
}
