//! The HTTP transport capability.
//!
//! The dispatcher never talks to the network directly: it hands a fully
//! resolved [`TransportRequest`] to a [`Transport`] and classifies whatever
//! comes back. [`ReqwestTransport`] is the production implementation; tests
//! may plug in their own.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::clients::http_request::HttpMethod;
use crate::clients::http_response::HttpResponse;

/// A request with every URL, header and parameter resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportRequest {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The absolute URL, without query string.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<Value>,
}

/// A failure that produced no HTTP response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client failed (connection, TLS, timeout...).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Any other transport failure.
    #[error("Transport error: {0}")]
    Other(String),
}

/// Sends HTTP requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] only when no HTTP response was obtained.
    async fn send(&self, request: TransportRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by `reqwest` with rustls.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a fresh `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Network`] if the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;
        Ok(Self { client })
    }

    /// Wraps an existing `reqwest` client, e.g. one with custom timeouts.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Parses response headers into a `HashMap` with lowercase keys.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    /// Parses a body as JSON. Empty bodies become `{}`, non-JSON text is kept
    /// as a string so error messages can quote it.
    fn parse_body(text: String) -> Value {
        if text.trim().is_empty() {
            return serde_json::json!({});
        }
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
        };

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let res = builder.send().await?;

        let status = res.status();
        let headers = Self::parse_response_headers(res.headers());
        let text = res.text().await.unwrap_or_default();

        Ok(HttpResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            headers,
            Self::parse_body(text),
        ))
    }
}

// Verify transport types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ReqwestTransport>();
    assert_send_sync::<TransportRequest>();
    assert_send_sync::<TransportError>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(method: HttpMethod, url: String) -> TransportRequest {
        TransportRequest {
            method,
            url,
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    #[test]
    fn test_parse_body_rules() {
        assert_eq!(ReqwestTransport::parse_body(String::new()), serde_json::json!({}));
        assert_eq!(
            ReqwestTransport::parse_body(r#"{"data":[]}"#.to_string()),
            serde_json::json!({"data": []})
        );
        assert_eq!(
            ReqwestTransport::parse_body("Bad Gateway".to_string()),
            Value::String("Bad Gateway".to_string())
        );
    }

    #[tokio::test]
    async fn test_sends_query_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/helix/users"))
            .and(query_param("login", "twitchdev"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Ratelimit-Remaining", "799")
                    .set_body_json(serde_json::json!({"data": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut req = request(HttpMethod::Get, format!("{}/helix/users", server.uri()));
        req.query.push(("login".to_string(), "twitchdev".to_string()));
        req.headers
            .insert("Authorization".to_string(), "Bearer abc".to_string());

        let response = ReqwestTransport::new().unwrap().send(req).await.unwrap();

        assert_eq!(response.code, 200);
        assert_eq!(response.status_message, "OK");
        assert_eq!(response.header("Ratelimit-Remaining"), Some("799"));
    }

    #[tokio::test]
    async fn test_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/helix/webhooks/hub"))
            .and(body_json(serde_json::json!({"hub.mode": "subscribe"})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let mut req = request(HttpMethod::Post, format!("{}/helix/webhooks/hub", server.uri()));
        req.body = Some(serde_json::json!({"hub.mode": "subscribe"}));

        let response = ReqwestTransport::new().unwrap().send(req).await.unwrap();
        assert_eq!(response.code, 202);
    }

    #[tokio::test]
    async fn test_error_status_is_not_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;

        let response = ReqwestTransport::new()
            .unwrap()
            .send(request(HttpMethod::Get, format!("{}/x", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.code, 404);
        assert_eq!(response.status_message, "Not Found");
        assert_eq!(response.body_text(), "not here");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let result = ReqwestTransport::new()
            .unwrap()
            .send(request(HttpMethod::Get, "http://127.0.0.1:9/".to_string()))
            .await;
        assert!(matches!(result, Err(TransportError::Network(_))));
    }
}
