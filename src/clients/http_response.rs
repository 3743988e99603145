//! HTTP response type returned by a [`Transport`](crate::clients::Transport).

use std::collections::HashMap;

use chrono::{TimeZone, Utc};

use crate::clients::rate_limit::RateLimit;

/// Names of the rate-limit headers, lowercase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitHeaders {
    /// Bucket size header.
    pub limit: &'static str,
    /// Remaining points header.
    pub remaining: &'static str,
    /// Reset time header, in epoch seconds.
    pub reset: &'static str,
}

impl RateLimitHeaders {
    /// The headers Twitch sends.
    pub const TWITCH: Self = Self {
        limit: "ratelimit-limit",
        remaining: "ratelimit-remaining",
        reset: "ratelimit-reset",
    };
}

/// An HTTP response from the Twitch API.
///
/// Header names are stored lowercase.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// The reason phrase, e.g. `Unauthorized`.
    pub status_message: String,
    /// Response headers (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The parsed response body.
    pub body: serde_json::Value,
}

impl HttpResponse {
    /// Creates a response, lowercasing header names.
    #[must_use]
    pub fn new(
        code: u16,
        status_message: impl Into<String>,
        headers: HashMap<String, Vec<String>>,
        body: serde_json::Value,
    ) -> Self {
        let mut lowered: HashMap<String, Vec<String>> = HashMap::new();
        for (name, values) in headers {
            lowered.entry(name.to_lowercase()).or_default().extend(values);
        }

        Self {
            code,
            status_message: status_message.into(),
            headers: lowered,
            body,
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the first value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Parses the rate-limit headers.
    ///
    /// Returns `None` unless both the limit and remaining headers are present
    /// and integers. Negative values are kept as received. A missing or
    /// malformed reset header leaves `reset_at` unset.
    #[must_use]
    pub fn rate_limit(&self, names: &RateLimitHeaders) -> Option<RateLimit> {
        let limit = self.header(names.limit)?.trim().parse::<i64>().ok()?;
        let remaining = self.header(names.remaining)?.trim().parse::<i64>().ok()?;
        let reset_at = self
            .header(names.reset)
            .and_then(|value| value.trim().parse::<i64>().ok())
            .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single());

        Some(RateLimit {
            limit,
            remaining,
            reset_at,
        })
    }

    /// Returns the body as text for error messages.
    #[must_use]
    pub fn body_text(&self) -> String {
        match &self.body {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(headers: &[(&str, &str)]) -> HttpResponse {
        let headers = headers
            .iter()
            .map(|(k, v)| ((*k).to_string(), vec![(*v).to_string()]))
            .collect();
        HttpResponse::new(200, "OK", headers, json!({}))
    }

    #[test]
    fn test_is_ok_range() {
        assert!(HttpResponse::new(204, "No Content", HashMap::new(), json!({})).is_ok());
        assert!(!HttpResponse::new(301, "Moved", HashMap::new(), json!({})).is_ok());
        assert!(!HttpResponse::new(401, "Unauthorized", HashMap::new(), json!({})).is_ok());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = response(&[("Ratelimit-Limit", "800")]);
        assert_eq!(response.header("ratelimit-limit"), Some("800"));
        assert_eq!(response.header("RATELIMIT-LIMIT"), Some("800"));
    }

    #[test]
    fn test_rate_limit_parses_all_headers() {
        let response = response(&[
            ("Ratelimit-Limit", "800"),
            ("Ratelimit-Remaining", "799"),
            ("Ratelimit-Reset", "1700000000"),
        ]);

        let rate_limit = response.rate_limit(&RateLimitHeaders::TWITCH).unwrap();

        assert_eq!(rate_limit.limit, 800);
        assert_eq!(rate_limit.remaining, 799);
        assert_eq!(rate_limit.reset_at.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_rate_limit_keeps_negative_remaining() {
        let response = response(&[("Ratelimit-Limit", "800"), ("Ratelimit-Remaining", "-1")]);

        let rate_limit = response.rate_limit(&RateLimitHeaders::TWITCH).unwrap();

        assert_eq!(rate_limit.limit, 800);
        assert_eq!(rate_limit.remaining, -1);
        assert!(rate_limit.reset_at.is_none());
    }

    #[test]
    fn test_rate_limit_absent_without_headers() {
        assert!(response(&[]).rate_limit(&RateLimitHeaders::TWITCH).is_none());
        assert!(response(&[("Ratelimit-Limit", "abc"), ("Ratelimit-Remaining", "1")])
            .rate_limit(&RateLimitHeaders::TWITCH)
            .is_none());
    }

    #[test]
    fn test_body_text_of_raw_string_body() {
        let response = HttpResponse::new(500, "Internal Server Error", HashMap::new(), json!("oops"));
        assert_eq!(response.body_text(), "oops");
    }
}
