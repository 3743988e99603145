//! Error types for API calls.
//!
//! Every failed call surfaces as an [`ApiError`]: the [`ApiErrorKind`] that
//! ended it, plus the request envelope, the last HTTP response (if any) and the
//! dispatcher that sent it, so the call can be retried by hand.
//!
//! # Example
//!
//! ```rust,ignore
//! use twitch_api::clients::ApiErrorKind;
//!
//! match client.helix().get("users", json!({"login": "twitchdev"}), options).await {
//!     Ok(response) => println!("{}", response.data()),
//!     Err(e) => match e.kind() {
//!         ApiErrorKind::Status { code: 429, .. } => {
//!             tokio::time::sleep(client.helix().rate_limit_interval(Duration::ZERO)).await;
//!             let response = e.retry().await?;
//!         }
//!         ApiErrorKind::Unauthorized { .. } => println!("Token revoked"),
//!         _ => return Err(e.into()),
//!     },
//! }
//! ```

use thiserror::Error;

use crate::auth::oauth::OAuthError;
use crate::auth::Credentials;
use crate::clients::dispatcher::Dispatcher;
use crate::clients::http_request::RequestEnvelope;
use crate::clients::http_response::HttpResponse;
use crate::clients::response::Response;
use crate::clients::transport::TransportError;

/// Why a call failed.
#[derive(Debug, Error)]
pub enum ApiErrorKind {
    /// No HTTP response was obtained. Never retried automatically.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The API answered 401 and the credentials could not be refreshed
    /// (no refresh token, no authentication agent, or already refreshed once).
    #[error("{message}")]
    Unauthorized {
        /// The status message.
        message: String,
    },

    /// The API answered 401 and refreshing the credentials failed.
    #[error("Failed to refresh expired credentials: {0}")]
    RefreshFailed(#[source] OAuthError),

    /// The API kept answering 501.
    #[error("{message} (still failing after {retries} retries)")]
    RetriesExhausted {
        /// Number of automatic retries made.
        retries: u32,
        /// The status message of the last response.
        message: String,
    },

    /// Any other non-2xx response.
    #[error("{message}")]
    Status {
        /// The HTTP status code.
        code: u16,
        /// The status message, followed by the body under the Helix convention.
        message: String,
    },

    /// `after()`/`before()` was called on a response without a cursor.
    #[error("This response has no pagination cursor")]
    NoPaginationCursor,
}

/// A failed API call.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct ApiError {
    #[source]
    kind: ApiErrorKind,
    envelope: RequestEnvelope,
    response: Option<HttpResponse>,
    dispatcher: Dispatcher,
}

impl ApiError {
    pub(crate) const fn new(
        kind: ApiErrorKind,
        envelope: RequestEnvelope,
        response: Option<HttpResponse>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            kind,
            envelope,
            response,
            dispatcher,
        }
    }

    /// Returns why the call failed.
    #[must_use]
    pub const fn kind(&self) -> &ApiErrorKind {
        &self.kind
    }

    /// Consumes the error, returning its kind.
    #[must_use]
    pub fn into_kind(self) -> ApiErrorKind {
        self.kind
    }

    /// Returns the envelope of the failed call.
    #[must_use]
    pub const fn envelope(&self) -> &RequestEnvelope {
        &self.envelope
    }

    /// Returns the credentials the call was last sent with.
    #[must_use]
    pub const fn credentials(&self) -> Option<&Credentials> {
        self.envelope.credentials.as_ref()
    }

    /// Returns the last HTTP response, if one was received.
    #[must_use]
    pub const fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    /// Returns the HTTP status code of the last response, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.code)
    }

    /// Sends the call again with the same envelope and credentials.
    ///
    /// The new attempt gets a fresh refresh and 501 budget. There is no limit
    /// on how often this may be called.
    ///
    /// # Errors
    ///
    /// Returns a new [`ApiError`] if the retried call fails.
    pub async fn retry(&self) -> Result<Response, Self> {
        tracing::debug!(path = %self.envelope.path, "Retrying failed request");
        self.dispatcher.send(self.envelope.clone()).await
    }
}

// Verify error types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiError>();
    assert_send_sync::<ApiErrorKind>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_is_displayed_verbatim() {
        let kind = ApiErrorKind::Status {
            code: 400,
            message: r#"Bad Request : {"error":"Bad Request"}"#.to_string(),
        };
        assert_eq!(kind.to_string(), r#"Bad Request : {"error":"Bad Request"}"#);
    }

    #[test]
    fn test_retries_exhausted_mentions_retry_count() {
        let kind = ApiErrorKind::RetriesExhausted {
            retries: 3,
            message: "Not Implemented".to_string(),
        };
        let message = kind.to_string();
        assert!(message.contains("Not Implemented"));
        assert!(message.contains('3'));
    }

    #[test]
    fn test_refresh_failed_exposes_oauth_source() {
        let kind = ApiErrorKind::RefreshFailed(OAuthError::MissingRefreshToken);
        let source = std::error::Error::source(&kind).unwrap();
        assert!(source.to_string().contains("refresh token"));
    }

    #[test]
    fn test_transport_error_converts() {
        let kind: ApiErrorKind = TransportError::Other("connection reset".to_string()).into();
        assert!(kind.to_string().contains("connection reset"));
    }
}
