//! HTTP client types for Twitch API communication.
//!
//! # Overview
//!
//! - [`HelixClient`]: the current API
//! - [`KrakenClient`]: the legacy v5 API
//! - [`Dispatcher`]: the engine both clients share; sends a [`RequestEnvelope`]
//!   and classifies the outcome
//! - [`Response`]: a successful result with cursor pagination
//! - [`ApiError`]: a failed call, retryable by hand
//! - [`Transport`]: the HTTP capability, implemented by [`ReqwestTransport`]
//! - [`RateLimitTracker`]: the latest rate-limit state of a client
//!
//! # Retry Behavior
//!
//! Every logical call gets its own budget:
//!
//! - **401 (Unauthorized)**: if the call carries refreshable credentials and
//!   an [`AuthenticationAgent`](crate::auth::AuthenticationAgent) is available,
//!   the credentials are refreshed once and the call reissued with them
//! - **501 (Not Implemented)**: reissued unchanged, at most 3 times, without delay
//! - **Transport errors and other statuses**: returned immediately
//!
//! Nothing else is retried automatically; [`ApiError::retry`] reissues a
//! failed call on demand.

mod dispatcher;
mod errors;
mod helix;
mod http_request;
mod http_response;
mod kraken;
mod rate_limit;
mod response;
mod transport;

pub use dispatcher::{
    AuthPlacement, DispatchConfig, Dispatcher, EnvelopeShape, ParamPlacement, RetryState,
    KRAKEN_ACCEPT, SDK_VERSION,
};
pub use errors::{ApiError, ApiErrorKind};
pub use helix::{HelixClient, WEBHOOK_HUB_PATH};
pub use http_request::{query_pairs, HttpMethod, RequestEnvelope, RequestOptions};
pub use http_response::{HttpResponse, RateLimitHeaders};
pub use kraken::KrakenClient;
pub use rate_limit::{RateLimit, RateLimitTracker, DEFAULT_INTERVAL, DEFAULT_LIMIT};
pub use response::Response;
pub use transport::{ReqwestTransport, Transport, TransportError, TransportRequest};
