//! # Twitch API Rust client
//!
//! An async client for the Twitch HTTP API: the current API (Helix), the
//! legacy v5 API (Kraken), and the OAuth 2.0 flows of the Twitch identity
//! service.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`TwitchConfig`] and [`TwitchConfigBuilder`]
//! - Validated newtypes for client credentials and URLs
//! - App tokens, user authorization and token refresh via [`auth`]
//! - Helix and Kraken clients sharing one dispatch engine ([`clients`]):
//!   automatic refresh on 401, bounded retries on 501, rate-limit tracking
//!   and cursor pagination
//! - Webhook hub subscriptions via [`webhooks`]
//!
//! ## Quick Start
//!
//! ```rust
//! use twitch_api::{ClientId, ClientSecret, TwitchConfig};
//!
//! let config = TwitchConfig::builder()
//!     .client_id(ClientId::new("your-client-id").unwrap())
//!     .client_secret(ClientSecret::new("your-client-secret").unwrap())
//!     .scopes("user:read:email".parse().unwrap())
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Making API Requests
//!
//! ```rust,ignore
//! use serde_json::json;
//! use twitch_api::{RequestOptions, TwitchClient};
//!
//! let client = TwitchClient::new(config)?;
//! let token = client.auth()?.authenticate(&Default::default()).await?;
//!
//! let mut page = client
//!     .helix()
//!     .get("streams", json!({"first": 100}), RequestOptions::default().credentials(token))
//!     .await?;
//!
//! while page.has_pagination() {
//!     tokio::time::sleep(client.helix().rate_limit_interval(Duration::ZERO)).await;
//!     page = page.after().await?;
//! }
//! ```
//!
//! ## User Authorization
//!
//! ```rust,ignore
//! use twitch_api::auth::UserAuthOptions;
//!
//! let authorization = client.auth()?.authenticate_user(UserAuthOptions::default().generate_state())?;
//! // Redirect the user to authorization.uri(). On the callback:
//! let user_token = authorization.get_token(&code, Some(&state)).await?;
//!
//! // Persist refreshed tokens
//! let mut refreshes = client.auth()?.subscribe();
//! while let Ok(event) = refreshes.recv().await {
//!     save(&event.new);
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Thread-safe**: All types are `Send + Sync`
//! - **Async-first**: Designed for use with Tokio async runtime
//! - **Immutable credentials**: A refresh produces new credentials

pub mod auth;
mod client;
pub mod clients;
pub mod config;
pub mod error;
pub mod webhooks;

// Re-export public types at crate root for convenience
pub use auth::{AuthScopes, AuthenticationAgent, Credentials, TokenRefreshEvent};
pub use client::TwitchClient;
pub use config::{BaseUrl, ClientId, ClientSecret, RedirectUri, TwitchConfig, TwitchConfigBuilder};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    ApiError, ApiErrorKind, HelixClient, HttpMethod, KrakenClient, RequestOptions, Response,
};
