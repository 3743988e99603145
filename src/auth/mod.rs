//! Authentication types for the Twitch API client.
//!
//! # Overview
//!
//! - [`Credentials`]: an access token with optional refresh token and expiry
//! - [`AuthScopes`]: a set of OAuth scopes
//! - [`AuthenticationAgent`]: app tokens, user authorization and refresh
//! - [`oauth`]: the OAuth 2.0 provider seam and its Twitch implementation
//!
//! # Example
//!
//! ```rust
//! use twitch_api::{AuthScopes, Credentials};
//!
//! let scopes: AuthScopes = "user:read:email chat:read".parse().unwrap();
//! let credentials = Credentials::new("access-token").with_refresh_token("refresh-token");
//!
//! assert!(credentials.can_refresh());
//! assert!(scopes.iter().any(|s| s == "chat:read"));
//! ```

mod agent;
mod credentials;
pub mod oauth;
mod scopes;

pub use agent::{AuthenticationAgent, TokenRefreshEvent, UserAuthOptions, UserAuthorization};
pub use credentials::{AccessTokenResponse, Credentials};
pub use scopes::AuthScopes;
