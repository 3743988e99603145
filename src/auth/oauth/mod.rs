//! OAuth 2.0 support for the Twitch identity service.
//!
//! Two grants are used:
//!
//! - **Client credentials**: app tokens for server-to-server calls, no user
//!   interaction.
//! - **Authorization code**: user tokens. The user is sent to an authorization
//!   URL ([`authorization_url`]), Twitch redirects back with a `code` and the
//!   echoed [`StateParam`], and the code is exchanged for credentials.
//!
//! User tokens come with a refresh token, exchanged for new credentials when
//! the API answers 401.
//!
//! The grants sit behind the [`OAuthProvider`] trait. [`TwitchOAuth`] is the
//! production implementation.
//!
//! # Embedding Custom Data in State
//!
//! ```rust
//! use twitch_api::auth::oauth::StateParam;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct FlowContext {
//!     return_url: String,
//! }
//!
//! let state = StateParam::with_data(&FlowContext {
//!     return_url: "/dashboard".to_string(),
//! });
//!
//! let extracted: Option<FlowContext> = state.extract_data();
//! assert_eq!(extracted.unwrap().return_url, "/dashboard");
//! ```

mod authorize;
mod error;
mod provider;
mod state;

pub use authorize::{authorization_url, AuthorizationParams};
pub use error::OAuthError;
pub use provider::{OAuthProvider, TwitchOAuth};
pub use state::StateParam;
