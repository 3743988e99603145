//! Configuration error types for the Twitch API client.
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use twitch_api::{ClientId, ConfigError};
//!
//! let result = ClientId::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyClientId)));
//! ```

use thiserror::Error;

/// Errors that can occur while building a [`TwitchConfig`](crate::TwitchConfig).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Client ID cannot be empty.
    #[error("Client ID cannot be empty. Please provide the client ID of your registered Twitch application.")]
    EmptyClientId,

    /// Client secret cannot be empty.
    #[error("Client secret cannot be empty. Please provide the client secret of your registered Twitch application.")]
    EmptyClientSecret,

    /// A client secret was configured without a client ID, or vice versa.
    #[error("Client ID and client secret must be configured together.")]
    IncompleteClientCredentials,

    /// A URL value could not be accepted.
    #[error("Invalid URL '{url}'. Please provide an absolute URL with an http or https scheme.")]
    InvalidUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Scopes are invalid.
    #[error("Invalid scopes: {reason}")]
    InvalidScopes {
        /// The reason the scopes are invalid.
        reason: String,
    },
}
