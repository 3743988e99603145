//! OAuth-specific error types for the Twitch API client.
//!
//! # Example
//!
//! ```rust
//! use twitch_api::auth::oauth::OAuthError;
//!
//! let error = OAuthError::StateMismatch {
//!     expected: "abc".to_string(),
//!     received: "wrong".to_string(),
//! };
//! assert!(error.to_string().contains("possible CSRF attack"));
//! ```

use thiserror::Error;

/// Errors that can occur during OAuth operations.
///
/// The configuration variants ([`MissingClientCredentials`](Self::MissingClientCredentials),
/// [`MissingRedirectUri`](Self::MissingRedirectUri), [`StateMismatch`](Self::StateMismatch),
/// [`MissingRefreshToken`](Self::MissingRefreshToken)) are raised before any network call.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// No client ID and secret were configured.
    #[error("Client ID and client secret must be configured to authenticate with Twitch")]
    MissingClientCredentials,

    /// No redirect URI was supplied or configured for the authorization code flow.
    #[error("A redirect URI must be supplied or configured for user authorization")]
    MissingRedirectUri,

    /// The state returned by the authorization redirect does not match.
    #[error("State parameter mismatch, possible CSRF attack: expected '{expected}', received '{received}'")]
    StateMismatch {
        /// The state sent with the authorization URL.
        expected: String,
        /// The state received on the redirect.
        received: String,
    },

    /// A refresh was requested for credentials without a refresh token.
    #[error("Credentials carry no refresh token")]
    MissingRefreshToken,

    /// The token endpoint rejected a grant or could not be reached.
    ///
    /// `status` is 0 when no HTTP response was obtained.
    #[error("Token exchange failed with status {status}: {message}")]
    TokenExchangeFailed {
        /// The HTTP status code returned.
        status: u16,
        /// The error message from the response.
        message: String,
    },

    /// The refresh-token grant failed.
    ///
    /// `status` is 0 when no HTTP response was obtained.
    #[error("Token refresh failed with status {status}: {message}")]
    TokenRefreshFailed {
        /// The HTTP status code returned.
        status: u16,
        /// The error message from the response.
        message: String,
    },
}

// Verify OAuthError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
};
