//! OAuth authorization URL generation.
//!
//! The authorization code flow starts by redirecting the user to the Twitch
//! identity service with the application's client ID, the redirect URI, the
//! requested scopes and an optional CSRF state.

use crate::auth::oauth::StateParam;
use crate::auth::AuthScopes;
use crate::config::{BaseUrl, ClientId, RedirectUri};

/// Parameters of an authorization URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationParams {
    /// Where Twitch redirects the user after authorization.
    pub redirect_uri: RedirectUri,
    /// Requested scopes.
    pub scopes: AuthScopes,
    /// CSRF state echoed back on the redirect.
    pub state: Option<StateParam>,
    /// Forces Twitch to show the consent screen even if the user already authorized the app.
    pub force_verify: bool,
}

/// Builds the `/oauth2/authorize` URL for the authorization code flow.
///
/// # Example
///
/// ```rust
/// use twitch_api::{AuthScopes, BaseUrl, ClientId, RedirectUri};
/// use twitch_api::auth::oauth::{authorization_url, AuthorizationParams, StateParam};
///
/// let url = authorization_url(
///     &BaseUrl::new("https://id.twitch.tv").unwrap(),
///     &ClientId::new("my-client").unwrap(),
///     &AuthorizationParams {
///         redirect_uri: RedirectUri::new("http://localhost:3000").unwrap(),
///         scopes: "user:read:email".parse().unwrap(),
///         state: Some(StateParam::from_raw("abc")),
///         force_verify: true,
///     },
/// );
///
/// assert!(url.starts_with("https://id.twitch.tv/oauth2/authorize?"));
/// assert!(url.contains("scope=user%3Aread%3Aemail"));
/// assert!(url.contains("state=abc"));
/// assert!(url.contains("force_verify=true"));
/// ```
#[must_use]
pub fn authorization_url(
    authentication_url: &BaseUrl,
    client_id: &ClientId,
    params: &AuthorizationParams,
) -> String {
    let mut query = vec![
        ("response_type", "code".to_string()),
        ("client_id", client_id.as_ref().to_string()),
        ("redirect_uri", params.redirect_uri.as_ref().to_string()),
        ("scope", params.scopes.to_string()),
    ];

    if let Some(state) = &params.state {
        query.push(("state", state.to_string()));
    }

    if params.force_verify {
        query.push(("force_verify", "true".to_string()));
    }

    let query_string = query
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}?{}",
        authentication_url.join("oauth2/authorize"),
        query_string
    )
}
