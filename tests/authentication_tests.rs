//! Integration tests for the authentication agent against a mock identity service.

use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use twitch_api::auth::oauth::{OAuthError, StateParam};
use twitch_api::auth::UserAuthOptions;
use twitch_api::{
    AuthScopes, BaseUrl, ClientId, ClientSecret, Credentials, RedirectUri, TwitchClient,
    TwitchConfig,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_client(server: &MockServer) -> TwitchClient {
    let config = TwitchConfig::builder()
        .client_id(ClientId::new("test-client").unwrap())
        .client_secret(ClientSecret::new("test-secret").unwrap())
        .redirect_uri(RedirectUri::new("http://localhost:3000/callback").unwrap())
        .scopes("user:read:email".parse().unwrap())
        .authentication_url(BaseUrl::new(server.uri()).unwrap())
        .build()
        .unwrap();

    TwitchClient::new(config).unwrap()
}

// ============================================================================
// Client credentials
// ============================================================================

#[tokio::test]
async fn test_authenticate_uses_client_credentials_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=test-client"))
        .and(body_string_contains("client_secret=test-secret"))
        .and(body_string_contains("scope=analytics%3Aread%3Agames"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "app-token",
            "expires_in": 5_011_271,
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server);
    let scopes: AuthScopes = "analytics:read:games".parse().unwrap();
    let credentials = client.auth().unwrap().authenticate(&scopes).await.unwrap();

    assert_eq!(credentials.access_token, "app-token");
    assert!(credentials.expires_at.is_some());
    assert!(!credentials.can_refresh());
}

#[tokio::test]
async fn test_client_exposes_fetched_app_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fetched-app-token",
            "expires_in": 3_600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server);
    assert!(client.app_token().is_none());

    assert_ok!(client.auth().unwrap().authenticate(&AuthScopes::new()).await);

    assert_eq!(client.app_token().unwrap().access_token, "fetched-app-token");
}

#[tokio::test]
async fn test_authenticate_falls_back_to_default_scopes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("scope=user%3Aread%3Aemail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "app-token",
            "expires_in": 3_600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server);

    assert_ok!(client.auth().unwrap().authenticate(&AuthScopes::new()).await);
}

#[tokio::test]
async fn test_authenticate_reports_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(403).set_body_string(r#"{"status":403,"message":"invalid client secret"}"#),
        )
        .mount(&server)
        .await;

    let client = create_client(&server);
    let result = client.auth().unwrap().authenticate(&AuthScopes::new()).await;

    match assert_err!(result) {
        OAuthError::TokenExchangeFailed { status, message } => {
            assert_eq!(status, 403);
            assert!(message.contains("invalid client secret"));
        }
        other => panic!("Expected TokenExchangeFailed, got: {other:?}"),
    }
}

// ============================================================================
// Authorization code
// ============================================================================

#[tokio::test]
async fn test_authenticate_user_builds_authorization_url() {
    let server = MockServer::start().await;
    let client = create_client(&server);

    let authorization = client
        .auth()
        .unwrap()
        .authenticate_user(
            UserAuthOptions::default()
                .state(StateParam::from_raw("state-123"))
                .force_verify(true),
        )
        .unwrap();

    let uri = authorization.uri();
    assert!(uri.starts_with(&format!("{}/oauth2/authorize?", server.uri())));
    assert!(uri.contains("response_type=code"));
    assert!(uri.contains("client_id=test-client"));
    assert!(uri.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcallback"));
    assert!(uri.contains("scope=user%3Aread%3Aemail"));
    assert!(uri.contains("state=state-123"));
    assert!(uri.contains("force_verify=true"));
}

#[tokio::test]
async fn test_state_mismatch_rejected_before_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = create_client(&server);
    let authorization = client
        .auth()
        .unwrap()
        .authenticate_user(UserAuthOptions::default().state(StateParam::from_raw("expected")))
        .unwrap();

    let result = authorization.get_token("auth-code", Some("forged")).await;

    assert!(matches!(
        result,
        Err(OAuthError::StateMismatch { ref expected, ref received })
            if expected == "expected" && received == "forged"
    ));
}

#[tokio::test]
async fn test_matching_state_exchanges_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code"))
        .and(body_string_contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcallback",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "user-token",
            "refresh_token": "user-refresh",
            "expires_in": 14_400,
            "scope": ["user:read:email"],
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server);
    let authorization = client
        .auth()
        .unwrap()
        .authenticate_user(UserAuthOptions::default().generate_state())
        .unwrap();
    let state = authorization.state().unwrap().to_string();

    let credentials = authorization
        .get_token("auth-code", Some(&state))
        .await
        .unwrap();

    assert_eq!(credentials.access_token, "user-token");
    assert!(credentials.can_refresh());
    assert!(credentials.scopes.iter().any(|s| s == "user:read:email"));
}

#[tokio::test]
async fn test_authenticate_user_requires_redirect_uri() {
    let server = MockServer::start().await;
    let config = TwitchConfig::builder()
        .client_id(ClientId::new("test-client").unwrap())
        .client_secret(ClientSecret::new("test-secret").unwrap())
        .authentication_url(BaseUrl::new(server.uri()).unwrap())
        .build()
        .unwrap();
    let client = TwitchClient::new(config).unwrap();

    let result = client.auth().unwrap().authenticate_user(UserAuthOptions::default());

    assert!(matches!(result, Err(OAuthError::MissingRedirectUri)));
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn test_refresh_token_publishes_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-token",
            "refresh_token": "new-refresh",
            "expires_in": 14_400
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server);
    let agent = client.auth().unwrap();
    let mut events = agent.subscribe();

    let old = Credentials::new("old-token").with_refresh_token("old-refresh");
    let refreshed = agent.refresh_token(&old).await.unwrap();

    assert_eq!(refreshed.access_token, "new-token");
    assert_eq!(refreshed.refresh_token.as_deref(), Some("new-refresh"));

    let event = events.recv().await.unwrap();
    assert_eq!(event.old.access_token, "old-token");
    assert_eq!(event.new.access_token, "new-token");
}

#[tokio::test]
async fn test_refresh_without_refresh_token_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = create_client(&server);
    let result = client
        .auth()
        .unwrap()
        .refresh_token(&Credentials::new("app-token"))
        .await;

    assert!(matches!(result, Err(OAuthError::MissingRefreshToken)));
}

#[test]
fn test_auth_unavailable_without_client_credentials() {
    let config = TwitchConfig::builder()
        .client_id(ClientId::new("test-client").unwrap())
        .build()
        .unwrap();
    let client = TwitchClient::new(config).unwrap();

    assert!(matches!(
        client.auth(),
        Err(OAuthError::MissingClientCredentials)
    ));
}
