use super::*;
use mockito::{Matcher, Server};

const TOKEN_PATH: &str = "/tenant-1/oauth2/token?api-version=1.0";

fn credentials() -> Credentials {
    Credentials {
        client_id: "client-1".to_string(),
        client_secret: "secret-1".to_string(),
        tenant_id: "tenant-1".to_string(),
    }
}

fn token_form() -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("client_id".into(), "client-1".into()),
        Matcher::UrlEncoded("client_secret".into(), "secret-1".into()),
        Matcher::UrlEncoded("resource".into(), "https://graph.microsoft.com/".into()),
        Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
    ])
}

#[test]
fn test_token_url() {
    let manager = TokenManager::new(Client::new());
    assert_eq!(
        manager.token_url("contoso"),
        "https://login.microsoftonline.com/contoso/oauth2/token?api-version=1.0"
    );
}

#[test]
fn test_token_url_trims_trailing_slash() {
    let manager = TokenManager::with_login_url(Client::new(), "http://localhost:9999/".to_string());
    assert_eq!(
        manager.token_url("t"),
        "http://localhost:9999/t/oauth2/token?api-version=1.0"
    );
}

#[test]
fn test_missing_field_order() {
    let mut creds = credentials();
    assert_eq!(creds.missing_field(), None);

    creds.tenant_id.clear();
    assert_eq!(creds.missing_field(), Some("tenant_id"));

    creds.client_id.clear();
    assert_eq!(creds.missing_field(), Some("client_id"));
}

#[test]
fn test_debug_redacts_secrets() {
    let rendered = format!("{:?}", credentials());
    assert!(!rendered.contains("secret-1"));
    assert!(rendered.contains("client-1"));

    let token = AccessToken {
        value: "T1".to_string(),
        obtained_at: Utc::now(),
    };
    assert!(!format!("{:?}", token).contains("T1"));
}

#[test]
fn test_token_age() {
    let token = AccessToken {
        value: "T1".to_string(),
        obtained_at: Utc::now() - chrono::Duration::seconds(90),
    };
    assert!(token.age().num_seconds() >= 90);
}

#[tokio::test]
async fn test_authenticate_success() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", TOKEN_PATH)
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(token_form())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token_type":"Bearer","expires_in":"3599","access_token":"T1"}"#)
        .expect(1)
        .create_async()
        .await;

    let manager = TokenManager::with_login_url(Client::new(), server.url());
    let before = Utc::now();
    let token = manager.authenticate(&credentials()).await.unwrap();

    assert_eq!(token.value, "T1");
    assert!(token.obtained_at >= before);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_authenticate_non_200_fails() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", TOKEN_PATH)
        .with_status(401)
        .with_body(r#"{"error":"invalid_client"}"#)
        .create_async()
        .await;

    let manager = TokenManager::with_login_url(Client::new(), server.url());
    let err = manager.authenticate(&credentials()).await.unwrap_err();

    match err {
        AuthError::Status { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid_client"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_authenticate_other_2xx_fails() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", TOKEN_PATH)
        .with_status(201)
        .with_body(r#"{"access_token":"T1"}"#)
        .create_async()
        .await;

    let manager = TokenManager::with_login_url(Client::new(), server.url());
    let err = manager.authenticate(&credentials()).await.unwrap_err();
    assert!(matches!(err, AuthError::Status { status: 201, .. }));
}

#[tokio::test]
async fn test_authenticate_missing_access_token() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", TOKEN_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token_type":"Bearer"}"#)
        .create_async()
        .await;

    let manager = TokenManager::with_login_url(Client::new(), server.url());
    let err = manager.authenticate(&credentials()).await.unwrap_err();
    assert_eq!(err, AuthError::MissingToken);
}

#[tokio::test]
async fn test_authenticate_unparseable_body() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", TOKEN_PATH)
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let manager = TokenManager::with_login_url(Client::new(), server.url());
    let err = manager.authenticate(&credentials()).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_authenticate_missing_credential_sends_nothing() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let manager = TokenManager::with_login_url(Client::new(), server.url());
    let mut creds = credentials();
    creds.client_secret.clear();

    let err = manager.authenticate(&creds).await.unwrap_err();
    assert_eq!(err, AuthError::MissingCredential("client_secret"));
    assert!(err.is_configuration());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_authenticate_transport_error() {
    // Nothing listens on port 1.
    let manager = TokenManager::with_login_url(Client::new(), "http://127.0.0.1:1".to_string());
    let err = manager.authenticate(&credentials()).await.unwrap_err();
    assert!(matches!(err, AuthError::Transport(_)));
    assert!(!err.is_configuration());
}

#[tokio::test]
async fn test_repeated_calls_reauthenticate() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", TOKEN_PATH)
        .with_status(200)
        .with_body(r#"{"access_token":"T1"}"#)
        .expect(2)
        .create_async()
        .await;

    let manager = TokenManager::with_login_url(Client::new(), server.url());
    manager.authenticate(&credentials()).await.unwrap();
    manager.authenticate(&credentials()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_authenticate_timeout_is_transport_error() {
    // Accepts connections at the TCP level but never responds.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let login_url = format!("http://{}", listener.local_addr().unwrap());

    let client = Client::builder()
        .timeout(std::time::Duration::from_millis(300))
        .build()
        .unwrap();
    let manager = TokenManager::with_login_url(client, login_url);
    let err = manager.authenticate(&credentials()).await.unwrap_err();

    assert!(matches!(err, AuthError::Transport(_)));
    assert!(!err.is_configuration());
}
