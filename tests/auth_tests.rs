use serde_json::json;
use wiremock::matchers::{any, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kehilla::Backend;

const USER_ID: &str = "5f6e2a9c-1d3b-4c8a-9e0f-2b7c4d5e6f70";

fn token_response() -> serde_json::Value {
    json!({
        "access_token": "test_access_token",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "test_refresh_token",
        "user": {
            "id": USER_ID,
            "email": "family@example.com",
            "role": "authenticated"
        }
    })
}

#[tokio::test]
async fn sign_in_stores_the_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response()))
        .mount(&mock_server)
        .await;

    let backend = Backend::new(&mock_server.uri(), "test-anon-key");
    let response = backend
        .auth()
        .sign_in_with_password("family@example.com", "password123")
        .await
        .unwrap();

    assert_eq!(response.access_token.as_deref(), Some("test_access_token"));
    let session = backend.auth().session().unwrap();
    assert_eq!(session.access_token, "test_access_token");
    assert_eq!(
        backend.auth().current_user().unwrap().email.as_deref(),
        Some("family@example.com")
    );
}

#[tokio::test]
async fn data_requests_carry_the_session_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(header("Authorization", "Bearer test_access_token"))
        .and(header("apikey", "test-anon-key"))
        .and(query_param("id", format!("eq.{}", USER_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = Backend::new(&mock_server.uri(), "test-anon-key");
    backend
        .auth()
        .sign_in_with_password("family@example.com", "password123")
        .await
        .unwrap();

    let user = backend.auth().current_user().unwrap();
    // An absent profile row synthesizes defaults from the session.
    let profile = kehilla::profile::fetch_profile(&backend, &user)
        .await
        .unwrap();
    assert_eq!(profile.id, user.id);
    assert_eq!(profile.email.as_deref(), Some("family@example.com"));
}

#[tokio::test]
async fn sign_out_clears_the_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response()))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let backend = Backend::new(&mock_server.uri(), "test-anon-key");
    backend
        .auth()
        .sign_in_with_password("family@example.com", "password123")
        .await
        .unwrap();
    assert!(backend.auth().session().is_some());

    backend.auth().sign_out().await.unwrap();
    assert!(backend.auth().session().is_none());
}

#[tokio::test]
async fn short_sign_up_password_never_reaches_the_network() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let backend = Backend::new(&mock_server.uri(), "test-anon-key");
    let result = backend.auth().sign_up("family@example.com", "abc").await;

    assert!(matches!(result, Err(kehilla::error::Error::Validation(_))));
}

#[tokio::test]
async fn magic_link_request_sends_the_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/otp"))
        .and(wiremock::matchers::body_partial_json(json!({
            "email": "family@example.com",
            "redirect_to": "https://shop.example.com/"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = kehilla::config::ClientOptions::default()
        .with_magic_link_redirect("https://shop.example.com/");
    let backend = Backend::new_with_options(&mock_server.uri(), "test-anon-key", options);

    backend
        .auth()
        .sign_in_with_otp("family@example.com")
        .await
        .unwrap();
}
