#![allow(clippy::unwrap_used)]
// Authentication and authenticated-request tests against a mocked Rituals API.

mod common;

use std::time::Duration;

use chrono::Utc;
use reqwest::{Method, StatusCode};
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rituals_bridge::{rituals::RitualsClient, session_store::SessionStore, Error};

use common::*;

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_success_issues_day_long_token() {
    let (server, client) = setup().await;
    login_ok("tok-1").expect(1).mount(&server).await;

    let before = Utc::now();
    let token = client.session().authenticate().await.unwrap();

    assert_eq!(token.value, "tok-1");
    assert_eq!(token.expires_at - token.issued_at, chrono::Duration::hours(24));
    assert!(token.issued_at >= before);
    assert!(token.is_valid_at(Utc::now()));
}

#[tokio::test]
async fn test_login_failure_carries_server_message() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let err = client.session().authenticate().await.unwrap_err();

    match err {
        Error::Authentication { message } => assert_eq!(message, "Invalid credentials"),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_without_success_field_is_authentication_error() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Account locked" })))
        .mount(&server)
        .await;

    let err = client.session().authenticate().await.unwrap_err();
    assert_eq!(err.to_string(), "Authentication failed: Account locked");
}

#[tokio::test]
async fn test_login_malformed_body_gets_generic_message() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.session().authenticate().await;
    assert!(
        matches!(&result, Err(Error::Authentication { message }) if message.contains("no token")),
        "expected generic Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_server_error_is_api_error() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let result = client.session().authenticate().await;
    assert!(
        matches!(&result, Err(Error::Api { status, .. }) if *status == StatusCode::SERVICE_UNAVAILABLE),
        "expected Api error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_server_error_with_message_is_authentication_error() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({ "message": "Service down" })),
        )
        .mount(&server)
        .await;

    let err = client.session().authenticate().await.unwrap_err();
    assert_eq!(err.to_string(), "Authentication failed: Service down");
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let client = RitualsClient::builder(credentials())
        .base_url("http://127.0.0.1:1")
        .build()
        .unwrap();

    let result = client.session().authenticate().await;
    assert!(matches!(result, Err(Error::Network(_))), "got: {result:?}");
}

#[tokio::test]
async fn test_timeout_is_network_error_and_leaves_cache_empty() {
    let server = MockServer::start().await;
    login()
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": "slow" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    let client = builder(&server)
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let result = client.session().valid_token().await;

    match result {
        Err(Error::Network(e)) => assert!(e.is_timeout()),
        other => panic!("expected timeout, got: {other:?}"),
    }
    assert!(!client.session().token_status().await.valid);
}

// ── Token cache ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_valid_token_is_cached() {
    let (server, client) = setup().await;
    login_ok("tok-1").expect(1).mount(&server).await;

    let first = client.session().valid_token().await.unwrap();
    let second = client.session().valid_token().await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": "shared" }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let client = builder(&server).build().unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.session().valid_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().value, "shared");
    }
}

#[tokio::test]
async fn test_expired_token_triggers_exactly_one_relogin() {
    let server = MockServer::start().await;
    login()
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": "tok" }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(2)
        .mount(&server)
        .await;
    let client = builder(&server)
        .token_lifetime(chrono::Duration::milliseconds(300))
        .build()
        .unwrap();

    client.session().valid_token().await.unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.session().valid_token().await })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().value, "tok");
    }
}

#[tokio::test]
async fn test_token_status_does_not_wait_for_login_in_flight() {
    let server = MockServer::start().await;
    login()
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": "slow" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    let client = builder(&server).build().unwrap();

    let login = {
        let client = client.clone();
        tokio::spawn(async move { client.session().valid_token().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let status = tokio::time::timeout(Duration::from_millis(200), client.session().token_status())
        .await
        .expect("token status blocked on the login");
    assert!(!status.valid);

    assert_eq!(login.await.unwrap().unwrap().value, "slow");
    assert!(client.session().token_status().await.valid);
}

#[tokio::test]
async fn test_login_persists_token_to_store() {
    let (server, client, store) = setup_with_store().await;
    login_ok("persisted").mount(&server).await;

    let token = client.session().valid_token().await.unwrap();

    let stored = store.load().await.unwrap();
    assert_eq!(stored.token, "persisted");
    assert_eq!(stored.expires_at, token.expires_at);
}

// ── Authenticated requests ──────────────────────────────────────────

#[tokio::test]
async fn test_request_sends_raw_token_as_authorization() {
    let (server, client) = setup().await;
    login_ok("tok-abc").mount(&server).await;
    Mock::given(method("GET"))
        .and(path(attribute_path("h1", "fanc")))
        .and(header("authorization", "tok-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"1\""))
        .expect(1)
        .mount(&server)
        .await;

    let reading = client.get_attribute("h1", "fanc").await.unwrap();
    assert_eq!(reading.extract(), Some("1"));
}

#[tokio::test]
async fn test_write_is_form_urlencoded() {
    let (server, client) = setup().await;
    login_ok("tok").mount(&server).await;
    Mock::given(method("POST"))
        .and(path(attribute_path("h1", "speedc")))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("speedc=2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.set_attribute("h1", "speedc", "2").await.unwrap();
}

#[tokio::test]
async fn test_non_success_status_is_api_error_with_body() {
    let (server, client) = setup().await;
    login_ok("tok").mount(&server).await;
    Mock::given(method("GET"))
        .and(path(sensor_path("h1", "wific")))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such sensor"))
        .mount(&server)
        .await;

    let result = client.get_sensor("h1", "wific").await;
    match result {
        Err(Error::Api { status, body }) => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, "no such sensor");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_and_retried_once() {
    let (server, client) = setup().await;
    login_ok("stale")
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    login_ok("fresh").mount(&server).await;

    Mock::given(method("GET"))
        .and(path(attribute_path("h1", "fanc")))
        .and(header("authorization", "stale"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(attribute_path("h1", "fanc")))
        .and(header("authorization", "fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_string("0"))
        .mount(&server)
        .await;

    let reading = client.get_attribute("h1", "fanc").await.unwrap();

    assert_eq!(reading.extract(), Some("0"));
    assert_eq!(requests_to(&server, LOGIN_PATH).await, 2);
    assert_eq!(client.session().valid_token().await.unwrap().value, "fresh");
}

#[tokio::test]
async fn test_second_rejection_is_returned_without_looping() {
    let (server, client) = setup().await;
    login_ok("tok").mount(&server).await;
    Mock::given(method("GET"))
        .and(path(attribute_path("h1", "fanc")))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let result = client.get_attribute("h1", "fanc").await;

    assert!(matches!(&result, Err(e) if e.is_auth_rejected()), "got: {result:?}");
    assert_eq!(requests_to(&server, LOGIN_PATH).await, 2);
    assert_eq!(requests_to(&server, &attribute_path("h1", "fanc")).await, 2);
}

#[tokio::test]
async fn test_other_failures_are_not_retried() {
    let (server, client) = setup().await;
    login_ok("tok").mount(&server).await;
    Mock::given(method("GET"))
        .and(path(HUBS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.request(Method::GET, HUBS_PATH, None).await;
    assert!(matches!(result, Err(Error::Api { .. })));
    assert_eq!(requests_to(&server, LOGIN_PATH).await, 1);
}
