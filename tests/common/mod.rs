#![allow(dead_code)]

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

use rituals_bridge::rituals::{session::Credentials, RitualsClient, RitualsClientBuilder};
use rituals_bridge::session_store::{MemorySessionStore, SessionStore};

pub const EMAIL: &str = "owner@example.com";
pub const PASSWORD: &str = "correct horse";
pub const LOGIN_PATH: &str = "/apiv2/account/token";
pub const HUBS_PATH: &str = "/apiv2/account/hubs";

pub fn credentials() -> Credentials {
    Credentials::new(EMAIL, SecretString::from(PASSWORD.to_owned()))
}

pub fn builder(server: &MockServer) -> RitualsClientBuilder {
    RitualsClient::builder(credentials()).base_url(server.uri())
}

pub async fn setup() -> (MockServer, RitualsClient) {
    let server = MockServer::start().await;
    let client = builder(&server).build().unwrap();
    (server, client)
}

pub async fn setup_with_store() -> (MockServer, RitualsClient, Arc<MemorySessionStore>) {
    let server = MockServer::start().await;
    let store = Arc::new(MemorySessionStore::new());
    let client = builder(&server)
        .session_store(store.clone() as Arc<dyn SessionStore>)
        .build()
        .unwrap();
    (server, client, store)
}

/// Matches a login call carrying the test credentials as JSON.
pub fn login() -> MockBuilder {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(body_json(json!({ "email": EMAIL, "password": PASSWORD })))
}

pub fn login_ok(token: &str) -> Mock {
    login().respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": token })))
}

pub fn attribute_path(hash: &str, attr: &str) -> String {
    format!("/apiv2/hubs/{hash}/attributes/{attr}")
}

pub fn sensor_path(hash: &str, sensor: &str) -> String {
    format!("/apiv2/hubs/{hash}/sensors/{sensor}")
}

pub async fn requests_to(server: &MockServer, wanted: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == wanted)
        .count()
}
