//! Factory-built clients reach the right endpoints

use std::time::Duration;

use memosync_api::{MemosClientFactory, VersionedClient};
use memosync_core::config::MemosConfig;
use memosync_core::domain::ApiVersion;
use memosync_core::ports::{ErrorKind, IMemosClient};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer, version: ApiVersion) -> MemosConfig {
    MemosConfig {
        api_version: version,
        api_url: format!("{}/", server.uri()),
        api_token: "token".to_string(),
        page_size: 10,
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn test_factory_v0191_uses_rest_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4,
            "username": "bob"
        })))
        .mount(&server)
        .await;

    let client = MemosClientFactory::from_config(&config(&server, ApiVersion::V0191)).expect("client");
    assert!(matches!(client, VersionedClient::V0191(_)));

    let user = client.resolve_current_user().await.expect("user");
    assert_eq!(user.name, "4");
}

#[tokio::test]
async fn test_factory_v0220_uses_auth_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "users/4",
            "username": "bob"
        })))
        .mount(&server)
        .await;

    let client = MemosClientFactory::from_config(&config(&server, ApiVersion::V0220)).expect("client");

    let user = client.resolve_current_user().await.expect("user");
    assert_eq!(user.name, "users/4");
    assert_eq!(client.api_version(), ApiVersion::V0220);
}

#[tokio::test]
async fn test_configured_timeout_is_applied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "name": "users/4", "username": "bob" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = MemosConfig {
        timeout_secs: 1,
        ..config(&server, ApiVersion::V0240)
    };
    let client = MemosClientFactory::from_config(&config).expect("client");
    let err = client.resolve_current_user().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transient);
}
