//! v0.24.0 gateway client against a mock server

use memosync_core::domain::ApiVersion;
use memosync_core::ports::{ErrorKind, IMemosClient};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_list_page_is_scoped_to_user() {
    let (server, client) = common::setup_gateway(true).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/1/memos"))
        .and(query_param("state", "NORMAL"))
        .and(query_param("pageSize", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "memos": [common::gateway_memo(9, "2024-03-02T23:30:00-05:00", "late night")],
            "nextPageToken": "abc"
        })))
        .mount(&server)
        .await;

    let user = client.resolve_current_user().await.unwrap();
    let page = client.list_page(20, None, &user).await.expect("page");

    assert_eq!(client.api_version(), ApiVersion::V0240);
    assert_eq!(page.memos.len(), 1);
    assert_eq!(page.memos[0].created_at.to_rfc3339(), "2024-03-03T04:30:00+00:00");
    assert_eq!(page.next_page_token.as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_state_archived_is_dropped() {
    let (server, client) = common::setup_gateway(true).await;

    let mut archived = common::gateway_memo(2, "2024-03-01T09:00:00Z", "archived");
    archived.as_object_mut().unwrap().remove("rowStatus");
    archived["state"] = json!("ARCHIVED");

    Mock::given(method("GET"))
        .and(path("/api/v1/users/1/memos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "memos": [archived]
        })))
        .mount(&server)
        .await;

    let user = client.resolve_current_user().await.unwrap();
    let page = client.list_page(20, None, &user).await.unwrap();

    assert!(page.memos.is_empty());
    assert!(page.is_last());
}

#[tokio::test]
async fn test_forbidden_is_auth_error() {
    let server = wiremock::MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/status"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": 7,
            "message": "permission denied"
        })))
        .mount(&server)
        .await;

    let client = memosync_api::GatewayClient::v0240(memosync_api::MemosHttp::new(
        server.uri(),
        "expired",
    ));
    let err = client.resolve_current_user().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(err.to_string().contains("permission denied"));
}
