//! v0.19.1 REST client against a mock server

use memosync_core::domain::{ApiVersion, ResourceRef};
use memosync_core::ports::{ErrorKind, IMemosClient};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_resolve_current_user() {
    let (_server, client) = common::setup_v0191().await;

    let user = client.resolve_current_user().await.expect("user");

    assert_eq!(client.api_version(), ApiVersion::V0191);
    assert_eq!(user.name, "1");
    assert_eq!(user.username, "alice");
    assert_eq!(user.nickname.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn test_list_page_filters_other_creators_and_pages_by_offset() {
    let (server, client) = common::setup_v0191().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/memo"))
        .and(query_param("rowStatus", "NORMAL"))
        .and(query_param("limit", "2"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            common::rest_memo(12, 1, 1_709_280_000, "mine"),
            common::rest_memo(11, 2, 1_709_270_000, "someone else"),
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/memo"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            common::rest_memo(10, 1, 1_709_260_000, "older"),
        ])))
        .mount(&server)
        .await;

    let user = client.resolve_current_user().await.unwrap();

    let first = client.list_page(2, None, &user).await.expect("page 1");
    assert_eq!(first.memos.len(), 1);
    assert_eq!(first.memos[0].content, "mine");
    assert_eq!(first.next_page_token.as_deref(), Some("2"));

    let second = client
        .list_page(2, first.next_page_token.as_deref(), &user)
        .await
        .expect("page 2");
    assert_eq!(second.memos.len(), 1);
    assert_eq!(second.memos[0].id.as_str(), "10");
    assert!(second.is_last());
}

#[tokio::test]
async fn test_unauthorized_is_auth_error() {
    let server = wiremock::MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "missing user in session"
        })))
        .mount(&server)
        .await;

    let client = memosync_api::MemosClient0191::new(memosync_api::MemosHttp::new(
        server.uri(),
        "bad-token",
    ));
    let err = client.resolve_current_user().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = common::setup_v0191().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/memo"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let user = client.resolve_current_user().await.unwrap();
    let err = client.list_page(10, None, &user).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transient);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_gateway_shaped_response_is_protocol_error() {
    let (server, client) = common::setup_v0191().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/memo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "memos": [],
            "nextPageToken": ""
        })))
        .mount(&server)
        .await;

    let user = client.resolve_current_user().await.unwrap();
    let err = client.list_page(10, None, &user).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(err.to_string().contains("api_version"));
}

#[tokio::test]
async fn test_fetch_resource_bytes() {
    let (server, client) = common::setup_v0191().await;
    Mock::given(method("GET"))
        .and(path("/o/r/7"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .mount(&server)
        .await;

    let resource = ResourceRef {
        id: "7".to_string(),
        filename: "photo.png".to_string(),
        external_link: None,
        mime_type: Some("image/png".to_string()),
    };
    let bytes = client.fetch_resource(&resource).await.expect("bytes");

    assert_eq!(bytes, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_fetch_resource_follows_external_link() {
    let (server, client) = common::setup_v0191().await;
    Mock::given(method("GET"))
        .and(path("/hosted/file.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pdf".to_vec()))
        .mount(&server)
        .await;

    let resource = ResourceRef {
        id: "8".to_string(),
        filename: "file.pdf".to_string(),
        external_link: Some(format!("{}/hosted/file.pdf", server.uri())),
        mime_type: None,
    };
    let bytes = client.fetch_resource(&resource).await.expect("bytes");

    assert_eq!(bytes, b"pdf".to_vec());
}
