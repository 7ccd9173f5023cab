//! v0.22.0 gateway client against a mock server

use memosync_core::domain::{ApiVersion, ResourceRef};
use memosync_core::ports::{ErrorKind, IMemosClient};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_resolve_current_user() {
    let (_server, client) = common::setup_gateway(false).await;

    let user = client.resolve_current_user().await.expect("user");

    assert_eq!(client.api_version(), ApiVersion::V0220);
    assert_eq!(user.name, "users/1");
    assert_eq!(user.username, "alice");
}

#[tokio::test]
async fn test_list_page_uses_creator_filter_and_page_token() {
    let (server, client) = common::setup_gateway(false).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/memos"))
        .and(query_param("filter", "creator == \"users/1\""))
        .and(query_param("pageSize", "2"))
        .and(query_param("pageToken", "next-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "memos": [common::gateway_memo(3, "2024-02-28T10:00:00Z", "third")],
            "nextPageToken": ""
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/memos"))
        .and(query_param("filter", "creator == \"users/1\""))
        .and(query_param("pageSize", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "memos": [
                common::gateway_memo(5, "2024-03-01T10:00:00Z", "fifth"),
                common::gateway_memo(4, "2024-03-01T09:00:00Z", "fourth"),
            ],
            "nextPageToken": "next-1"
        })))
        .mount(&server)
        .await;

    let user = client.resolve_current_user().await.unwrap();

    let first = client.list_page(2, None, &user).await.expect("page 1");
    assert_eq!(first.memos.len(), 2);
    assert_eq!(first.memos[0].id.as_str(), "memos/5");
    assert_eq!(first.next_page_token.as_deref(), Some("next-1"));

    let second = client
        .list_page(2, Some("next-1"), &user)
        .await
        .expect("page 2");
    assert_eq!(second.memos.len(), 1);
    assert_eq!(second.memos[0].content, "third");
    assert!(second.is_last());
}

#[tokio::test]
async fn test_archived_memos_are_dropped() {
    let (server, client) = common::setup_gateway(false).await;

    let mut archived = common::gateway_memo(2, "2024-03-01T09:00:00Z", "archived");
    archived["rowStatus"] = json!("ARCHIVED");
    archived["state"] = json!("ARCHIVED");

    Mock::given(method("GET"))
        .and(path("/api/v1/memos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "memos": [common::gateway_memo(3, "2024-03-01T10:00:00Z", "active"), archived]
        })))
        .mount(&server)
        .await;

    let user = client.resolve_current_user().await.unwrap();
    let page = client.list_page(10, None, &user).await.unwrap();

    assert_eq!(page.memos.len(), 1);
    assert_eq!(page.memos[0].content, "active");
}

#[tokio::test]
async fn test_missing_endpoint_is_protocol_error() {
    let (server, client) = common::setup_gateway(false).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/memos"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let user = client.resolve_current_user().await.unwrap();
    let err = client.list_page(10, None, &user).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn test_fetch_resource_from_file_endpoint() {
    let (server, client) = common::setup_gateway(false).await;
    Mock::given(method("GET"))
        .and(path("/file/resources/3/notes.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
        .mount(&server)
        .await;

    let resource = ResourceRef {
        id: "resources/3".to_string(),
        filename: "notes.txt".to_string(),
        external_link: None,
        mime_type: Some("text/plain".to_string()),
    };
    let bytes = client.fetch_resource(&resource).await.expect("bytes");

    assert_eq!(bytes, b"hello".to_vec());
}

#[tokio::test]
async fn test_fetch_resource_encodes_filename() {
    let (server, client) = common::setup_gateway(false).await;
    Mock::given(method("GET"))
        .and(path("/file/resources/4/plan%20%232%3F.md"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"plan".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let resource = ResourceRef {
        id: "resources/4".to_string(),
        filename: "plan #2?.md".to_string(),
        external_link: None,
        mime_type: None,
    };
    let bytes = client.fetch_resource(&resource).await.expect("bytes");

    assert_eq!(bytes, b"plan".to_vec());
}
