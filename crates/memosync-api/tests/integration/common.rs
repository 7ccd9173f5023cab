//! Shared helpers for Memos API integration tests
//!
//! Each helper starts a mock server, mounts the identity endpoint for the
//! requested release and returns a client pointed at it.

use memosync_api::{GatewayClient, MemosClient0191, MemosHttp};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-access-token";

pub fn bearer() -> String {
    format!("Bearer {TOKEN}")
}

/// Mock server plus a v0.19.1 client; `/api/v1/user/me` answers as user 1
pub async fn setup_v0191() -> (MockServer, MemosClient0191) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/user/me"))
        .and(header("authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "username": "alice",
            "nickname": "Alice",
            "role": "HOST"
        })))
        .mount(&server)
        .await;

    let client = MemosClient0191::new(MemosHttp::new(server.uri(), TOKEN));
    (server, client)
}

/// Mock server plus a gateway client; `/api/v1/auth/status` answers as `users/1`
pub async fn setup_gateway(v0240: bool) -> (MockServer, GatewayClient) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/status"))
        .and(header("authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "users/1",
            "id": 1,
            "username": "alice",
            "nickname": "Alice"
        })))
        .mount(&server)
        .await;

    let http = MemosHttp::new(server.uri(), TOKEN);
    let client = if v0240 {
        GatewayClient::v0240(http)
    } else {
        GatewayClient::v0220(http)
    };
    (server, client)
}

/// A v0.19.1 memo in wire form
pub fn rest_memo(id: i64, creator_id: i64, created_ts: i64, content: &str) -> Value {
    json!({
        "id": id,
        "rowStatus": "NORMAL",
        "creatorId": creator_id,
        "createdTs": created_ts,
        "updatedTs": created_ts,
        "content": content,
        "visibility": "PRIVATE",
        "pinned": false,
        "resourceList": []
    })
}

/// A gateway memo in wire form
pub fn gateway_memo(id: i64, create_time: &str, content: &str) -> Value {
    json!({
        "name": format!("memos/{id}"),
        "uid": format!("uid{id}"),
        "rowStatus": "ACTIVE",
        "state": "NORMAL",
        "creator": "users/1",
        "createTime": create_time,
        "content": content,
        "visibility": "PRIVATE",
        "resources": []
    })
}
