//! Client for gRPC-era servers, spoken through the HTTP gateway mapping
//!
//! Servers from v0.22 expose their gRPC services on `/api/v1/...` as JSON.
//! Both supported releases share identity and resource wire types and
//! differ in how the memo listing is scoped:
//!
//! | Version | Current user              | Memo listing                                       |
//! |---------|---------------------------|----------------------------------------------------|
//! | v0.22.0 | `POST /api/v1/auth/status` | `GET /api/v1/memos?filter=creator == "users/N"`    |
//! | v0.24.0 | `POST /api/v1/auth/status` | `GET /api/v1/users/N/memos?state=NORMAL`           |
//!
//! Resource bytes are served from `/file/{resource name}/{filename}`.

use chrono::{DateTime, Utc};
use memosync_core::domain::{
    ApiVersion, Memo, MemoId, MemoStatus, MemoUser, Page, ResourceRef,
};
use memosync_core::ports::{IMemosClient, MemosError, MemosResult};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::http::MemosHttp;

const AUTH_STATUS_PATH: &str = "/api/v1/auth/status";
const MEMOS_PATH: &str = "/api/v1/memos";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayUser {
    name: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    nickname: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListMemosResponse {
    #[serde(default)]
    memos: Vec<GatewayMemo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayMemo {
    name: String,
    /// v0.22 lifecycle field
    #[serde(default)]
    row_status: Option<String>,
    /// v0.24 lifecycle field
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    creator: String,
    create_time: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    visibility: Option<String>,
    #[serde(default)]
    resources: Vec<GatewayResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayResource {
    name: String,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    external_link: Option<String>,
    #[serde(default, rename = "type")]
    mime_type: Option<String>,
}

fn parse_status(row_status: Option<&str>, state: Option<&str>) -> MemoStatus {
    match state.or(row_status) {
        Some("ARCHIVED") | Some("ROW_STATUS_ARCHIVED") | Some("STATE_ARCHIVED") => {
            MemoStatus::Archived
        }
        _ => MemoStatus::Normal,
    }
}

impl GatewayMemo {
    fn into_memo(self) -> MemosResult<Memo> {
        let created_at = DateTime::parse_from_rfc3339(&self.create_time)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                MemosError::Protocol(format!(
                    "memo {} has unparseable createTime '{}': {}",
                    self.name, self.create_time, e
                ))
            })?;
        let id = MemoId::new(self.name).map_err(|e| MemosError::Protocol(e.to_string()))?;
        let status = parse_status(self.row_status.as_deref(), self.state.as_deref());

        Ok(Memo {
            id,
            created_at,
            content: self.content,
            visibility: self.visibility.unwrap_or_else(|| "PRIVATE".to_string()),
            status,
            creator: self.creator,
            resources: self
                .resources
                .into_iter()
                .map(|r| ResourceRef {
                    id: r.name,
                    filename: r.filename,
                    external_link: r.external_link.filter(|l| !l.trim().is_empty()),
                    mime_type: r.mime_type.filter(|t| !t.is_empty()),
                })
                .collect(),
        })
    }
}

// ============================================================================
// GatewayClient
// ============================================================================

/// [`IMemosClient`] for v0.22.0 and v0.24.0 servers
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: MemosHttp,
    version: ApiVersion,
}

impl GatewayClient {
    /// Creates a client for a gateway-era version
    ///
    /// Returns `None` for versions that do not speak the gateway protocol.
    pub fn new(http: MemosHttp, version: ApiVersion) -> Option<Self> {
        match version {
            ApiVersion::V0220 | ApiVersion::V0240 => Some(Self { http, version }),
            ApiVersion::V0191 => None,
        }
    }

    pub fn v0220(http: MemosHttp) -> Self {
        Self {
            http,
            version: ApiVersion::V0220,
        }
    }

    pub fn v0240(http: MemosHttp) -> Self {
        Self {
            http,
            version: ApiVersion::V0240,
        }
    }

    fn list_request(
        &self,
        page_size: u32,
        page_token: Option<&str>,
        current_user: &MemoUser,
    ) -> reqwest::RequestBuilder {
        let mut query: Vec<(&str, String)> = vec![("pageSize", page_size.to_string())];
        if let Some(token) = page_token.filter(|t| !t.is_empty()) {
            query.push(("pageToken", token.to_string()));
        }

        match self.version {
            ApiVersion::V0240 => {
                query.push(("state", "NORMAL".to_string()));
                let path = format!("/api/v1/{}/memos", current_user.name);
                self.http.request(Method::GET, &path).query(&query)
            }
            _ => {
                query.push(("filter", format!("creator == \"{}\"", current_user.name)));
                self.http.request(Method::GET, MEMOS_PATH).query(&query)
            }
        }
    }
}

#[async_trait::async_trait]
impl IMemosClient for GatewayClient {
    fn api_version(&self) -> ApiVersion {
        self.version
    }

    #[instrument(skip(self), fields(version = %self.version))]
    async fn resolve_current_user(&self) -> MemosResult<MemoUser> {
        let user: GatewayUser = self
            .http
            .send_json(
                self.http.request(Method::POST, AUTH_STATUS_PATH),
                "resolve current user",
            )
            .await?;

        if !user.name.starts_with("users/") {
            return Err(MemosError::Protocol(format!(
                "unexpected user resource name '{}'",
                user.name
            )));
        }

        Ok(MemoUser {
            name: user.name,
            username: user.username,
            nickname: user.nickname.filter(|n| !n.is_empty()),
        })
    }

    #[instrument(skip(self, current_user), fields(version = %self.version, user = %current_user.name))]
    async fn list_page(
        &self,
        page_size: u32,
        page_token: Option<&str>,
        current_user: &MemoUser,
    ) -> MemosResult<Page> {
        let request = self.list_request(page_size, page_token, current_user);
        let response: ListMemosResponse = self.http.send_json(request, "list memos").await?;

        let fetched = response.memos.len();
        let mut memos = Vec::with_capacity(fetched);
        for memo in response.memos {
            let memo = memo.into_memo()?;
            if memo.status == MemoStatus::Normal {
                memos.push(memo);
            }
        }

        let next_page_token = response.next_page_token.filter(|t| !t.is_empty());
        debug!(
            fetched,
            kept = memos.len(),
            has_next = next_page_token.is_some(),
            "Received memo page"
        );

        Ok(Page {
            memos,
            next_page_token,
        })
    }

    #[instrument(skip(self, resource), fields(resource = %resource.id))]
    async fn fetch_resource(&self, resource: &ResourceRef) -> MemosResult<Vec<u8>> {
        if let Some(link) = resource.external() {
            return self.http.get_external(link).await;
        }
        let segments = std::iter::once("file")
            .chain(resource.id.split('/'))
            .chain(std::iter::once(resource.filename.as_str()));
        let url = self.http.segment_url(segments)?;
        self.http
            .send_bytes(self.http.request_url(Method::GET, url), "fetch resource")
            .await
    }
}
