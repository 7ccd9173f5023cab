//! Client for the legacy REST API (servers before v0.21)
//!
//! ## Wire shape
//!
//! - `GET /api/v1/user/me` - the authenticated user
//! - `GET /api/v1/memo?rowStatus=NORMAL&limit=N&offset=M` - a JSON array of
//!   memos, newest first, with unix-second timestamps
//! - `GET /o/r/{id}` - attachment bytes
//!
//! The list endpoint pages by offset, so the page token handed to callers
//! is the decimal offset of the next page. The wire format has no usable
//! creator filter expression; memos of other users are dropped here.

use chrono::{DateTime, Utc};
use memosync_core::domain::{
    ApiVersion, Memo, MemoId, MemoStatus, MemoUser, Page, ResourceRef,
};
use memosync_core::ports::{IMemosClient, MemosError, MemosResult};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::http::MemosHttp;

const USER_ME_PATH: &str = "/api/v1/user/me";
const MEMO_LIST_PATH: &str = "/api/v1/memo";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserV0191 {
    id: i64,
    username: String,
    #[serde(default)]
    nickname: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemoV0191 {
    id: i64,
    #[serde(default)]
    row_status: Option<String>,
    creator_id: i64,
    created_ts: i64,
    #[serde(default)]
    content: String,
    #[serde(default)]
    visibility: Option<String>,
    #[serde(default)]
    resource_list: Vec<ResourceV0191>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceV0191 {
    id: i64,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    external_link: Option<String>,
    #[serde(default, rename = "type")]
    mime_type: Option<String>,
}

impl MemoV0191 {
    fn into_memo(self) -> MemosResult<Memo> {
        let created_at = DateTime::<Utc>::from_timestamp(self.created_ts, 0).ok_or_else(|| {
            MemosError::Protocol(format!(
                "memo {} has out-of-range createdTs {}",
                self.id, self.created_ts
            ))
        })?;
        let id = MemoId::new(self.id.to_string())
            .map_err(|e| MemosError::Protocol(e.to_string()))?;
        let status = match self.row_status.as_deref() {
            Some("ARCHIVED") => MemoStatus::Archived,
            _ => MemoStatus::Normal,
        };

        Ok(Memo {
            id,
            created_at,
            content: self.content,
            visibility: self.visibility.unwrap_or_else(|| "PRIVATE".to_string()),
            status,
            creator: self.creator_id.to_string(),
            resources: self
                .resource_list
                .into_iter()
                .map(|r| ResourceRef {
                    id: r.id.to_string(),
                    filename: r.filename,
                    external_link: r.external_link.filter(|l| !l.trim().is_empty()),
                    mime_type: r.mime_type.filter(|t| !t.is_empty()),
                })
                .collect(),
        })
    }
}

// ============================================================================
// MemosClient0191
// ============================================================================

/// [`IMemosClient`] for the v0.19.1 REST API
#[derive(Debug, Clone)]
pub struct MemosClient0191 {
    http: MemosHttp,
}

impl MemosClient0191 {
    pub fn new(http: MemosHttp) -> Self {
        Self { http }
    }

    fn parse_offset(page_token: Option<&str>) -> MemosResult<u64> {
        match page_token.map(str::trim).filter(|t| !t.is_empty()) {
            None => Ok(0),
            Some(token) => token.parse::<u64>().map_err(|_| {
                MemosError::Protocol(format!("invalid v0.19.1 page token '{token}'"))
            }),
        }
    }
}

#[async_trait::async_trait]
impl IMemosClient for MemosClient0191 {
    fn api_version(&self) -> ApiVersion {
        ApiVersion::V0191
    }

    #[instrument(skip(self))]
    async fn resolve_current_user(&self) -> MemosResult<MemoUser> {
        let user: UserV0191 = self
            .http
            .send_json(
                self.http.request(Method::GET, USER_ME_PATH),
                "resolve current user",
            )
            .await?;

        Ok(MemoUser {
            name: user.id.to_string(),
            username: user.username,
            nickname: user.nickname.filter(|n| !n.is_empty()),
        })
    }

    #[instrument(skip(self, current_user), fields(user = %current_user.name))]
    async fn list_page(
        &self,
        page_size: u32,
        page_token: Option<&str>,
        current_user: &MemoUser,
    ) -> MemosResult<Page> {
        let offset = Self::parse_offset(page_token)?;
        let request = self.http.request(Method::GET, MEMO_LIST_PATH).query(&[
            ("rowStatus", "NORMAL".to_string()),
            ("limit", page_size.to_string()),
            ("offset", offset.to_string()),
        ]);

        let raw: Vec<MemoV0191> = self.http.send_json(request, "list memos").await?;
        let fetched = raw.len() as u64;

        let next_page_token = if fetched >= u64::from(page_size) && fetched > 0 {
            Some((offset + fetched).to_string())
        } else {
            None
        };

        let mut memos = Vec::with_capacity(raw.len());
        for memo in raw {
            let memo = memo.into_memo()?;
            if memo.creator == current_user.name && memo.status == MemoStatus::Normal {
                memos.push(memo);
            }
        }

        debug!(
            offset,
            fetched,
            kept = memos.len(),
            has_next = next_page_token.is_some(),
            "Received v0.19.1 memo page"
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
        let path = format!("/o/r/{}", resource.id);
        self.http
            .send_bytes(self.http.request(Method::GET, &path), "fetch resource")
            .await
    }
}
