//! Version selection
//!
//! The configured [`ApiVersion`] picks exactly one adapter. The choice is a
//! closed set, so it is an enum rather than a boxed trait object; callers
//! that need dynamic dispatch can still hold it as `Arc<dyn IMemosClient>`.

use std::time::Duration;

use memosync_core::config::MemosConfig;
use memosync_core::domain::{ApiVersion, MemoUser, Page, ResourceRef};
use memosync_core::ports::{IMemosClient, MemosResult};
use tracing::info;

use crate::gateway::GatewayClient;
use crate::http::MemosHttp;
use crate::v0191::MemosClient0191;

/// One concrete client per supported server release
#[derive(Debug, Clone)]
pub enum VersionedClient {
    V0191(MemosClient0191),
    V0220(GatewayClient),
    V0240(GatewayClient),
}

impl VersionedClient {
    pub fn new(version: ApiVersion, http: MemosHttp) -> Self {
        match version {
            ApiVersion::V0191 => Self::V0191(MemosClient0191::new(http)),
            ApiVersion::V0220 => Self::V0220(GatewayClient::v0220(http)),
            ApiVersion::V0240 => Self::V0240(GatewayClient::v0240(http)),
        }
    }

    fn inner(&self) -> &dyn IMemosClient {
        match self {
            Self::V0191(c) => c,
            Self::V0220(c) | Self::V0240(c) => c,
        }
    }
}

#[async_trait::async_trait]
impl IMemosClient for VersionedClient {
    fn api_version(&self) -> ApiVersion {
        self.inner().api_version()
    }

    async fn resolve_current_user(&self) -> MemosResult<MemoUser> {
        self.inner().resolve_current_user().await
    }

    async fn list_page(
        &self,
        page_size: u32,
        page_token: Option<&str>,
        current_user: &MemoUser,
    ) -> MemosResult<Page> {
        self.inner()
            .list_page(page_size, page_token, current_user)
            .await
    }

    async fn fetch_resource(&self, resource: &ResourceRef) -> MemosResult<Vec<u8>> {
        self.inner().fetch_resource(resource).await
    }
}

/// Builds clients from configuration
pub struct MemosClientFactory;

impl MemosClientFactory {
    /// Fails only when the HTTP client cannot be built
    pub fn from_config(config: &MemosConfig) -> reqwest::Result<VersionedClient> {
        let http = MemosHttp::with_timeout(
            config.normalized_api_url(),
            config.api_token.clone(),
            Duration::from_secs(config.timeout_secs.max(1)),
        )?;
        info!(
            api_url = %http.base_url(),
            api_version = %config.api_version,
            "Creating Memos client"
        );
        Ok(VersionedClient::new(config.api_version, http))
    }
}
