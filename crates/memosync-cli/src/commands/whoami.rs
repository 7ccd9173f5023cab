//! Whoami command - check the token against the server

use anyhow::{Context, Result};
use clap::Args;
use memosync_api::MemosClientFactory;
use memosync_core::ports::IMemosClient;
use tracing::info;

use super::CommandContext;

#[derive(Debug, Args)]
pub struct WhoamiCommand {}

impl WhoamiCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let config = ctx.load_valid_config(&["memos"])?;
        let client = MemosClientFactory::from_config(&config.memos)
            .context("Failed to build HTTP client")?;

        let user = client.resolve_current_user().await?;
        info!(user = %user.name, "Resolved current user");

        let formatter = ctx.formatter();
        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "name": user.name,
                "username": user.username,
                "nickname": user.nickname,
                "api_url": config.memos.normalized_api_url(),
                "api_version": config.memos.api_version.as_str(),
            }));
        } else {
            let display = user.nickname.as_deref().unwrap_or(&user.username);
            formatter.success(&format!("Signed in as {} ({})", display, user.username));
            formatter.info(&format!("User: {}", user.name));
            formatter.info(&format!(
                "Server: {} ({})",
                config.memos.normalized_api_url(),
                config.memos.api_version
            ));
        }
        Ok(())
    }
}
