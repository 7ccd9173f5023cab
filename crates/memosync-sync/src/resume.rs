//! JSON file store for the resume marker
//!
//! One file per server and vault pair, so separate configurations never
//! share a marker:
//!
//! ```json
//! { "last_time": "2024-03-01T09:15:00+00:00", "updated_at": "..." }
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use memosync_core::config::Config;
use memosync_core::domain::ResumeMarker;
use memosync_core::ports::IResumeStateStore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct ResumeFile {
    last_time: ResumeMarker,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct JsonResumeStore {
    path: PathBuf,
}

impl JsonResumeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for the server and vault named in `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(Self::default_path(
            &config.memos.normalized_api_url(),
            &config.daily_notes.vault_path(),
        ))
    }

    /// `$XDG_DATA_HOME/memosync/state-<key>.json`
    pub fn default_path(api_url: &str, vault: &Path) -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("memosync")
            .join(format!("state-{}.json", state_key(api_url, vault)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn state_key(api_url: &str, vault: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_url.as_bytes());
    hasher.update([0]);
    hasher.update(vault.to_string_lossy().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

#[async_trait::async_trait]
impl IResumeStateStore for JsonResumeStore {
    async fn load(&self) -> anyhow::Result<Option<ResumeMarker>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };
        let file: ResumeFile = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid resume state in {}", self.path.display()))?;
        debug!(last_time = %file.last_time, "Loaded resume marker");
        Ok(Some(file.last_time))
    }

    async fn save(&self, marker: &ResumeMarker) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = ResumeFile {
            last_time: *marker,
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        debug!(last_time = %marker, "Saved resume marker");
        Ok(())
    }
}
