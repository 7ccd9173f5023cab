//! Attachment download into the vault
//!
//! Failures stay local to one attachment: the memo is still merged, with a
//! placeholder where the link would have been.

use std::sync::Arc;

use memosync_core::domain::{Memo, ResourceRef};
use memosync_core::ports::{IDailyNoteVault, IMemosClient, MemosError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::render::{self, AttachmentLink};

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("download failed: {0}")]
    Fetch(#[from] MemosError),

    #[error("write failed: {0:#}")]
    Write(anyhow::Error),
}

/// Links for one memo's attachments plus counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAttachments {
    pub links: Vec<AttachmentLink>,
    pub written: u32,
    pub failed: u32,
}

pub struct AttachmentResolver {
    client: Arc<dyn IMemosClient>,
    vault: Arc<dyn IDailyNoteVault>,
    folder: String,
    dry_run: bool,
}

impl AttachmentResolver {
    pub fn new(
        client: Arc<dyn IMemosClient>,
        vault: Arc<dyn IDailyNoteVault>,
        folder: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            vault,
            folder: folder.into(),
            dry_run,
        }
    }

    /// Resolves every resource of `memo`, never failing as a whole
    pub async fn resolve(&self, memo: &Memo) -> ResolvedAttachments {
        let mut resolved = ResolvedAttachments::default();

        for resource in &memo.resources {
            if let Some(url) = resource.external() {
                resolved.links.push(AttachmentLink::External {
                    filename: resource.filename.clone(),
                    url: url.to_string(),
                });
                continue;
            }

            let path = render::attachment_path(&self.folder, &memo.id, &resource.filename);
            match self.store(resource, &path).await {
                Ok(()) => {
                    resolved.written += 1;
                    resolved.links.push(AttachmentLink::local(resource, path));
                }
                Err(err) => {
                    warn!(
                        memo_id = %memo.id,
                        resource = %resource.id,
                        error = %err,
                        "Attachment unresolved"
                    );
                    resolved.failed += 1;
                    resolved.links.push(AttachmentLink::Unresolved {
                        filename: resource.filename.clone(),
                    });
                }
            }
        }

        resolved
    }

    async fn store(&self, resource: &ResourceRef, path: &str) -> Result<(), AttachmentError> {
        let bytes = self.client.fetch_resource(resource).await?;
        if self.dry_run {
            debug!(path, bytes = bytes.len(), "Dry run, attachment not written");
            return Ok(());
        }
        self.vault
            .write_attachment(path, &bytes)
            .await
            .map_err(AttachmentError::Write)?;
        debug!(path, bytes = bytes.len(), "Attachment written");
        Ok(())
    }
}
