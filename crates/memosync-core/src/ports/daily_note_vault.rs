//! Daily note vault port (driven/secondary port)
//!
//! The sync core never opens file handles; it reads and writes whole
//! daily-note documents and attachment blobs through this trait.
//!
//! Vault failures are adapter-specific and fatal to the current run.

use crate::domain::DateKey;

#[async_trait::async_trait]
pub trait IDailyNoteVault: Send + Sync {
    /// Reads the daily note for `date`; `Ok(None)` if it does not exist yet
    async fn read_daily_note(&self, date: &DateKey) -> anyhow::Result<Option<String>>;

    /// Replaces the full content of the daily note for `date`
    async fn write_daily_note(&self, date: &DateKey, content: &str) -> anyhow::Result<()>;

    /// Stores an attachment at a vault-relative path
    ///
    /// # Arguments
    /// * `relative_path` - Path below the vault root, `/`-separated
    /// * `data` - Attachment bytes
    async fn write_attachment(&self, relative_path: &str, data: &[u8]) -> anyhow::Result<()>;
}
