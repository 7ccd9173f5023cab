//! Resume-state port
//!
//! Stores the marker an incremental sync resumes from. The sync core only
//! reads the marker it is handed; loading and saving is the caller's job.

use crate::domain::ResumeMarker;

#[async_trait::async_trait]
pub trait IResumeStateStore: Send + Sync {
    /// Returns the last saved marker, if any
    async fn load(&self) -> anyhow::Result<Option<ResumeMarker>>;

    /// Persists a new marker after a successful run
    async fn save(&self, marker: &ResumeMarker) -> anyhow::Result<()>;
}
