//! Port definitions (hexagonal architecture interfaces)
//!
//! - [`IMemosClient`] - Remote Memos server, one adapter per API version
//! - [`IDailyNoteVault`] - Local daily notes and attachment files
//! - [`IResumeStateStore`] - Persistence of the incremental resume marker

pub mod daily_note_vault;
pub mod memos_client;
pub mod resume_state;

pub use daily_note_vault::IDailyNoteVault;
pub use memos_client::{ErrorKind, IMemosClient, MemosError, MemosResult};
pub use resume_state::IResumeStateStore;
